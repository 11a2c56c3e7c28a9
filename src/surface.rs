//! External collaborator boundaries: the rendering surface, the line
//! clipper, and the math typesetter.
//!
//! The core never produces vector-graphics markup or CSS; it hands each
//! renderable entity's [`crate::render::ShapeDesc`] across these traits and
//! lets the host mount, update, and remove visuals keyed by stable entity
//! ids.

#[cfg(test)]
#[path = "surface_test.rs"]
mod surface_test;

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::render::ShapeDesc;
use crate::vec2::Vec2;

/// Consumer-supplied rendering surface.
///
/// The render driver issues `create` for newly entered ids, `update` for
/// retained ids (preserving visual/animation continuity), and `remove` for
/// exited ids. Ids are stable for an entity's lifetime and never reused.
pub trait RenderSurface {
    /// Mount the initial visual representation for `id`.
    fn create(&mut self, id: EntityId, shape: &ShapeDesc);
    /// Update the existing visual representation for `id` in place.
    fn update(&mut self, id: EntityId, shape: &ShapeDesc);
    /// Unmount the visual representation for `id`.
    fn remove(&mut self, id: EntityId);
}

/// Clips a segment against the rectangular viewport.
///
/// Used only for entities flagged as conceptually infinite lines; the result
/// feeds rendering, never intersection math. A `None` result means the
/// segment lies entirely outside the viewport.
pub trait LineClipper {
    fn clip(&self, a: Vec2, b: Vec2, width: f64, height: f64) -> Option<(Vec2, Vec2)>;
}

/// A typeset fragment with known dimensions, in typesetter units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Fragment {
    pub width: f64,
    pub height: f64,
}

impl Fragment {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Math-typesetting collaborator.
///
/// Initialization is asynchronous on the host side; `ready` is the one-shot
/// readiness gate polled before the first render pass only.
pub trait Typesetter {
    /// Whether the collaborator has finished initializing.
    fn ready(&self) -> bool;
    /// Typeset `markup` and report the fragment's dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`TypesetError`] if the markup is rejected; the caller
    /// substitutes a zero-size plain-text fallback and rendering continues.
    fn typeset(&mut self, markup: &str) -> Result<Fragment, TypesetError>;
}

/// Failure reported by the typesetting collaborator.
#[derive(Debug, thiserror::Error)]
pub enum TypesetError {
    /// The collaborator has not finished initializing.
    #[error("typesetter is still initializing")]
    NotReady,
    /// The markup could not be typeset.
    #[error("markup rejected: {0}")]
    Rejected(String),
}

/// Failure of a render pass.
///
/// This is the only raised error in normal operation. Geometric
/// undefinedness is never an error: it is encoded as `complete = false` on
/// the affected entities and silently excludes them from the render set.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The typesetting collaborator has not finished initializing. Retry the
    /// initial render; once one pass succeeds this never recurs.
    #[error("typesetting collaborator has not finished initializing")]
    TypesetterNotReady,
}
