//! Entity model: the identity/completeness core shared by every diagram
//! element, plus the payload types for each primitive kind.
//!
//! Entities live in the [`crate::scene::Scene`] arena and refer to each other
//! by [`EntityId`] handles, never by owning pointers. Each entity embeds an
//! [`EntityCore`] by value; behavior is dispatched by matching on
//! [`EntityKind`], not by inheritance or string tags.

#[cfg(test)]
#[path = "entity_test.rs"]
mod entity_test;

use std::rc::Rc;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::calc::CalcData;
use crate::consts::{Z_COMPUTED_POINT, Z_DRAG_POINT, Z_INFINITE_LINE, Z_LINE, Z_POINT};
use crate::gate::GateData;
use crate::reveal::RevealData;
use crate::surface::Fragment;
use crate::vec2::Vec2;

/// Handle to an entity in the scene arena.
///
/// Assigned monotonically at construction, stable for the entity's lifetime,
/// never reused or renumbered. The sole identity key for render diffs.
pub type EntityId = usize;

/// Identity and completeness state embedded by every entity.
#[derive(Debug, Clone)]
pub struct EntityCore {
    /// Arena handle of this entity.
    pub id: EntityId,
    /// Paint-order priority; lower values paint first.
    pub z_index: i32,
    /// Whether the entity currently has a well-defined geometric value.
    pub complete: bool,
    /// Non-owning handle to an owning derived computation. When set, the
    /// owner is evaluated before this entity's value is trusted.
    pub parent: Option<EntityId>,
}

impl EntityCore {
    pub(crate) fn new(id: EntityId, z_index: i32) -> Self {
        Self { id, z_index, complete: true, parent: None }
    }
}

/// Interaction/render mode of a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointRole {
    /// Rendered as a plain marker; not interactive.
    #[default]
    Plain,
    /// User-movable via the interaction controller.
    Draggable,
    /// Positioned by an owning derived computation.
    Computed,
    /// No visible marker, but still a drag target.
    Hidden,
    /// No visual representation at all.
    Invisible,
}

impl PointRole {
    /// Default paint priority for a point of this role.
    #[must_use]
    pub fn z_index(self) -> i32 {
        match self {
            Self::Draggable => Z_DRAG_POINT,
            Self::Computed => Z_COMPUTED_POINT,
            Self::Plain | Self::Hidden | Self::Invisible => Z_POINT,
        }
    }
}

bitflags! {
    /// Combinable line/vector display options.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct LineStyle: u8 {
        /// Draw an arrowhead at the second endpoint.
        const ARROW = 1 << 0;
        /// Treat as conceptually infinite; clipped to the viewport at render
        /// time. Never affects intersection math.
        const INFINITE = 1 << 1;
        /// Surface-normal styling.
        const NORMAL = 1 << 2;
        /// De-emphasized styling.
        const DIM = 1 << 3;
    }
}

impl LineStyle {
    /// Default paint priority for a line with these flags.
    #[must_use]
    pub fn z_index(self) -> i32 {
        if self.contains(Self::INFINITE) { Z_INFINITE_LINE } else { Z_LINE }
    }
}

/// Positional constraint applied on every move of a point.
pub type Constraint = Rc<dyn Fn(Vec2) -> Vec2>;

/// Constraint keeping a point glued to the circle of radius `r` around
/// `center`: the moved position is projected radially onto the rim.
#[must_use]
pub fn circular(center: Vec2, r: f64) -> impl Fn(Vec2) -> Vec2 {
    move |p| match (p - center).normalized() {
        Some(dir) => center + dir * r,
        None => center + Vec2::new(r, 0.0),
    }
}

/// A point: the only entity the interaction controller may move directly.
pub struct PointData {
    pub pos: Vec2,
    pub radius: f64,
    pub role: PointRole,
    pub constraint: Option<Constraint>,
}

/// A line segment, or a vector when `delta` is set.
///
/// A vector is a line-shaped value with a direction-delta override: on every
/// evaluation its second endpoint is recomputed as `p1 + delta`, so `p2` is
/// never independently draggable.
pub struct LineData {
    pub p1: EntityId,
    pub p2: EntityId,
    pub style: LineStyle,
    pub delta: Option<Vec2>,
}

/// How a circle's radius is defined.
#[derive(Debug, Clone, Copy)]
pub enum CircleRadius {
    /// Fixed radius in diagram units.
    Fixed(f64),
    /// Dynamic: `r = |rim − center|`, following a rim point.
    Rim(EntityId),
}

/// A circle around a center point.
pub struct CircleData {
    pub center: EntityId,
    pub radius: CircleRadius,
    /// Radius as of the last evaluation.
    pub r: f64,
    /// Owned outward rim normal, maintained for rim-defined circles.
    pub normal: Option<EntityId>,
}

/// A ground-plane marker anchored at a point.
pub struct SurfaceData {
    pub anchor: EntityId,
    pub width: f64,
}

/// A quadratic (3 control points) or cubic (4 control points) Bézier curve.
pub struct CurveData {
    pub control: Vec<EntityId>,
}

/// Fixed-position plain text.
pub struct TextData {
    pub pos: Vec2,
    pub content: String,
}

/// Fixed-position readout of a dynamic numeric value.
///
/// The value is host-mutable between passes (a slider, a measured quantity);
/// setting it is what makes the host re-render.
pub struct ScalarData {
    pub pos: Vec2,
    pub value: f64,
}

/// Compass direction for label placement relative to its anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compass {
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
    Nw,
}

/// Whether a label is plain text or math markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    Plain,
    Math,
}

/// A text or math label attached to an anchor entity.
pub struct LabelData {
    pub anchor: EntityId,
    /// Anchor position as of the last evaluation.
    pub pos: Vec2,
    pub markup: String,
    pub dir: Compass,
    pub kind: LabelKind,
    /// Typeset dimensions, resolved lazily through the typesetting
    /// collaborator on first render.
    pub fragment: Option<Fragment>,
    /// Set when typesetting failed and the plain-text fallback is in use.
    pub fallback: bool,
}

/// An ordered collection of children with no geometry of its own.
pub struct GroupData {
    pub children: Vec<EntityId>,
}

/// Payload of an entity, dispatched by pattern matching.
pub enum EntityKind {
    Point(PointData),
    Line(LineData),
    Circle(CircleData),
    Surface(SurfaceData),
    Curve(CurveData),
    Text(TextData),
    Scalar(ScalarData),
    Label(LabelData),
    Group(GroupData),
    Calc(CalcData),
    Gate(GateData),
    Reveal(RevealData),
}

/// A node in the scene arena.
pub struct Entity {
    pub core: EntityCore,
    pub kind: EntityKind,
}
