//! Interaction controller: maps pointer gestures onto scene mutations.
//!
//! A two-state machine (idle / dragging) for moving draggable points, plus a
//! stateless click handler for advancing step-reveal markers. Every mutation
//! reports [`InputAction::RenderNeeded`]; the host then runs a full
//! flatten/diff pass. There is no debouncing or coalescing: rapid drag-move
//! events each trigger a complete synchronous re-evaluation.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::entity::{EntityId, PointRole};
use crate::scene::Scene;
use crate::vec2::Vec2;
use crate::viewport::Viewport;

/// What the host should do after an input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    /// Nothing changed.
    None,
    /// The scene changed; re-evaluate and diff against the surface.
    RenderNeeded,
}

/// The active gesture, if any.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragState {
    /// No gesture in progress; waiting for the next drag-start.
    Idle,
    /// A draggable point is following the pointer.
    Dragging {
        /// The point being moved.
        target: EntityId,
        /// Viewport-to-diagram conversion captured at drag-start, so a
        /// mid-drag resize does not make the point jump.
        viewport: Viewport,
    },
}

impl Default for DragState {
    fn default() -> Self {
        Self::Idle
    }
}

/// Pointer-gesture controller for one diagram.
#[derive(Debug)]
pub struct Controller {
    pub viewport: Viewport,
    state: DragState,
}

impl Controller {
    #[must_use]
    pub fn new(viewport: Viewport) -> Self {
        Self { viewport, state: DragState::Idle }
    }

    /// The current gesture state.
    #[must_use]
    pub fn state(&self) -> DragState {
        self.state
    }

    /// Begin dragging `target`. Only draggable or hidden-handle points
    /// accept a drag; anything else leaves the controller idle.
    pub fn drag_start(&mut self, scene: &Scene, target: EntityId) -> InputAction {
        match scene.point_role(target) {
            Some(PointRole::Draggable | PointRole::Hidden) => {
                self.state = DragState::Dragging { target, viewport: self.viewport };
                InputAction::None
            }
            _ => InputAction::None,
        }
    }

    /// Move the dragged point to the pointer position (client pixels). The
    /// point's positional constraint, if any, is applied by the scene.
    pub fn drag_move(&mut self, scene: &mut Scene, screen: Vec2) -> InputAction {
        let DragState::Dragging { target, viewport } = self.state else {
            return InputAction::None;
        };
        scene.move_point(target, viewport.to_diagram(screen));
        InputAction::RenderNeeded
    }

    /// End the gesture. No further action: the last drag-move already left
    /// the scene current.
    pub fn drag_end(&mut self) -> InputAction {
        self.state = DragState::Idle;
        InputAction::None
    }

    /// Discrete click on a step-reveal marker: advance its cursor. Clicks on
    /// anything else are ignored.
    pub fn click(&mut self, scene: &mut Scene, target: EntityId) -> InputAction {
        if scene.advance(target) {
            InputAction::RenderNeeded
        } else {
            InputAction::None
        }
    }
}
