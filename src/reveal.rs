//! Step reveal: progressive disclosure of an ordered sequence of children,
//! advanced one step per discrete user action.

#[cfg(test)]
#[path = "reveal_test.rs"]
mod reveal_test;

use crate::entity::{EntityId, EntityKind};
use crate::scene::Scene;
use crate::vec2::Vec2;

/// Payload of a step-reveal entity.
pub struct RevealData {
    /// Position of the clickable marker.
    pub pos: Vec2,
    /// The ordered sequence being revealed.
    pub children: Vec<EntityId>,
    /// Cursor: only the first `upto` children are evaluated and exposed.
    /// Always in `[0, children.len()]`.
    pub upto: usize,
}

/// Evaluate a reveal: only the revealed prefix is evaluated. The reveal
/// itself is always complete.
pub(crate) fn evaluate(scene: &mut Scene, id: EntityId) -> bool {
    let prefix = {
        let EntityKind::Reveal(r) = &scene.entity(id).kind else {
            return false;
        };
        r.children[..r.upto].to_vec()
    };
    for child in prefix {
        scene.evaluate(child);
    }
    true
}

impl Scene {
    /// A step-reveal marker at `(x, y)` over `children`, starting fully
    /// hidden.
    pub fn reveal(&mut self, x: f64, y: f64, children: Vec<EntityId>) -> EntityId {
        self.push_reveal(RevealData { pos: Vec2::new(x, y), children, upto: 0 })
    }

    /// Advance the reveal cursor: `upto ← (upto + 1) mod (N + 1)`, so N+1
    /// advances walk through every prefix and back to fully hidden. Returns
    /// `false` (and does nothing) if `id` is not a reveal.
    pub fn advance(&mut self, id: EntityId) -> bool {
        if let EntityKind::Reveal(r) = &mut self.entity_mut(id).kind {
            r.upto = (r.upto + 1) % (r.children.len() + 1);
            true
        } else {
            false
        }
    }

    /// Current reveal cursor, or 0 for non-reveal entities.
    #[must_use]
    pub fn reveal_cursor(&self, id: EntityId) -> usize {
        match &self.entity(id).kind {
            EntityKind::Reveal(r) => r.upto,
            _ => 0,
        }
    }
}
