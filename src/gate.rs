//! Conditional visibility gate: shows its children only while a condition
//! entity is complete (or incomplete, when negated).
//!
//! Guarded children are evaluated on every pass even while the gate is
//! closed, so their state keeps updating; they are only excluded from the
//! render set. Callbacks observe the gate's state per [`FireMode`].

#[cfg(test)]
#[path = "gate_test.rs"]
mod gate_test;

use crate::entity::{EntityId, EntityKind};
use crate::scene::Scene;

/// When gate callbacks fire.
///
/// The reference behavior re-fires the matching callback list on every
/// evaluation pass while the condition holds (`Level`). The default here is
/// `Edge`: fire only when the gated value differs from the previous pass
/// (the very first pass always counts as a transition).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FireMode {
    #[default]
    Edge,
    Level,
}

/// Callback invoked when the gate opens or closes.
pub type GateCallback = Box<dyn FnMut()>;

/// Payload of a gate entity.
pub struct GateData {
    /// Entity whose completeness drives the gate.
    pub condition: EntityId,
    /// Invert the condition.
    pub negate: bool,
    /// Children exposed only while the gate is open.
    pub children: Vec<EntityId>,
    pub mode: FireMode,
    pub(crate) on_open: Vec<GateCallback>,
    pub(crate) on_close: Vec<GateCallback>,
    /// Gated value of the previous evaluation pass.
    pub(crate) prev: Option<bool>,
}

/// Evaluate a gate: children first (side effects continue while closed),
/// then the condition, then callbacks.
pub(crate) fn evaluate(scene: &mut Scene, id: EntityId) -> bool {
    let (condition, negate, children) = {
        let EntityKind::Gate(g) = &scene.entity(id).kind else {
            return false;
        };
        (g.condition, g.negate, g.children.clone())
    };
    for child in children {
        scene.evaluate(child);
    }
    let mut open = scene.evaluate(condition);
    if negate {
        open = !open;
    }

    // Pull the matching callback list out of the arena while firing so the
    // callbacks cannot alias the scene borrow.
    let fire = {
        let EntityKind::Gate(g) = &mut scene.entity_mut(id).kind else {
            return false;
        };
        let transition = g.prev != Some(open);
        g.prev = Some(open);
        match g.mode {
            FireMode::Edge => transition,
            FireMode::Level => true,
        }
    };
    if fire {
        let mut callbacks = {
            let EntityKind::Gate(g) = &mut scene.entity_mut(id).kind else {
                return false;
            };
            if open { std::mem::take(&mut g.on_open) } else { std::mem::take(&mut g.on_close) }
        };
        for cb in &mut callbacks {
            cb();
        }
        if let EntityKind::Gate(g) = &mut scene.entity_mut(id).kind {
            let slot = if open { &mut g.on_open } else { &mut g.on_close };
            // Callbacks registered during firing land after the restored list.
            let added = std::mem::take(slot);
            *slot = callbacks;
            slot.extend(added);
        }
    }

    scene.set_complete(id, open);
    open
}

impl Scene {
    /// A gate showing `children` while `condition` is complete.
    pub fn gate(&mut self, condition: EntityId, children: Vec<EntityId>) -> EntityId {
        self.push_gate(condition, false, children)
    }

    /// A gate showing `children` while `condition` is incomplete.
    pub fn gate_unless(&mut self, condition: EntityId, children: Vec<EntityId>) -> EntityId {
        self.push_gate(condition, true, children)
    }

    /// Register a callback fired when `gate` opens.
    pub fn on_open(&mut self, gate: EntityId, cb: impl FnMut() + 'static) {
        if let EntityKind::Gate(g) = &mut self.entity_mut(gate).kind {
            g.on_open.push(Box::new(cb));
        }
    }

    /// Register a callback fired when `gate` closes.
    pub fn on_close(&mut self, gate: EntityId, cb: impl FnMut() + 'static) {
        if let EntityKind::Gate(g) = &mut self.entity_mut(gate).kind {
            g.on_close.push(Box::new(cb));
        }
    }

    /// Override the gate's callback firing mode.
    pub fn set_fire_mode(&mut self, gate: EntityId, mode: FireMode) {
        if let EntityKind::Gate(g) = &mut self.entity_mut(gate).kind {
            g.mode = mode;
        }
    }
}
