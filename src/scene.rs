//! The scene arena: entity storage, the declarative constructor API, the
//! evaluation protocol, and flattening.
//!
//! A [`Scene`] owns every entity of one diagram in a flat arena. Ids are
//! arena indices, assigned monotonically at construction and never reused;
//! constructing a new `Scene` is the only thing that resets the counter.
//! Evaluation is synchronous and runs to completion: a full depth-first pass
//! over the dependency graph on every call, with no memoization — repeated
//! evaluation of an unchanged graph is idempotent.

#[cfg(test)]
#[path = "scene_test.rs"]
mod scene_test;

use std::collections::HashSet;
use std::rc::Rc;

use crate::calc::{self, CalcData};
use crate::consts::{
    CIRCLE_NORMAL_LEN, POINT_RADIUS, UNIT, Z_CIRCLE, Z_LABEL, Z_LINE, Z_REVEAL, Z_SURFACE, Z_TEXT,
};
use crate::entity::{
    CircleData, CircleRadius, Compass, CurveData, Entity, EntityCore, EntityId, EntityKind,
    GroupData, LabelData, LabelKind, LineData, LineStyle, PointData, PointRole, ScalarData,
    SurfaceData, TextData,
};
use crate::gate::{self, FireMode, GateData};
use crate::reveal::{self, RevealData};
use crate::surface::Fragment;
use crate::vec2::Vec2;

/// Plain-text labels estimate their fragment size from the character count.
const PLAIN_CHAR_WIDTH: f64 = 1.5;
const PLAIN_LINE_HEIGHT: f64 = 1.5;

/// Lightweight discriminant used to dispatch evaluation without holding a
/// borrow into the arena.
enum Tag {
    Leaf,
    Line,
    Circle,
    Surface,
    Curve,
    Label,
    Group,
    Calc,
    Gate,
    Reveal,
}

/// Handles to the parts of a coordinate cross.
#[derive(Debug, Clone, Copy)]
pub struct Axes {
    pub group: EntityId,
    pub x_axis: EntityId,
    pub y_axis: EntityId,
}

/// The entity arena for one diagram.
pub struct Scene {
    nodes: Vec<Entity>,
}

impl Scene {
    /// An empty scene. Ids restart from zero.
    #[must_use]
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Number of entities constructed so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if no entities have been constructed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // --- Arena plumbing ---

    pub(crate) fn push(&mut self, z_index: i32, kind: EntityKind) -> EntityId {
        let id = self.nodes.len();
        self.nodes.push(Entity { core: EntityCore::new(id, z_index), kind });
        id
    }

    pub(crate) fn push_calc(&mut self, data: CalcData) -> EntityId {
        self.push(0, EntityKind::Calc(data))
    }

    pub(crate) fn push_gate(
        &mut self,
        condition: EntityId,
        negate: bool,
        children: Vec<EntityId>,
    ) -> EntityId {
        self.push(
            0,
            EntityKind::Gate(GateData {
                condition,
                negate,
                children,
                mode: FireMode::default(),
                on_open: Vec::new(),
                on_close: Vec::new(),
                prev: None,
            }),
        )
    }

    pub(crate) fn push_reveal(&mut self, data: RevealData) -> EntityId {
        self.push(Z_REVEAL, EntityKind::Reveal(data))
    }

    /// Borrow an entity.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> &Entity {
        &self.nodes[id]
    }

    pub(crate) fn entity_mut(&mut self, id: EntityId) -> &mut Entity {
        &mut self.nodes[id]
    }

    pub(crate) fn set_complete(&mut self, id: EntityId, complete: bool) {
        self.nodes[id].core.complete = complete;
    }

    pub(crate) fn set_parent(&mut self, id: EntityId, parent: EntityId) {
        self.nodes[id].core.parent = Some(parent);
    }

    // --- Constructors ---

    /// A point at `(x, y)` with the given interaction role.
    pub fn point(&mut self, x: f64, y: f64, role: PointRole) -> EntityId {
        self.push(
            role.z_index(),
            EntityKind::Point(PointData {
                pos: Vec2::new(x, y),
                radius: POINT_RADIUS,
                role,
                constraint: None,
            }),
        )
    }

    /// Fixed-position plain text.
    pub fn text(&mut self, x: f64, y: f64, content: impl Into<String>) -> EntityId {
        self.push(
            Z_TEXT,
            EntityKind::Text(TextData { pos: Vec2::new(x, y), content: content.into() }),
        )
    }

    /// A numeric readout at `(x, y)`; update it with [`Scene::set_scalar`].
    pub fn scalar(&mut self, x: f64, y: f64, value: f64) -> EntityId {
        self.push(Z_TEXT, EntityKind::Scalar(ScalarData { pos: Vec2::new(x, y), value }))
    }

    /// A line segment between two points.
    pub fn line(&mut self, p1: EntityId, p2: EntityId, style: LineStyle) -> EntityId {
        self.push(style.z_index(), EntityKind::Line(LineData { p1, p2, style, delta: None }))
    }

    /// A vector: a line whose second endpoint is recomputed as
    /// `base + (dx, dy)` on every evaluation. An empty style defaults to an
    /// arrow.
    pub fn vector(&mut self, base: EntityId, dx: f64, dy: f64, style: LineStyle) -> EntityId {
        let style = if style.is_empty() { LineStyle::ARROW } else { style };
        let delta = Vec2::new(dx, dy);
        let tip_pos = self.point_pos(base) + delta;
        let tip = self.point(tip_pos.x, tip_pos.y, PointRole::Invisible);
        self.push(
            style.z_index(),
            EntityKind::Line(LineData { p1: base, p2: tip, style, delta: Some(delta) }),
        )
    }

    /// A circle with a fixed radius.
    pub fn circle(&mut self, center: EntityId, r: f64) -> EntityId {
        self.push(
            Z_CIRCLE,
            EntityKind::Circle(CircleData { center, radius: CircleRadius::Fixed(r), r, normal: None }),
        )
    }

    /// A circle whose radius follows a rim point: `r = |rim − center|`. An
    /// outward rim normal vector is maintained; fetch it with
    /// [`Scene::circle_normal`] and place it into the tree to render it.
    pub fn circle_through(&mut self, center: EntityId, rim: EntityId) -> EntityId {
        let normal = self.normal_vector();
        let circle = self.push(
            Z_CIRCLE,
            EntityKind::Circle(CircleData {
                center,
                radius: CircleRadius::Rim(rim),
                r: 0.0,
                normal: Some(normal),
            }),
        );
        self.set_parent(normal, circle);
        circle
    }

    /// A ground-plane marker of the given width anchored at a point.
    pub fn surface(&mut self, anchor: EntityId, width: f64) -> EntityId {
        self.push(Z_SURFACE, EntityKind::Surface(SurfaceData { anchor, width }))
    }

    /// A quadratic Bézier curve.
    pub fn quad_bezier(&mut self, p1: EntityId, p2: EntityId, p3: EntityId) -> EntityId {
        self.push(Z_LINE, EntityKind::Curve(CurveData { control: vec![p1, p2, p3] }))
    }

    /// A cubic Bézier curve.
    pub fn cubic_bezier(
        &mut self,
        p1: EntityId,
        p2: EntityId,
        p3: EntityId,
        p4: EntityId,
    ) -> EntityId {
        self.push(Z_LINE, EntityKind::Curve(CurveData { control: vec![p1, p2, p3, p4] }))
    }

    /// A plain-text label attached to `anchor`, offset toward `dir`.
    pub fn label(&mut self, anchor: EntityId, text: impl Into<String>, dir: Compass) -> EntityId {
        let markup = text.into();
        #[allow(clippy::cast_precision_loss)]
        let fragment = Fragment::new(PLAIN_CHAR_WIDTH * markup.chars().count() as f64, PLAIN_LINE_HEIGHT);
        self.push(
            Z_LABEL,
            EntityKind::Label(LabelData {
                anchor,
                pos: Vec2::ZERO,
                markup,
                dir,
                kind: LabelKind::Plain,
                fragment: Some(fragment),
                fallback: false,
            }),
        )
    }

    /// A math label attached to `anchor`. Its fragment dimensions are
    /// resolved through the typesetting collaborator on first render; on
    /// typeset failure a zero-size plain-text fallback is substituted.
    pub fn math_label(
        &mut self,
        anchor: EntityId,
        markup: impl Into<String>,
        dir: Compass,
    ) -> EntityId {
        self.push(
            Z_LABEL,
            EntityKind::Label(LabelData {
                anchor,
                pos: Vec2::ZERO,
                markup: markup.into(),
                dir,
                kind: LabelKind::Math,
                fragment: None,
                fallback: false,
            }),
        )
    }

    /// An ordered aggregation of children with no geometry of its own.
    pub fn group(&mut self, children: Vec<EntityId>) -> EntityId {
        self.push(0, EntityKind::Group(GroupData { children }))
    }

    /// A coordinate cross at `origin`: an x axis of logical width `w` and a
    /// y axis of logical height `h` (pointing up), both drawn as arrows
    /// overshooting by half a display unit. With `centered` the origin sits
    /// in the middle of the covered region instead of its corner.
    pub fn xycross(&mut self, origin: EntityId, w: f64, h: f64, centered: bool) -> Axes {
        let p = self.point_pos(origin);
        let u2 = UNIT / 2.0;
        let (dx, dy) = if centered { (w / 2.0, h / 2.0) } else { (0.0, 0.0) };
        let x_base = self.point(p.x - dx - u2, p.y, PointRole::Invisible);
        let x_axis = self.vector(x_base, w + 2.0 * u2, 0.0, LineStyle::ARROW);
        let y_base = self.point(p.x, p.y + dy + u2, PointRole::Invisible);
        let y_axis = self.vector(y_base, 0.0, -h - 2.0 * u2, LineStyle::ARROW);
        let group = self.group(vec![origin, x_axis, y_axis]);
        Axes { group, x_axis, y_axis }
    }

    /// An invisible-based computed normal vector, positioned by its owner.
    pub(crate) fn normal_vector(&mut self) -> EntityId {
        let base = self.point(0.0, 0.0, PointRole::Invisible);
        let tip = self.point(0.0, 0.0, PointRole::Invisible);
        let style = LineStyle::ARROW | LineStyle::NORMAL;
        let id = self.push(
            style.z_index(),
            EntityKind::Line(LineData { p1: base, p2: tip, style, delta: Some(Vec2::ZERO) }),
        );
        self.set_complete(id, false);
        id
    }

    // --- Point access and mutation ---

    /// Position of a point, or the origin for non-points.
    #[must_use]
    pub fn point_pos(&self, id: EntityId) -> Vec2 {
        match &self.nodes[id].kind {
            EntityKind::Point(p) => p.pos,
            _ => Vec2::ZERO,
        }
    }

    /// Position of any positioned entity (point, text, label, reveal
    /// marker); the origin otherwise.
    #[must_use]
    pub fn entity_pos(&self, id: EntityId) -> Vec2 {
        match &self.nodes[id].kind {
            EntityKind::Point(p) => p.pos,
            EntityKind::Text(t) => t.pos,
            EntityKind::Scalar(s) => s.pos,
            EntityKind::Label(l) => l.pos,
            EntityKind::Reveal(r) => r.pos,
            _ => Vec2::ZERO,
        }
    }

    /// Interaction role of a point, if `id` is a point.
    #[must_use]
    pub fn point_role(&self, id: EntityId) -> Option<PointRole> {
        match &self.nodes[id].kind {
            EntityKind::Point(p) => Some(p.role),
            _ => None,
        }
    }

    /// Whether the entity was complete as of its last evaluation.
    #[must_use]
    pub fn is_complete(&self, id: EntityId) -> bool {
        self.nodes[id].core.complete
    }

    /// Move a point, applying its positional constraint if one is set. This
    /// is the single mutation path for both the interaction controller and
    /// derived computations.
    pub fn move_point(&mut self, id: EntityId, to: Vec2) {
        let constraint = match &self.nodes[id].kind {
            EntityKind::Point(p) => p.constraint.clone(),
            _ => None,
        };
        let target = match constraint {
            Some(c) => c(to),
            None => to,
        };
        self.place_point(id, target);
    }

    /// Raw position write, bypassing any constraint.
    pub(crate) fn place_point(&mut self, id: EntityId, pos: Vec2) {
        if let EntityKind::Point(p) = &mut self.nodes[id].kind {
            p.pos = pos;
        }
    }

    /// Current value of a numeric readout, or 0 for non-scalars.
    #[must_use]
    pub fn scalar_value(&self, id: EntityId) -> f64 {
        match &self.nodes[id].kind {
            EntityKind::Scalar(s) => s.value,
            _ => 0.0,
        }
    }

    /// Set a numeric readout's value. The host re-renders afterwards, the
    /// same as after a drag.
    pub fn set_scalar(&mut self, id: EntityId, value: f64) {
        if let EntityKind::Scalar(s) = &mut self.nodes[id].kind {
            s.value = value;
        }
    }

    /// Attach a positional constraint to a point; it is applied on every
    /// subsequent move.
    pub fn set_constraint(&mut self, id: EntityId, constraint: impl Fn(Vec2) -> Vec2 + 'static) {
        if let EntityKind::Point(p) = &mut self.nodes[id].kind {
            p.constraint = Some(Rc::new(constraint));
        }
    }

    // --- Line / circle access ---

    /// Endpoint handles of a line, or `(id, id)` for non-lines.
    #[must_use]
    pub fn line_endpoints(&self, id: EntityId) -> (EntityId, EntityId) {
        match &self.nodes[id].kind {
            EntityKind::Line(l) => (l.p1, l.p2),
            _ => (id, id),
        }
    }

    /// Displacement `p2 − p1` of a line as currently positioned; its
    /// `length()` is the line's length.
    #[must_use]
    pub fn line_vector(&self, id: EntityId) -> Vec2 {
        let (p1, p2) = self.line_endpoints(id);
        self.point_pos(p2) - self.point_pos(p1)
    }

    /// Direction delta of a vector, if `id` is a vector.
    #[must_use]
    pub fn vector_delta(&self, id: EntityId) -> Option<Vec2> {
        match &self.nodes[id].kind {
            EntityKind::Line(l) => l.delta,
            _ => None,
        }
    }

    /// Center point handle of a circle, or `id` for non-circles.
    #[must_use]
    pub fn circle_center(&self, id: EntityId) -> EntityId {
        match &self.nodes[id].kind {
            EntityKind::Circle(c) => c.center,
            _ => id,
        }
    }

    /// Radius of a circle as of its last evaluation.
    #[must_use]
    pub fn circle_radius(&self, id: EntityId) -> f64 {
        match &self.nodes[id].kind {
            EntityKind::Circle(c) => c.r,
            _ => 0.0,
        }
    }

    /// The maintained rim normal of a rim-defined circle.
    #[must_use]
    pub fn circle_normal(&self, id: EntityId) -> Option<EntityId> {
        match &self.nodes[id].kind {
            EntityKind::Circle(c) => c.normal,
            _ => None,
        }
    }

    /// Reposition an owned vector: base point and direction delta. The tip
    /// follows immediately so the flattened output is fresh.
    pub(crate) fn set_vector(&mut self, id: EntityId, base: Vec2, delta: Vec2) {
        let (p1, p2) = self.line_endpoints(id);
        self.place_point(p1, base);
        self.place_point(p2, base + delta);
        if let EntityKind::Line(l) = &mut self.nodes[id].kind {
            l.delta = Some(delta);
        }
    }

    // --- Evaluation ---

    fn tag(&self, id: EntityId) -> Tag {
        match &self.nodes[id].kind {
            EntityKind::Point(_) | EntityKind::Text(_) | EntityKind::Scalar(_) => Tag::Leaf,
            EntityKind::Line(_) => Tag::Line,
            EntityKind::Circle(_) => Tag::Circle,
            EntityKind::Surface(_) => Tag::Surface,
            EntityKind::Curve(_) => Tag::Curve,
            EntityKind::Label(_) => Tag::Label,
            EntityKind::Group(_) => Tag::Group,
            EntityKind::Calc(_) => Tag::Calc,
            EntityKind::Gate(_) => Tag::Gate,
            EntityKind::Reveal(_) => Tag::Reveal,
        }
    }

    /// Evaluate an entity and its dependency graph, returning its
    /// completeness.
    ///
    /// Every dependency is evaluated even when an earlier one is incomplete
    /// (dependency evaluation has side effects later logic relies on); own
    /// completeness is the conjunction of dependency completeness.
    pub fn evaluate(&mut self, id: EntityId) -> bool {
        match self.tag(id) {
            Tag::Leaf => self.evaluate_leaf(id),
            Tag::Line => self.evaluate_line(id),
            Tag::Circle => self.evaluate_circle(id),
            Tag::Surface => self.evaluate_surface(id),
            Tag::Curve => self.evaluate_curve(id),
            Tag::Label => self.evaluate_label(id),
            Tag::Group => self.evaluate_group(id),
            Tag::Calc => calc::evaluate(self, id),
            Tag::Gate => gate::evaluate(self, id),
            Tag::Reveal => reveal::evaluate(self, id),
        }
    }

    /// Short-circuit-free conjunction over `ids`: every entity is evaluated.
    pub(crate) fn eval_all(&mut self, ids: &[EntityId]) -> bool {
        let mut ok = true;
        for &id in ids {
            ok &= self.evaluate(id);
        }
        ok
    }

    fn evaluate_leaf(&mut self, id: EntityId) -> bool {
        // A computed leaf's value may depend on its owner's last calculate
        // pass, so the owner always evaluates first.
        if let Some(parent) = self.nodes[id].core.parent {
            self.evaluate(parent);
        }
        self.nodes[id].core.complete
    }

    fn evaluate_line(&mut self, id: EntityId) -> bool {
        if let Some(parent) = self.nodes[id].core.parent {
            self.evaluate(parent);
        }
        let (p1, p2, delta, owned) = {
            let EntityKind::Line(l) = &self.nodes[id].kind else {
                return false;
            };
            (l.p1, l.p2, l.delta, self.nodes[id].core.parent.is_some())
        };
        if let Some(d) = delta {
            let base = self.point_pos(p1);
            self.place_point(p2, base + d);
        }
        if owned {
            // Completeness of an owned vector is written by its owner.
            return self.nodes[id].core.complete;
        }
        let ok = self.eval_all(&[p1, p2]);
        self.nodes[id].core.complete = ok;
        ok
    }

    fn evaluate_circle(&mut self, id: EntityId) -> bool {
        let (center, radius, normal) = {
            let EntityKind::Circle(c) = &self.nodes[id].kind else {
                return false;
            };
            (c.center, c.radius, c.normal)
        };
        let mut ok = self.evaluate(center);
        if let CircleRadius::Rim(rim) = radius {
            ok &= self.evaluate(rim);
            let c = self.point_pos(center);
            let rp = self.point_pos(rim);
            let d = rp - c;
            let r = d.length();
            if let EntityKind::Circle(data) = &mut self.nodes[id].kind {
                data.r = r;
            }
            if let Some(n) = normal {
                if r > 0.0 {
                    self.set_vector(n, rp, d * (CIRCLE_NORMAL_LEN / r));
                    self.set_complete(n, ok);
                } else {
                    // Rim on top of center: the outward direction is
                    // undefined.
                    self.set_complete(n, false);
                }
            }
        }
        self.nodes[id].core.complete = ok;
        ok
    }

    fn evaluate_surface(&mut self, id: EntityId) -> bool {
        let EntityKind::Surface(s) = &self.nodes[id].kind else {
            return false;
        };
        let anchor = s.anchor;
        let ok = self.evaluate(anchor);
        self.nodes[id].core.complete = ok;
        ok
    }

    fn evaluate_curve(&mut self, id: EntityId) -> bool {
        let control = {
            let EntityKind::Curve(c) = &self.nodes[id].kind else {
                return false;
            };
            c.control.clone()
        };
        let ok = self.eval_all(&control);
        self.nodes[id].core.complete = ok;
        ok
    }

    fn evaluate_label(&mut self, id: EntityId) -> bool {
        let anchor = {
            let EntityKind::Label(l) = &self.nodes[id].kind else {
                return false;
            };
            l.anchor
        };
        let ok = self.evaluate(anchor);
        let pos = self.entity_pos(anchor);
        if let EntityKind::Label(l) = &mut self.nodes[id].kind {
            l.pos = pos;
        }
        self.nodes[id].core.complete = ok;
        ok
    }

    fn evaluate_group(&mut self, id: EntityId) -> bool {
        let children = {
            let EntityKind::Group(g) = &self.nodes[id].kind else {
                return false;
            };
            g.children.clone()
        };
        for child in children {
            self.evaluate(child);
        }
        true
    }

    // --- Flatten ---

    /// Evaluate the graph from `root` and produce the deduplicated,
    /// paint-ordered list of renderable entity ids.
    ///
    /// Each entity appears at most once even when reachable through multiple
    /// structural paths; ordering is by `z_index` ascending with discovery
    /// order breaking ties, so the result is deterministic for a given
    /// evaluation.
    pub fn flatten(&mut self, root: EntityId) -> Vec<EntityId> {
        self.evaluate(root);
        let mut discovered = Vec::new();
        self.flat(root, &mut discovered);
        let mut seen = HashSet::new();
        let mut unique: Vec<EntityId> = discovered
            .into_iter()
            .filter(|&id| seen.insert(id))
            .collect();
        unique.sort_by_key(|&id| self.nodes[id].core.z_index);
        unique
    }

    /// Collect this entity's renderable contribution in discovery order.
    fn flat(&self, id: EntityId, out: &mut Vec<EntityId>) {
        let complete = self.nodes[id].core.complete;
        match &self.nodes[id].kind {
            EntityKind::Point(_) | EntityKind::Text(_) | EntityKind::Scalar(_) => {
                if complete {
                    out.push(id);
                }
                // The owner's dependencies might not be in the tree
                // themselves; re-expose them through the owned output.
                if let Some(parent) = self.nodes[id].core.parent {
                    self.flat(parent, out);
                }
            }
            EntityKind::Line(l) => {
                self.flat(l.p1, out);
                self.flat(l.p2, out);
                if complete {
                    out.push(id);
                }
            }
            EntityKind::Circle(c) => {
                self.flat(c.center, out);
                if let CircleRadius::Rim(rim) = c.radius {
                    self.flat(rim, out);
                }
                if complete {
                    out.push(id);
                }
            }
            EntityKind::Surface(s) => {
                self.flat(s.anchor, out);
                if complete {
                    out.push(id);
                }
            }
            EntityKind::Curve(c) => {
                for &p in &c.control {
                    self.flat(p, out);
                }
                if complete {
                    out.push(id);
                }
            }
            EntityKind::Label(l) => {
                self.flat(l.anchor, out);
                if complete {
                    out.push(id);
                }
            }
            EntityKind::Group(g) => {
                for &child in &g.children {
                    self.flat(child, out);
                }
            }
            EntityKind::Calc(c) => {
                // Only the dependencies: the outputs are flattened from
                // wherever the caller placed them in the tree.
                for &dep in &c.deps {
                    self.flat(dep, out);
                }
            }
            EntityKind::Gate(g) => {
                if complete {
                    for &child in &g.children {
                        self.flat(child, out);
                    }
                }
            }
            EntityKind::Reveal(r) => {
                out.push(id);
                for &child in &r.children[..r.upto] {
                    self.flat(child, out);
                }
            }
        }
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
