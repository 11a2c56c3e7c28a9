//! Render driver: turns a flattened scene into enter/update/exit
//! instructions for the external rendering surface.
//!
//! The driver is retained-mode on the outside and immediate-mode on the
//! inside: every pass re-evaluates the whole graph, then reconciles the new
//! paint-ordered id list against the previously rendered one. Ids present
//! only in the new list are created, ids present in both are updated in
//! place (preserving visual continuity), ids that disappeared are removed.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::consts::{
    ARROW_HEIGHT, ARROW_WIDTH, LABEL_DIAGONAL, LABEL_GAP, LABEL_SCALE, REVEAL_MARKER_SIZE,
};
use crate::entity::{Compass, EntityId, EntityKind, LabelKind, LineStyle, PointRole};
use crate::scene::Scene;
use crate::surface::{Fragment, LineClipper, RenderError, RenderSurface, Typesetter};
use crate::vec2::Vec2;

/// Arrowhead dimensions, handed along with any line that wants one so the
/// host can size its marker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArrowHead {
    pub width: f64,
    pub height: f64,
}

impl Default for ArrowHead {
    fn default() -> Self {
        Self { width: ARROW_WIDTH, height: ARROW_HEIGHT }
    }
}

/// Serializable description of one renderable entity, handed to the surface
/// on create and update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ShapeDesc {
    Point {
        x: f64,
        y: f64,
        r: f64,
        role: PointRole,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        arrow: Option<ArrowHead>,
        infinite: bool,
        normal: bool,
        dim: bool,
    },
    Circle {
        cx: f64,
        cy: f64,
        r: f64,
    },
    Surface {
        x: f64,
        y: f64,
        width: f64,
    },
    Curve {
        control: Vec<Vec2>,
    },
    Text {
        x: f64,
        y: f64,
        content: String,
    },
    /// A numeric readout; the host formats the value.
    Scalar {
        x: f64,
        y: f64,
        value: f64,
    },
    Label {
        x: f64,
        y: f64,
        content: String,
        math: bool,
    },
    /// The clickable step-reveal marker.
    Marker {
        x: f64,
        y: f64,
        size: f64,
    },
}

/// The flatten/diff driver for one diagram root.
pub struct Renderer {
    root: EntityId,
    view_w: f64,
    view_h: f64,
    prev: Vec<EntityId>,
    started: bool,
    clipper: Option<Box<dyn LineClipper>>,
    typesetter: Option<Box<dyn Typesetter>>,
}

impl Renderer {
    /// A driver for the graph rooted at `root`, rendered into a view box of
    /// the given logical size.
    #[must_use]
    pub fn new(root: EntityId, view_w: f64, view_h: f64) -> Self {
        Self {
            root,
            view_w,
            view_h,
            prev: Vec::new(),
            started: false,
            clipper: None,
            typesetter: None,
        }
    }

    /// Attach the clipping collaborator used for infinite lines.
    #[must_use]
    pub fn with_clipper(mut self, clipper: impl LineClipper + 'static) -> Self {
        self.clipper = Some(Box::new(clipper));
        self
    }

    /// Attach the math-typesetting collaborator.
    #[must_use]
    pub fn with_typesetter(mut self, typesetter: impl Typesetter + 'static) -> Self {
        self.typesetter = Some(Box::new(typesetter));
        self
    }

    /// Ids rendered by the previous pass, in paint order.
    #[must_use]
    pub fn rendered(&self) -> &[EntityId] {
        &self.prev
    }

    /// Run one full evaluate → flatten → diff pass.
    ///
    /// # Errors
    ///
    /// The first-ever pass fails with [`RenderError::TypesetterNotReady`]
    /// while the typesetting collaborator is still initializing; the host
    /// retries. Once one pass has succeeded the readiness gate never
    /// recurs.
    pub fn render(
        &mut self,
        scene: &mut Scene,
        surface: &mut dyn RenderSurface,
    ) -> Result<(), RenderError> {
        if !self.started {
            if let Some(t) = &self.typesetter {
                if !t.ready() {
                    return Err(RenderError::TypesetterNotReady);
                }
            }
        }

        let next = scene.flatten(self.root);
        self.resolve_labels(scene, &next);

        let prev_set: HashSet<EntityId> = self.prev.iter().copied().collect();
        let next_set: HashSet<EntityId> = next.iter().copied().collect();

        let mut entered = 0usize;
        let mut updated = 0usize;
        for &id in &next {
            let Some(shape) = describe(scene, id, self.view_w, self.view_h, self.clipper.as_deref())
            else {
                continue;
            };
            if prev_set.contains(&id) {
                updated += 1;
                surface.update(id, &shape);
            } else {
                entered += 1;
                surface.create(id, &shape);
            }
        }
        let mut exited = 0usize;
        for &id in &self.prev {
            if !next_set.contains(&id) {
                exited += 1;
                surface.remove(id);
            }
        }
        tracing::debug!(entered, updated, exited, "render pass");

        self.prev = next;
        self.started = true;
        Ok(())
    }

    /// Resolve math-label fragments through the typesetter. Failures are
    /// logged and fall back to a zero-size plain fragment; rendering always
    /// continues.
    fn resolve_labels(&mut self, scene: &mut Scene, order: &[EntityId]) {
        for &id in order {
            let markup = match &scene.entity(id).kind {
                EntityKind::Label(l) if l.kind == LabelKind::Math && l.fragment.is_none() => {
                    l.markup.clone()
                }
                _ => continue,
            };
            let (fragment, fallback) = match &mut self.typesetter {
                Some(t) => match t.typeset(&markup) {
                    Ok(fragment) => (fragment, false),
                    Err(err) => {
                        tracing::warn!(%err, markup, "typeset failed; using plain fallback");
                        (Fragment::default(), true)
                    }
                },
                None => (Fragment::default(), true),
            };
            if let EntityKind::Label(l) = &mut scene.entity_mut(id).kind {
                l.fragment = Some(fragment);
                l.fallback = fallback;
            }
        }
    }
}

/// Describe one flattened entity for the surface. Structural entities
/// (groups, calcs, gates) have no description and are never in the flat
/// list.
fn describe(
    scene: &Scene,
    id: EntityId,
    view_w: f64,
    view_h: f64,
    clipper: Option<&dyn LineClipper>,
) -> Option<ShapeDesc> {
    match &scene.entity(id).kind {
        EntityKind::Point(p) => Some(ShapeDesc::Point {
            x: p.pos.x,
            y: p.pos.y,
            r: p.radius,
            role: p.role,
        }),
        EntityKind::Line(l) => {
            let mut a = scene.point_pos(l.p1);
            let mut b = scene.point_pos(l.p2);
            if l.style.contains(LineStyle::INFINITE) {
                if let Some(c) = clipper {
                    if let Some((ca, cb)) = c.clip(a, b, view_w, view_h) {
                        a = ca;
                        b = cb;
                    }
                }
            }
            Some(ShapeDesc::Line {
                x1: a.x,
                y1: a.y,
                x2: b.x,
                y2: b.y,
                arrow: l.style.contains(LineStyle::ARROW).then(ArrowHead::default),
                infinite: l.style.contains(LineStyle::INFINITE),
                normal: l.style.contains(LineStyle::NORMAL),
                dim: l.style.contains(LineStyle::DIM),
            })
        }
        EntityKind::Circle(c) => {
            let center = scene.point_pos(c.center);
            Some(ShapeDesc::Circle { cx: center.x, cy: center.y, r: c.r })
        }
        EntityKind::Surface(s) => {
            let anchor = scene.point_pos(s.anchor);
            Some(ShapeDesc::Surface { x: anchor.x, y: anchor.y, width: s.width })
        }
        EntityKind::Curve(c) => Some(ShapeDesc::Curve {
            control: c.control.iter().map(|&p| scene.point_pos(p)).collect(),
        }),
        EntityKind::Text(t) => Some(ShapeDesc::Text {
            x: t.pos.x,
            y: t.pos.y,
            content: t.content.clone(),
        }),
        EntityKind::Scalar(s) => Some(ShapeDesc::Scalar { x: s.pos.x, y: s.pos.y, value: s.value }),
        EntityKind::Label(l) => {
            let fragment = l.fragment.unwrap_or_default();
            let math = l.kind == LabelKind::Math && !l.fallback;
            let kind = if math { LabelKind::Math } else { LabelKind::Plain };
            let offset = label_offset(kind, l.dir, fragment.width, fragment.height);
            Some(ShapeDesc::Label {
                x: l.pos.x + offset.x,
                y: l.pos.y + offset.y,
                content: l.markup.clone(),
                math,
            })
        }
        EntityKind::Reveal(r) => {
            Some(ShapeDesc::Marker { x: r.pos.x, y: r.pos.y, size: REVEAL_MARKER_SIZE })
        }
        EntityKind::Group(_) | EntityKind::Calc(_) | EntityKind::Gate(_) => None,
    }
}

/// Offset from the anchor to the label's layout origin for a compass
/// direction. Plain text anchors at its baseline; typeset math anchors at
/// its top-left, so the vertical terms differ.
fn label_offset(kind: LabelKind, dir: Compass, w: f64, h: f64) -> Vec2 {
    let f = LABEL_SCALE;
    let o = LABEL_GAP;
    let d = LABEL_DIAGONAL;
    match kind {
        LabelKind::Plain => match dir {
            Compass::N => Vec2::new(-(w / 2.0) * f, -o),
            Compass::Ne => Vec2::new(o * d, -o * d),
            Compass::E => Vec2::new(o, (h / 2.0) * f),
            Compass::Se => Vec2::new(o * d, (o + h * f) * d),
            Compass::S => Vec2::new(-(w / 2.0) * f, o + h * f),
            Compass::Sw => Vec2::new((-o - w * f) * d, (o + h * f) * d),
            Compass::W => Vec2::new(-o - w * f, (h / 2.0) * f),
            Compass::Nw => Vec2::new((-o - w * f) * d, -o * d),
        },
        LabelKind::Math => match dir {
            Compass::N => Vec2::new(-(w / 2.0) * f, -o - h * f),
            Compass::Ne => Vec2::new(o * d, (-o - h * f) * d),
            Compass::E => Vec2::new(o, -(h / 2.0) * f),
            Compass::Se => Vec2::new(o * d, o * d),
            Compass::S => Vec2::new(-(w / 2.0) * f, o),
            Compass::Sw => Vec2::new((-o - w * f) * d, o * d),
            Compass::W => Vec2::new(-o - w * f, -(h / 2.0) * f),
            Compass::Nw => Vec2::new((-o - w * f) * d, -o - h * f * d),
        },
    }
}
