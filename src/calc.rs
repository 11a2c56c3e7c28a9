//! Derived-geometry engine: entities whose position or shape is computed
//! from other entities on every evaluation pass.
//!
//! Each derived computation is a `Calc` entity holding dependency handles,
//! owned output handles, and a [`CalcRule`]. Evaluation marks every owned
//! output incomplete, evaluates all dependencies without short-circuiting,
//! and then invokes the rule with the conjunction result; the rule decides
//! which outputs to position and mark complete. A formula with no valid
//! solution (negative discriminant, zero-length direction) simply leaves its
//! outputs incomplete — geometric undefinedness is never an error.
//!
//! All math is double precision with no tolerance anywhere: the discriminant
//! sign test is exact, so near-tangent configurations may flicker between 0
//! and 2 solutions under continuous dragging. Accepted behavior.

#[cfg(test)]
#[path = "calc_test.rs"]
mod calc_test;

use std::rc::Rc;

use crate::consts::NORMAL_LEN;
use crate::entity::{EntityId, EntityKind, LineStyle, PointRole};
use crate::scene::Scene;
use crate::vec2::Vec2;

/// Pure interpolation function over dependency positions.
pub type InterpolateFn = Rc<dyn Fn(&[Vec2]) -> Vec2>;

/// The geometry formula of a `Calc` entity.
#[derive(Clone)]
pub enum CalcRule {
    /// Intersection of an (infinitely extended) line with a circle. Owns two
    /// points and two radius-direction normal vectors.
    LineCircle {
        line: EntityId,
        circle: EntityId,
        p1: EntityId,
        n1: EntityId,
        p2: EntityId,
        n2: EntityId,
    },
    /// Point reflection through a center: `P' = 2C − P`.
    Mirror {
        center: EntityId,
        point: EntityId,
        out: EntityId,
    },
    /// Orthogonal projection of `point` onto the direction `tip − base`.
    Project {
        base: EntityId,
        tip: EntityId,
        point: EntityId,
        out: EntityId,
    },
    /// Vector sum: `tip = base + (reference.p2 − reference.p1)`.
    Sum {
        base: EntityId,
        reference: EntityId,
        tip: EntityId,
    },
    /// Caller-supplied pure function of the dependency positions.
    Interpolate { f: InterpolateFn, out: EntityId },
}

/// Payload of a `Calc` entity.
pub struct CalcData {
    /// Entities this computation reads. All are evaluated every pass.
    pub deps: Vec<EntityId>,
    /// Entities this computation positions. All are marked incomplete at the
    /// start of every pass; the rule selectively completes a subset.
    pub outputs: Vec<EntityId>,
    pub rule: CalcRule,
}

/// Evaluate a `Calc` entity: reset outputs, evaluate dependencies, run the
/// rule with the conjunction result.
pub(crate) fn evaluate(scene: &mut Scene, id: EntityId) -> bool {
    let (deps, outputs, rule) = {
        let EntityKind::Calc(c) = &scene.entity(id).kind else {
            return false;
        };
        (c.deps.clone(), c.outputs.clone(), c.rule.clone())
    };
    for &out in &outputs {
        scene.set_complete(out, false);
    }
    let ok = scene.eval_all(&deps);
    scene.set_complete(id, ok);
    apply(scene, &rule, &deps, ok);
    ok
}

fn apply(scene: &mut Scene, rule: &CalcRule, deps: &[EntityId], ok: bool) {
    match rule {
        CalcRule::LineCircle { line, circle, p1, n1, p2, n2 } => {
            line_circle(scene, ok, *line, *circle, [(*p1, *n1), (*p2, *n2)]);
        }
        CalcRule::Mirror { center, point, out } => {
            if !ok {
                return;
            }
            let c = scene.point_pos(*center);
            let p = scene.point_pos(*point);
            scene.move_point(*out, c * 2.0 - p);
            scene.set_complete(*out, true);
        }
        CalcRule::Project { base, tip, point, out } => {
            if !ok {
                return;
            }
            let b = scene.point_pos(*base);
            let t = scene.point_pos(*tip);
            let p = scene.point_pos(*point);
            // A zero-length direction has no projection; the output stays
            // incomplete.
            let Some(unit) = (t - b).normalized() else {
                return;
            };
            let along = (p - b).dot(unit);
            scene.move_point(*out, b + unit * along);
            scene.set_complete(*out, true);
        }
        CalcRule::Sum { base, reference, tip } => {
            if !ok {
                return;
            }
            let (rp1, rp2) = scene.line_endpoints(*reference);
            let d = scene.point_pos(rp2) - scene.point_pos(rp1);
            let b = scene.point_pos(*base);
            scene.move_point(*tip, b + d);
            scene.set_complete(*tip, true);
        }
        CalcRule::Interpolate { f, out } => {
            if !ok {
                return;
            }
            let positions: Vec<Vec2> = deps.iter().map(|&d| scene.entity_pos(d)).collect();
            let target = f(&positions);
            scene.move_point(*out, target);
            scene.set_complete(*out, true);
        }
    }
}

/// Solve `|P1 + t(P2−P1) − C|² = r²` and position both intersection outputs.
///
/// Both roots are used unconditionally — the line is treated as infinite, no
/// clamping of `t` to `[0, 1]`. A negative discriminant (or a degenerate
/// zero-length line) leaves both outputs incomplete with no coordinates
/// written; an exactly tangent configuration produces two coincident,
/// complete points.
fn line_circle(
    scene: &mut Scene,
    ok: bool,
    line: EntityId,
    circle: EntityId,
    outputs: [(EntityId, EntityId); 2],
) {
    let (lp1, lp2) = scene.line_endpoints(line);
    let a1 = scene.point_pos(lp1);
    let a2 = scene.point_pos(lp2);
    let c = scene.point_pos(scene.circle_center(circle));
    let r = scene.circle_radius(circle);

    let x = a1 - c;
    let d = a1 - a2;
    let qa = d.dot(d);
    let qb = 2.0 * x.dot(d);
    let qc = x.dot(x) - r * r;
    let disc = qb * qb - 4.0 * qa * qc;

    if !ok || qa == 0.0 || disc < 0.0 {
        return;
    }

    let sqrt = disc.sqrt();
    let roots = [(-qb - sqrt) / (2.0 * qa), (-qb + sqrt) / (2.0 * qa)];
    for (t, (point, normal)) in roots.into_iter().zip(outputs) {
        let hit = a1 + d * t;
        let n = (hit - c) * (NORMAL_LEN / r);
        scene.move_point(point, hit);
        scene.set_complete(point, true);
        scene.set_vector(normal, hit, n);
        scene.set_complete(normal, true);
    }
}

/// Handles to the parts of a line–circle intersection.
#[derive(Debug, Clone, Copy)]
pub struct Intersection {
    pub calc: EntityId,
    /// First intersection point (smaller line parameter).
    pub p1: EntityId,
    /// Radius-direction normal vector at `p1`.
    pub n1: EntityId,
    /// Second intersection point (larger line parameter).
    pub p2: EntityId,
    /// Radius-direction normal vector at `p2`.
    pub n2: EntityId,
}

/// Handles to the parts of a vector sum.
#[derive(Debug, Clone, Copy)]
pub struct VectorSum {
    pub calc: EntityId,
    /// The rendered line from the base to the computed tip.
    pub line: EntityId,
    /// The computed tip point.
    pub tip: EntityId,
}

impl Scene {
    /// Intersect a line's infinite extension with a circle.
    ///
    /// Owns two computed points and two normal vectors; each evaluation
    /// completes both, or neither when the line misses the circle. The
    /// returned handles are placed into the tree by the caller.
    pub fn intersect_line_circle(&mut self, line: EntityId, circle: EntityId) -> Intersection {
        let p1 = self.point(0.0, 0.0, PointRole::Computed);
        let n1 = self.normal_vector();
        let p2 = self.point(0.0, 0.0, PointRole::Computed);
        let n2 = self.normal_vector();
        let calc = self.push_calc(CalcData {
            deps: vec![line, circle],
            outputs: vec![p1, n1, p2, n2],
            rule: CalcRule::LineCircle { line, circle, p1, n1, p2, n2 },
        });
        for out in [p1, n1, p2, n2] {
            self.set_parent(out, calc);
        }
        Intersection { calc, p1, n1, p2, n2 }
    }

    /// Reflect `point` through `center`, yielding a computed point.
    pub fn mirror(&mut self, center: EntityId, point: EntityId) -> EntityId {
        let out = self.point(0.0, 0.0, PointRole::Computed);
        let calc = self.push_calc(CalcData {
            deps: vec![center, point],
            outputs: vec![out],
            rule: CalcRule::Mirror { center, point, out },
        });
        self.set_parent(out, calc);
        out
    }

    /// Orthogonally project `point` onto the direction from `base` to `tip`,
    /// yielding a computed point on that axis.
    pub fn project(&mut self, base: EntityId, tip: EntityId, point: EntityId) -> EntityId {
        let out = self.point(0.0, 0.0, PointRole::Computed);
        let calc = self.push_calc(CalcData {
            deps: vec![base, tip, point],
            outputs: vec![out],
            rule: CalcRule::Project { base, tip, point, out },
        });
        self.set_parent(out, calc);
        out
    }

    /// Translate `reference`'s displacement onto `base`: a line from `base`
    /// to the computed point `base + (reference.p2 − reference.p1)`.
    pub fn sum(&mut self, base: EntityId, reference: EntityId, style: LineStyle) -> VectorSum {
        let tip = self.point(0.0, 0.0, PointRole::Computed);
        let line = self.line(base, tip, style);
        let calc = self.push_calc(CalcData {
            deps: vec![base, reference],
            outputs: vec![tip],
            rule: CalcRule::Sum { base, reference, tip },
        });
        self.set_parent(tip, calc);
        VectorSum { calc, line, tip }
    }

    /// A computed point positioned by `f` over the current positions of
    /// `deps`, for arbitrary derived positions not covered by the built-in
    /// rules.
    pub fn interpolate(
        &mut self,
        deps: Vec<EntityId>,
        f: impl Fn(&[Vec2]) -> Vec2 + 'static,
    ) -> EntityId {
        let out = self.point(0.0, 0.0, PointRole::Computed);
        let calc = self.push_calc(CalcData {
            deps,
            outputs: vec![out],
            rule: CalcRule::Interpolate { f: Rc::new(f), out },
        });
        self.set_parent(out, calc);
        out
    }
}
