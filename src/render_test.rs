#![allow(clippy::float_cmp)]

use std::cell::Cell;
use std::rc::Rc;

use super::*;
use crate::entity::PointRole;
use crate::surface::TypesetError;

#[derive(Debug, Clone, PartialEq)]
enum Op {
    Create(EntityId),
    Update(EntityId),
    Remove(EntityId),
}

#[derive(Default)]
struct MockSurface {
    ops: Vec<Op>,
}

impl MockSurface {
    fn clear(&mut self) {
        self.ops.clear();
    }

    fn creates(&self) -> Vec<EntityId> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Create(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    fn removes(&self) -> Vec<EntityId> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Remove(id) => Some(*id),
                _ => None,
            })
            .collect()
    }
}

impl RenderSurface for MockSurface {
    fn create(&mut self, id: EntityId, _shape: &ShapeDesc) {
        self.ops.push(Op::Create(id));
    }

    fn update(&mut self, id: EntityId, _shape: &ShapeDesc) {
        self.ops.push(Op::Update(id));
    }

    fn remove(&mut self, id: EntityId) {
        self.ops.push(Op::Remove(id));
    }
}

struct MockTypesetter {
    ready: Rc<Cell<bool>>,
    reject: bool,
    calls: Rc<Cell<u32>>,
}

impl Typesetter for MockTypesetter {
    fn ready(&self) -> bool {
        self.ready.get()
    }

    fn typeset(&mut self, markup: &str) -> Result<Fragment, TypesetError> {
        self.calls.set(self.calls.get() + 1);
        if self.reject {
            Err(TypesetError::Rejected(markup.to_string()))
        } else {
            Ok(Fragment::new(4.0, 2.0))
        }
    }
}

/// Midline clipper: replaces an infinite line with the full-width horizontal
/// through its first endpoint. Enough to observe that clipping ran.
struct MidlineClipper;

impl LineClipper for MidlineClipper {
    fn clip(&self, a: Vec2, _b: Vec2, width: f64, _height: f64) -> Option<(Vec2, Vec2)> {
        Some((Vec2::new(0.0, a.y), Vec2::new(width, a.y)))
    }
}

fn line_scene() -> (Scene, EntityId, EntityId, EntityId, EntityId) {
    let mut scene = Scene::new();
    let a = scene.point(10.0, 10.0, PointRole::Draggable);
    let b = scene.point(90.0, 50.0, PointRole::Draggable);
    let l = scene.line(a, b, LineStyle::empty());
    let root = scene.group(vec![l]);
    (scene, root, a, b, l)
}

// --- Enter / update / exit ---

#[test]
fn first_pass_creates_everything() {
    let (mut scene, root, a, b, l) = line_scene();
    let mut renderer = Renderer::new(root, 600.0, 400.0);
    let mut surface = MockSurface::default();

    renderer.render(&mut scene, &mut surface).unwrap();
    let mut created = surface.creates();
    created.sort_unstable();
    assert_eq!(created, vec![a, b, l]);
    assert!(surface.removes().is_empty());
}

#[test]
fn second_pass_updates_in_place() {
    let (mut scene, root, _, _, _) = line_scene();
    let mut renderer = Renderer::new(root, 600.0, 400.0);
    let mut surface = MockSurface::default();

    renderer.render(&mut scene, &mut surface).unwrap();
    surface.clear();
    renderer.render(&mut scene, &mut surface).unwrap();
    assert!(surface.creates().is_empty());
    assert!(surface.removes().is_empty());
    assert_eq!(surface.ops.len(), 3);
}

#[test]
fn disappearing_entities_are_removed() {
    let mut scene = Scene::new();
    let c = scene.point(300.0, 300.0, PointRole::Plain);
    let circle = scene.circle(c, 200.0);
    let a = scene.point(60.0, 300.0, PointRole::Draggable);
    let b = scene.point(540.0, 300.0, PointRole::Draggable);
    let l = scene.line(a, b, LineStyle::empty());
    let hit = scene.intersect_line_circle(l, circle);
    let root = scene.group(vec![circle, l, hit.p1, hit.p2]);

    let mut renderer = Renderer::new(root, 600.0, 600.0);
    let mut surface = MockSurface::default();
    renderer.render(&mut scene, &mut surface).unwrap();
    assert!(surface.creates().contains(&hit.p1));

    // Drag the line clear of the circle: both hits exit.
    scene.move_point(a, Vec2::new(60.0, 60.0));
    scene.move_point(b, Vec2::new(540.0, 60.0));
    surface.clear();
    renderer.render(&mut scene, &mut surface).unwrap();
    let removed = surface.removes();
    assert!(removed.contains(&hit.p1));
    assert!(removed.contains(&hit.p2));
    assert!(!surface.creates().contains(&hit.p1));
}

#[test]
fn shared_points_are_created_once() {
    let mut scene = Scene::new();
    let a = scene.point(0.0, 0.0, PointRole::Plain);
    let b = scene.point(10.0, 0.0, PointRole::Plain);
    let c = scene.point(5.0, 5.0, PointRole::Plain);
    let ab = scene.line(a, b, LineStyle::empty());
    let ac = scene.line(a, c, LineStyle::empty());
    let root = scene.group(vec![ab, ac]);

    let mut renderer = Renderer::new(root, 600.0, 400.0);
    let mut surface = MockSurface::default();
    renderer.render(&mut scene, &mut surface).unwrap();
    let created = surface.creates();
    assert_eq!(created.iter().filter(|&&id| id == a).count(), 1);
}

#[test]
fn renders_are_issued_in_paint_order() {
    let (mut scene, root, a, b, l) = line_scene();
    let mut renderer = Renderer::new(root, 600.0, 400.0);
    let mut surface = MockSurface::default();
    renderer.render(&mut scene, &mut surface).unwrap();
    // The line paints below its endpoint markers.
    assert_eq!(surface.creates(), vec![l, a, b]);
}

// --- Shape descriptions ---

#[test]
fn point_description_carries_role_and_radius() {
    let mut scene = Scene::new();
    let p = scene.point(3.0, 4.0, PointRole::Draggable);
    let root = scene.group(vec![p]);
    let mut renderer = Renderer::new(root, 600.0, 400.0);

    struct Capture(Vec<ShapeDesc>);
    impl RenderSurface for Capture {
        fn create(&mut self, _id: EntityId, shape: &ShapeDesc) {
            self.0.push(shape.clone());
        }
        fn update(&mut self, _id: EntityId, shape: &ShapeDesc) {
            self.0.push(shape.clone());
        }
        fn remove(&mut self, _id: EntityId) {}
    }

    let mut surface = Capture(Vec::new());
    renderer.render(&mut scene, &mut surface).unwrap();
    assert_eq!(
        surface.0,
        vec![ShapeDesc::Point { x: 3.0, y: 4.0, r: crate::consts::POINT_RADIUS, role: PointRole::Draggable }]
    );
}

#[test]
fn infinite_lines_pass_through_the_clipper() {
    let mut scene = Scene::new();
    let a = scene.point(100.0, 50.0, PointRole::Invisible);
    let b = scene.point(200.0, 50.0, PointRole::Invisible);
    let l = scene.line(a, b, LineStyle::INFINITE);
    let root = scene.group(vec![l]);

    struct Capture(Vec<ShapeDesc>);
    impl RenderSurface for Capture {
        fn create(&mut self, _id: EntityId, shape: &ShapeDesc) {
            self.0.push(shape.clone());
        }
        fn update(&mut self, _id: EntityId, shape: &ShapeDesc) {}
        fn remove(&mut self, _id: EntityId) {}
    }

    let mut renderer = Renderer::new(root, 600.0, 400.0).with_clipper(MidlineClipper);
    let mut surface = Capture(Vec::new());
    renderer.render(&mut scene, &mut surface).unwrap();

    let line = surface
        .0
        .iter()
        .find(|s| matches!(s, ShapeDesc::Line { .. }))
        .unwrap();
    let ShapeDesc::Line { x1, x2, y1, y2, infinite, .. } = line else {
        unreachable!();
    };
    assert!(*infinite);
    assert_eq!((*x1, *x2), (0.0, 600.0));
    assert_eq!((*y1, *y2), (50.0, 50.0));
}

#[test]
fn arrow_lines_carry_marker_dimensions() {
    let mut scene = Scene::new();
    let base = scene.point(0.0, 0.0, PointRole::Plain);
    let v = scene.vector(base, 50.0, 0.0, LineStyle::empty());
    let root = scene.group(vec![v]);

    struct Capture(Vec<ShapeDesc>);
    impl RenderSurface for Capture {
        fn create(&mut self, _id: EntityId, shape: &ShapeDesc) {
            self.0.push(shape.clone());
        }
        fn update(&mut self, _id: EntityId, _shape: &ShapeDesc) {}
        fn remove(&mut self, _id: EntityId) {}
    }

    let mut renderer = Renderer::new(root, 600.0, 400.0);
    let mut surface = Capture(Vec::new());
    renderer.render(&mut scene, &mut surface).unwrap();

    let line = surface
        .0
        .iter()
        .find(|s| matches!(s, ShapeDesc::Line { .. }))
        .unwrap();
    let ShapeDesc::Line { arrow, .. } = line else {
        unreachable!();
    };
    let head = arrow.unwrap();
    assert_eq!(head.width, crate::consts::ARROW_WIDTH);
    assert_eq!(head.height, crate::consts::ARROW_HEIGHT);
}

#[test]
fn plain_lines_have_no_arrowhead() {
    let mut scene = Scene::new();
    let a = scene.point(0.0, 0.0, PointRole::Plain);
    let b = scene.point(10.0, 0.0, PointRole::Plain);
    let l = scene.line(a, b, LineStyle::empty());
    let shape = describe(&scene, l, 600.0, 400.0, None).unwrap();
    let ShapeDesc::Line { arrow, .. } = shape else {
        panic!("line expected");
    };
    assert!(arrow.is_none());
}

#[test]
fn reveal_marker_carries_its_size() {
    let mut scene = Scene::new();
    let reveal = scene.reveal(560.0, 20.0, vec![]);
    let shape = describe(&scene, reveal, 600.0, 400.0, None).unwrap();
    assert_eq!(
        shape,
        ShapeDesc::Marker { x: 560.0, y: 20.0, size: crate::consts::REVEAL_MARKER_SIZE }
    );
}

#[test]
fn scalar_updates_carry_the_new_value() {
    let mut scene = Scene::new();
    let s = scene.scalar(20.0, 30.0, 0.25);
    let root = scene.group(vec![s]);

    struct Capture(Vec<ShapeDesc>);
    impl RenderSurface for Capture {
        fn create(&mut self, _id: EntityId, shape: &ShapeDesc) {
            self.0.push(shape.clone());
        }
        fn update(&mut self, _id: EntityId, shape: &ShapeDesc) {
            self.0.push(shape.clone());
        }
        fn remove(&mut self, _id: EntityId) {}
    }

    let mut renderer = Renderer::new(root, 600.0, 400.0);
    let mut surface = Capture(Vec::new());
    renderer.render(&mut scene, &mut surface).unwrap();
    scene.set_scalar(s, 0.75);
    renderer.render(&mut scene, &mut surface).unwrap();

    assert_eq!(
        surface.0,
        vec![
            ShapeDesc::Scalar { x: 20.0, y: 30.0, value: 0.25 },
            ShapeDesc::Scalar { x: 20.0, y: 30.0, value: 0.75 },
        ]
    );
}

#[test]
fn shape_description_serializes_with_kind_tag() {
    let shape = ShapeDesc::Circle { cx: 1.0, cy: 2.0, r: 3.0 };
    let json = serde_json::to_value(&shape).unwrap();
    assert_eq!(json["kind"], "circle");
    assert_eq!(json["r"], 3.0);
}

// --- Typesetter gate ---

#[test]
fn first_render_waits_for_the_typesetter() {
    let (mut scene, root, _, _, _) = line_scene();
    let ready = Rc::new(Cell::new(false));
    let typesetter = MockTypesetter {
        ready: Rc::clone(&ready),
        reject: false,
        calls: Rc::new(Cell::new(0)),
    };
    let mut renderer = Renderer::new(root, 600.0, 400.0).with_typesetter(typesetter);
    let mut surface = MockSurface::default();

    assert!(matches!(
        renderer.render(&mut scene, &mut surface),
        Err(RenderError::TypesetterNotReady)
    ));
    assert!(surface.ops.is_empty());

    ready.set(true);
    renderer.render(&mut scene, &mut surface).unwrap();
    assert!(!surface.ops.is_empty());
}

#[test]
fn readiness_is_only_checked_before_the_first_success() {
    let (mut scene, root, _, _, _) = line_scene();
    let ready = Rc::new(Cell::new(true));
    let typesetter = MockTypesetter {
        ready: Rc::clone(&ready),
        reject: false,
        calls: Rc::new(Cell::new(0)),
    };
    let mut renderer = Renderer::new(root, 600.0, 400.0).with_typesetter(typesetter);
    let mut surface = MockSurface::default();

    renderer.render(&mut scene, &mut surface).unwrap();
    // A late readiness flip no longer blocks rendering.
    ready.set(false);
    renderer.render(&mut scene, &mut surface).unwrap();
}

#[test]
fn math_labels_typeset_once() {
    let mut scene = Scene::new();
    let p = scene.point(0.0, 0.0, PointRole::Plain);
    let label = scene.math_label(p, r"\vec{v}", Compass::Ne);
    let root = scene.group(vec![p, label]);

    let calls = Rc::new(Cell::new(0));
    let typesetter = MockTypesetter {
        ready: Rc::new(Cell::new(true)),
        reject: false,
        calls: Rc::clone(&calls),
    };
    let mut renderer = Renderer::new(root, 600.0, 400.0).with_typesetter(typesetter);
    let mut surface = MockSurface::default();

    renderer.render(&mut scene, &mut surface).unwrap();
    renderer.render(&mut scene, &mut surface).unwrap();
    assert_eq!(calls.get(), 1);

    let EntityKind::Label(l) = &scene.entity(label).kind else {
        panic!("label expected");
    };
    assert_eq!(l.fragment, Some(Fragment::new(4.0, 2.0)));
    assert!(!l.fallback);
}

#[test]
fn rejected_markup_falls_back_to_plain() {
    let mut scene = Scene::new();
    let p = scene.point(0.0, 0.0, PointRole::Plain);
    let label = scene.math_label(p, r"\bogus", Compass::Ne);
    let root = scene.group(vec![p, label]);

    let typesetter = MockTypesetter {
        ready: Rc::new(Cell::new(true)),
        reject: true,
        calls: Rc::new(Cell::new(0)),
    };
    let mut renderer = Renderer::new(root, 600.0, 400.0).with_typesetter(typesetter);
    let mut surface = MockSurface::default();
    renderer.render(&mut scene, &mut surface).unwrap();

    let EntityKind::Label(l) = &scene.entity(label).kind else {
        panic!("label expected");
    };
    assert!(l.fallback);
    assert_eq!(l.fragment, Some(Fragment::default()));
}

// --- Label placement ---

#[test]
fn plain_label_offsets_by_compass_direction() {
    let o = crate::consts::LABEL_GAP;
    let north = label_offset(LabelKind::Plain, Compass::N, 4.0, 2.0);
    assert_eq!(north.y, -o);
    assert_eq!(north.x, -2.0 * crate::consts::LABEL_SCALE);

    let east = label_offset(LabelKind::Plain, Compass::E, 4.0, 2.0);
    assert_eq!(east.x, o);
}

#[test]
fn diagonal_offsets_are_shortened() {
    let o = crate::consts::LABEL_GAP;
    let ne = label_offset(LabelKind::Plain, Compass::Ne, 0.0, 0.0);
    assert_eq!(ne.x, o * crate::consts::LABEL_DIAGONAL);
    assert!(ne.x < o);
}

#[test]
fn math_offsets_differ_from_plain() {
    let plain = label_offset(LabelKind::Plain, Compass::N, 4.0, 2.0);
    let math = label_offset(LabelKind::Math, Compass::N, 4.0, 2.0);
    assert_eq!(plain.x, math.x);
    assert!(math.y < plain.y);
}
