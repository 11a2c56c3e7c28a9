use super::*;
use crate::entity::{LineStyle, PointRole};

fn three_step_scene() -> (Scene, EntityId, [EntityId; 3]) {
    let mut scene = Scene::new();
    let a = scene.point(0.0, 0.0, PointRole::Plain);
    let b = scene.point(10.0, 0.0, PointRole::Plain);
    let c = scene.point(20.0, 0.0, PointRole::Plain);
    let reveal = scene.reveal(500.0, 20.0, vec![a, b, c]);
    (scene, reveal, [a, b, c])
}

// --- Cursor walk ---

#[test]
fn reveal_starts_fully_hidden() {
    let (scene, reveal, _) = three_step_scene();
    assert_eq!(scene.reveal_cursor(reveal), 0);
}

#[test]
fn advance_walks_every_prefix_and_wraps() {
    let (mut scene, reveal, _) = three_step_scene();
    let mut cursors = Vec::new();
    for _ in 0..5 {
        scene.advance(reveal);
        cursors.push(scene.reveal_cursor(reveal));
    }
    assert_eq!(cursors, vec![1, 2, 3, 0, 1]);
}

#[test]
fn advance_on_non_reveal_is_a_no_op() {
    let mut scene = Scene::new();
    let p = scene.point(0.0, 0.0, PointRole::Plain);
    assert!(!scene.advance(p));
    assert_eq!(scene.point_pos(p), Vec2::ZERO);
}

#[test]
fn empty_reveal_cursor_stays_at_zero() {
    let mut scene = Scene::new();
    let reveal = scene.reveal(0.0, 0.0, vec![]);
    assert!(scene.advance(reveal));
    assert_eq!(scene.reveal_cursor(reveal), 0);
}

// --- Flatten ---

#[test]
fn marker_renders_even_when_fully_hidden() {
    let (mut scene, reveal, children) = three_step_scene();
    let flat = scene.flatten(reveal);
    assert_eq!(flat, vec![reveal]);
    for child in children {
        assert!(!flat.contains(&child));
    }
}

#[test]
fn flatten_exposes_exactly_the_revealed_prefix() {
    let (mut scene, reveal, [a, b, c]) = three_step_scene();
    scene.advance(reveal);
    scene.advance(reveal);
    let flat = scene.flatten(reveal);
    assert!(flat.contains(&a));
    assert!(flat.contains(&b));
    assert!(!flat.contains(&c));
    assert!(flat.contains(&reveal));
}

#[test]
fn wrapping_hides_everything_again() {
    let (mut scene, reveal, _) = three_step_scene();
    for _ in 0..4 {
        scene.advance(reveal);
    }
    assert_eq!(scene.flatten(reveal), vec![reveal]);
}

// --- Evaluation ---

#[test]
fn reveal_is_always_complete() {
    let (mut scene, reveal, _) = three_step_scene();
    assert!(scene.evaluate(reveal));
    scene.advance(reveal);
    assert!(scene.evaluate(reveal));
}

#[test]
fn only_the_revealed_prefix_is_evaluated() {
    let mut scene = Scene::new();
    let base = scene.point(0.0, 0.0, PointRole::Draggable);
    let v = scene.vector(base, 10.0, 0.0, LineStyle::empty());
    let (_, tip) = scene.line_endpoints(v);
    let reveal = scene.reveal(0.0, 0.0, vec![v]);

    scene.move_point(base, Vec2::new(50.0, 0.0));
    scene.evaluate(reveal);
    // Hidden step: the vector's tip has not been repositioned.
    assert_eq!(scene.point_pos(tip), Vec2::new(10.0, 0.0));

    scene.advance(reveal);
    scene.evaluate(reveal);
    assert_eq!(scene.point_pos(tip), Vec2::new(60.0, 0.0));
}
