#![allow(clippy::float_cmp)]

use super::*;

const EPSILON: f64 = 1e-10;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

// --- Construction ---

#[test]
fn new_stores_components() {
    let v = Vec2::new(3.0, -4.0);
    assert_eq!(v.x, 3.0);
    assert_eq!(v.y, -4.0);
}

#[test]
fn zero_is_origin() {
    assert_eq!(Vec2::ZERO, Vec2::new(0.0, 0.0));
}

// --- Arithmetic ---

#[test]
fn add_componentwise() {
    let v = Vec2::new(1.0, 2.0) + Vec2::new(3.0, 4.0);
    assert_eq!(v, Vec2::new(4.0, 6.0));
}

#[test]
fn sub_componentwise() {
    let v = Vec2::new(5.0, 1.0) - Vec2::new(2.0, 3.0);
    assert_eq!(v, Vec2::new(3.0, -2.0));
}

#[test]
fn mul_scales_both_components() {
    let v = Vec2::new(2.0, -3.0) * 2.5;
    assert_eq!(v, Vec2::new(5.0, -7.5));
}

#[test]
fn neg_flips_both_components() {
    assert_eq!(-Vec2::new(1.0, -2.0), Vec2::new(-1.0, 2.0));
}

// --- Length / dot ---

#[test]
fn length_of_3_4_is_5() {
    assert!(approx_eq(Vec2::new(3.0, 4.0).length(), 5.0));
}

#[test]
fn length_of_zero_is_zero() {
    assert_eq!(Vec2::ZERO.length(), 0.0);
}

#[test]
fn dot_of_perpendicular_vectors_is_zero() {
    let a = Vec2::new(1.0, 0.0);
    let b = Vec2::new(0.0, 7.0);
    assert_eq!(a.dot(b), 0.0);
}

#[test]
fn dot_of_parallel_vectors_is_product_of_lengths() {
    let a = Vec2::new(2.0, 0.0);
    let b = Vec2::new(3.0, 0.0);
    assert_eq!(a.dot(b), 6.0);
}

// --- Normalize ---

#[test]
fn normalized_has_unit_length() {
    let n = Vec2::new(3.0, 4.0).normalized();
    let n = n.unwrap();
    assert!(approx_eq(n.length(), 1.0));
    assert!(approx_eq(n.x, 0.6));
    assert!(approx_eq(n.y, 0.8));
}

#[test]
fn normalized_zero_is_none() {
    assert!(Vec2::ZERO.normalized().is_none());
}

// --- Perp ---

#[test]
fn perp_is_orthogonal() {
    let v = Vec2::new(3.0, 4.0);
    assert_eq!(v.dot(v.perp()), 0.0);
}

#[test]
fn perp_preserves_length() {
    let v = Vec2::new(3.0, 4.0);
    assert!(approx_eq(v.perp().length(), v.length()));
}

// --- Serde ---

#[test]
fn serializes_as_plain_object() {
    let json = serde_json::to_value(Vec2::new(1.5, -2.0)).unwrap();
    assert_eq!(json, serde_json::json!({ "x": 1.5, "y": -2.0 }));
}
