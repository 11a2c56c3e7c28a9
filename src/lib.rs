//! Interactive geometric diagram engine.
//!
//! This crate owns the full lifecycle of a declarative 2D diagram: a scene
//! graph of geometric entities (points, lines, circles, curves, labels),
//! derived computations that keep intersection points, mirrors and
//! projections consistent while the user drags, and combinators for
//! conditional visibility and step-by-step reveals. Every interaction runs a
//! full synchronous re-evaluation of the graph, then a flatten/diff pass
//! hands enter/update/exit instructions to a host-supplied rendering
//! surface. The host layer is responsible only for wiring pointer events to
//! the [`input::Controller`] and realizing [`render::ShapeDesc`]s on screen.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`scene`] | Entity arena, constructor API, evaluation and flattening |
//! | [`entity`] | Entity core, payload types, roles and styles |
//! | [`calc`] | Derived geometry: intersections, mirror, projection, sums |
//! | [`gate`] | Conditional visibility with open/close callbacks |
//! | [`reveal`] | Step-by-step disclosure of a child sequence |
//! | [`render`] | Flatten/diff render driver and shape descriptions |
//! | [`surface`] | Host collaborator traits: surface, clipper, typesetter |
//! | [`input`] | Pointer gesture state machine |
//! | [`viewport`] | Pixel-space ↔ diagram-space conversion |
//! | [`vec2`] | 2D vector algebra |
//! | [`consts`] | Shared numeric constants (sizes, paint order) |

pub mod calc;
pub mod consts;
pub mod entity;
pub mod gate;
pub mod input;
pub mod render;
pub mod reveal;
pub mod scene;
pub mod surface;
pub mod vec2;
pub mod viewport;
