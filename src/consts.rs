//! Shared numeric constants for the diagram engine.

// ── Display geometry ────────────────────────────────────────────

/// One diagram display unit in view-box coordinates. Normal vectors and
/// arrowheads are sized in multiples of this.
pub const UNIT: f64 = 60.0;

/// Default render radius for a point marker.
pub const POINT_RADIUS: f64 = 6.0;

/// Arrowhead width in view-box units.
pub const ARROW_WIDTH: f64 = 9.0;

/// Arrowhead height in view-box units.
pub const ARROW_HEIGHT: f64 = 7.0;

/// Display length of an intersection-point normal vector.
pub const NORMAL_LEN: f64 = UNIT;

/// Display length of a circle's outward rim normal.
pub const CIRCLE_NORMAL_LEN: f64 = UNIT * 2.0;

/// Side length of the step-reveal marker triangle.
pub const REVEAL_MARKER_SIZE: f64 = 20.0;

// ── Label layout ────────────────────────────────────────────────

/// Scale from typeset fragment units to view-box units.
pub const LABEL_SCALE: f64 = 15.0;

/// Gap between a label and its anchor, in view-box units.
pub const LABEL_GAP: f64 = 20.0;

/// Diagonal compass offsets are shortened by this factor.
pub const LABEL_DIAGONAL: f64 = 0.81;

// ── Paint order ─────────────────────────────────────────────────
//
// Lower values paint first. Draggable and computed points sit above
// everything except the reveal marker so they stay grabbable.

pub const Z_INFINITE_LINE: i32 = 0;
pub const Z_SURFACE: i32 = 1;
pub const Z_TEXT: i32 = 1;
/// Circles paint beneath lines so chords and normals stay visible on top.
pub const Z_CIRCLE: i32 = 1;
pub const Z_LINE: i32 = 10;
pub const Z_POINT: i32 = 100;
pub const Z_LABEL: i32 = 1000;
pub const Z_DRAG_POINT: i32 = 1000;
pub const Z_COMPUTED_POINT: i32 = 1001;
pub const Z_REVEAL: i32 = 2000;
