//! Viewport state and pixel-space ↔ diagram-space conversion.
//!
//! The diagram lives in a logical view box; the host renders it at some
//! on-screen client size, possibly under an additional global zoom (e.g. a
//! slide-deck scaling the whole document). Pointer events arrive in client
//! pixels and are converted to view-box coordinates here.

#[cfg(test)]
#[path = "viewport_test.rs"]
mod viewport_test;

use crate::vec2::Vec2;

/// Viewport geometry for one diagram.
///
/// `zoom` is the global document zoom factor (1.0 = none); it is set only by
/// the host's viewport-resize handler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Logical view-box width in diagram units.
    pub view_w: f64,
    /// Logical view-box height in diagram units.
    pub view_h: f64,
    /// On-screen client width in pixels.
    pub client_w: f64,
    /// On-screen client height in pixels.
    pub client_h: f64,
    /// Global zoom multiplier applied by the document around the client box.
    pub zoom: f64,
}

impl Viewport {
    /// A viewport rendered 1:1 at its logical size, unzoomed.
    #[must_use]
    pub fn new(view_w: f64, view_h: f64) -> Self {
        Self { view_w, view_h, client_w: view_w, client_h: view_h, zoom: 1.0 }
    }

    /// Record the on-screen size of the rendered viewport.
    pub fn set_client_size(&mut self, client_w: f64, client_h: f64) {
        self.client_w = client_w;
        self.client_h = client_h;
    }

    /// Record the global document zoom factor.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom;
    }

    /// Diagram units per client pixel on each axis.
    #[must_use]
    pub fn scale(&self) -> Vec2 {
        Vec2::new(self.view_w / self.client_w, self.view_h / self.client_h)
    }

    /// Convert a pointer position in client pixels to diagram coordinates,
    /// clamping to the viewport's client bounds first.
    #[must_use]
    pub fn to_diagram(&self, screen: Vec2) -> Vec2 {
        let s = self.scale();
        let x = clamp(screen.x / self.zoom, self.client_w);
        let y = clamp(screen.y / self.zoom, self.client_h);
        Vec2::new(x * s.x, y * s.y)
    }
}

fn clamp(v: f64, max: f64) -> f64 {
    v.max(0.0).min(max)
}
