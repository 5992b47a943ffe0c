//! Viewport: mapping between surface pixels and model coordinates.
//!
//! The visible part of the page is a model-space rectangle derived from the
//! drawing's `scale` and translation and the surface size in pixels. Painting
//! applies `scale` then `translate`, so a model point `m` lands on screen at
//! `scale * (m + translation)`; [`Viewport::screen_to_model`] inverts that.

#[cfg(test)]
#[path = "viewport_test.rs"]
mod viewport_test;

use crate::consts::{CANVAS_HEIGHT, CANVAS_WIDTH};
use crate::drawing::round2;

/// A point in either screen or model space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Axis-aligned rectangle in model space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Pinch center captured when a zoom gesture begins.
#[derive(Debug, Clone, Copy)]
struct ZoomAnchor {
    /// Model point that must stay under the fingers.
    model: Point,
}

/// Pan/zoom state for one presentation surface.
#[derive(Debug, Clone)]
pub struct Viewport {
    scale: f32,
    translation_x: f32,
    translation_y: f32,
    surface_width: f32,
    surface_height: f32,
    canvas_width: f32,
    canvas_height: f32,
    view: Rect,
    anchor: Option<ZoomAnchor>,
}

impl Default for Viewport {
    #[allow(clippy::cast_precision_loss)]
    fn default() -> Self {
        Self::new(CANVAS_WIDTH as f32, CANVAS_HEIGHT as f32)
    }
}

impl Viewport {
    /// Create an identity viewport over a page of the given model size.
    #[must_use]
    pub fn new(canvas_width: f32, canvas_height: f32) -> Self {
        let mut viewport = Self {
            scale: 1.0,
            translation_x: 0.0,
            translation_y: 0.0,
            surface_width: 0.0,
            surface_height: 0.0,
            canvas_width,
            canvas_height,
            view: Rect::default(),
            anchor: None,
        };
        viewport.recompute_view();
        viewport
    }

    /// Replace the transform, e.g. with the values stored in a loaded drawing.
    pub fn set_transform(&mut self, scale: f32, translation_x: f32, translation_y: f32) {
        self.scale = scale;
        self.translation_x = translation_x;
        self.translation_y = translation_y;
        self.anchor = None;
        self.recompute_view();
    }

    /// Update the surface size in pixels.
    pub fn set_surface_size(&mut self, width: f32, height: f32) {
        self.surface_width = width;
        self.surface_height = height;
        self.recompute_view();
    }

    #[must_use]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    #[must_use]
    pub fn translation(&self) -> (f32, f32) {
        (self.translation_x, self.translation_y)
    }

    /// The model-space rectangle currently visible on the surface.
    #[must_use]
    pub fn view_rect(&self) -> Rect {
        self.view
    }

    #[must_use]
    pub fn surface_size(&self) -> (f32, f32) {
        (self.surface_width, self.surface_height)
    }

    /// Map a surface point into model space, clamped to the page and rounded
    /// to two decimals.
    #[must_use]
    pub fn screen_to_model(&self, screen: Point) -> Point {
        let raw = self.unclamped_model(screen);
        Point::new(
            round2(raw.x.clamp(0.0, self.canvas_width)),
            round2(raw.y.clamp(0.0, self.canvas_height)),
        )
    }

    /// Map a model point onto the surface.
    #[must_use]
    pub fn model_to_screen(&self, model: Point) -> Point {
        Point::new(
            (model.x + self.translation_x) * self.scale,
            (model.y + self.translation_y) * self.scale,
        )
    }

    /// Start a pinch gesture centered on `focus` (surface pixels).
    pub fn begin_zoom(&mut self, focus: Point) {
        self.anchor = Some(ZoomAnchor { model: self.unclamped_model(focus) });
    }

    /// Apply an incremental scale factor, keeping the anchored model point
    /// under `focus`. A factor of 1 with a moved focus pans.
    ///
    /// Returns `false` when no gesture is active or the factor is unusable
    /// (non-finite, zero, or negative); the transform is left untouched.
    pub fn update_zoom(&mut self, focus: Point, factor: f32) -> bool {
        let Some(anchor) = self.anchor else {
            return false;
        };
        if !factor.is_finite() || factor <= 0.0 {
            return false;
        }
        let scale = self.scale * factor;
        if !scale.is_finite() || scale <= 0.0 {
            return false;
        }
        self.scale = scale;
        self.view.width = self.surface_width / scale;
        self.view.height = self.surface_height / scale;
        self.view.x = anchor.model.x - focus.x / scale;
        self.view.y = anchor.model.y - focus.y / scale;
        self.translation_x = -self.view.x;
        self.translation_y = -self.view.y;
        true
    }

    /// One-shot zoom by `factor` about `focus`.
    pub fn apply_zoom(&mut self, focus: Point, factor: f32) -> bool {
        self.begin_zoom(focus);
        let applied = self.update_zoom(focus, factor);
        self.end_zoom();
        applied
    }

    /// Finish the pinch gesture.
    pub fn end_zoom(&mut self) {
        self.anchor = None;
    }

    /// Whether a pinch gesture is in progress.
    #[must_use]
    pub fn is_zooming(&self) -> bool {
        self.anchor.is_some()
    }

    /// Page bounds in model units.
    #[must_use]
    pub fn canvas_size(&self) -> (f32, f32) {
        (self.canvas_width, self.canvas_height)
    }

    // `view.size * (screen / surface)` reduces to `screen / scale`; the
    // reduced form stays defined before the surface has a size.
    fn unclamped_model(&self, screen: Point) -> Point {
        Point::new(self.view.x + screen.x / self.scale, self.view.y + screen.y / self.scale)
    }

    fn recompute_view(&mut self) {
        self.view = Rect {
            x: -self.translation_x,
            y: -self.translation_y,
            width: self.surface_width / self.scale,
            height: self.surface_height / self.scale,
        };
    }
}
