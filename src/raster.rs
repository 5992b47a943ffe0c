//! Rasterization: the bitmap cache and frame painting.
//!
//! This module is the only place that touches [`tiny_skia`]. The bitmap cache
//! is a model-space pixmap the size of the page; capture paints single
//! segments into it as they arrive, the eraser triggers a full repaint, and
//! the render thread composites it onto the surface with the current
//! transform.
//!
//! The cache and the transform it is painted with travel together in a
//! [`Scene`] so one lock acquisition always yields a consistent frame.

#[cfg(test)]
#[path = "raster_test.rs"]
mod raster_test;

use tiny_skia::{
    Color, FillRule, FilterQuality, LineCap, LineJoin, Paint, PathBuilder, Pixmap, PixmapPaint, Rect, Stroke,
    Transform,
};

use crate::capture::Segment;
use crate::drawing::{Drawing, Rgb};

/// Girth floor for dots so a zero-pressure tap still leaves a mark.
const MIN_DOT_RADIUS: f32 = 0.5;

/// Errors produced while allocating raster buffers.
#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    /// The pixmap could not be allocated (zero or oversized dimensions).
    #[error("cannot allocate a {width}x{height} bitmap")]
    Allocation { width: u32, height: u32 },
}

/// Bitmap cache plus the transform the render thread paints it with.
pub struct Scene {
    bitmap: Pixmap,
    scale: f32,
    translation_x: f32,
    translation_y: f32,
    background: Rgb,
    backdrop: Rgb,
    version: u64,
}

impl Scene {
    /// Allocate a transparent cache covering a `width` × `height` page.
    ///
    /// # Errors
    ///
    /// Returns [`RasterError::Allocation`] if the pixmap cannot be created.
    pub fn new(width: u32, height: u32, background: Rgb, backdrop: Rgb) -> Result<Self, RasterError> {
        let bitmap = Pixmap::new(width, height).ok_or(RasterError::Allocation { width, height })?;
        Ok(Self {
            bitmap,
            scale: 1.0,
            translation_x: 0.0,
            translation_y: 0.0,
            background,
            backdrop,
            version: 0,
        })
    }

    /// Replace the cache with a fresh transparent one of the same size.
    ///
    /// # Errors
    ///
    /// Returns [`RasterError::Allocation`] if the pixmap cannot be created.
    pub fn reallocate(&mut self) -> Result<(), RasterError> {
        let (width, height) = (self.bitmap.width(), self.bitmap.height());
        self.bitmap = Pixmap::new(width, height).ok_or(RasterError::Allocation { width, height })?;
        self.bump();
        Ok(())
    }

    /// Update the painting transform.
    pub fn set_transform(&mut self, scale: f32, translation_x: f32, translation_y: f32) {
        self.scale = scale;
        self.translation_x = translation_x;
        self.translation_y = translation_y;
        self.bump();
    }

    #[must_use]
    pub fn transform(&self) -> (f32, f32, f32) {
        (self.scale, self.translation_x, self.translation_y)
    }

    /// The cached page raster.
    #[must_use]
    pub fn bitmap(&self) -> &Pixmap {
        &self.bitmap
    }

    /// Monotonic counter bumped on every change.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Paint one captured segment into the cache.
    pub fn draw_segment(&mut self, segment: &Segment, rgb: Rgb) {
        let paint = stroke_paint(rgb, segment.alpha);
        if segment.from == segment.to {
            fill_dot(&mut self.bitmap, segment, &paint);
        } else {
            stroke_line(&mut self.bitmap, segment, &paint);
        }
        self.bump();
    }

    /// Clear the cache and paint every stroke of `drawing` again.
    pub fn repaint(&mut self, drawing: &Drawing) {
        self.bitmap.fill(Color::TRANSPARENT);
        for stroke in &drawing.strokes {
            let rgb = drawing.rgb(stroke.color);
            let paint = stroke_paint(rgb, stroke.alpha);
            if stroke.len() < 2 {
                if let (Some(point), Some(girth)) = (stroke.point(0), stroke.points_girth.first()) {
                    let dot = Segment { from: point, to: point, girth: *girth, color: stroke.color, alpha: stroke.alpha };
                    fill_dot(&mut self.bitmap, &dot, &paint);
                }
                continue;
            }
            for (from, to, girth) in stroke.segments() {
                let segment = Segment { from, to, girth, color: stroke.color, alpha: stroke.alpha };
                stroke_line(&mut self.bitmap, &segment, &paint);
            }
        }
        self.bump();
    }

    /// Composite the scene onto a surface buffer: backdrop, then the page
    /// background and the cache under scale-then-translate.
    pub fn paint_frame(&self, target: &mut Pixmap) {
        target.fill(color(self.backdrop, u8::MAX));

        let transform = Transform::from_scale(self.scale, self.scale).pre_translate(self.translation_x, self.translation_y);

        #[allow(clippy::cast_precision_loss)]
        let page = Rect::from_xywh(0.0, 0.0, self.bitmap.width() as f32, self.bitmap.height() as f32);
        if let Some(page) = page {
            let mut paint = Paint::default();
            paint.set_color(color(self.background, u8::MAX));
            target.fill_rect(page, &paint, transform, None);
        }

        let pixmap_paint = PixmapPaint { quality: FilterQuality::Bilinear, ..PixmapPaint::default() };
        target.draw_pixmap(0, 0, self.bitmap.as_ref(), &pixmap_paint, transform, None);
    }

    fn bump(&mut self) {
        self.version = self.version.wrapping_add(1);
    }
}

fn color(rgb: Rgb, alpha: u8) -> Color {
    Color::from_rgba8(rgb.r, rgb.g, rgb.b, alpha)
}

fn stroke_paint(rgb: Rgb, alpha: u8) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(color(rgb, alpha));
    paint.anti_alias = true;
    paint
}

fn fill_dot(bitmap: &mut Pixmap, segment: &Segment, paint: &Paint<'_>) {
    if !segment.girth.is_finite() {
        return;
    }
    let radius = (segment.girth / 2.0).max(MIN_DOT_RADIUS);
    if let Some(path) = PathBuilder::from_circle(segment.to.x, segment.to.y, radius) {
        bitmap.fill_path(&path, paint, FillRule::Winding, Transform::identity(), None);
    }
}

// tiny-skia asserts on a negative or NaN stroke width.
fn stroke_line(bitmap: &mut Pixmap, segment: &Segment, paint: &Paint<'_>) {
    if !segment.girth.is_finite() || segment.girth < 0.0 {
        return;
    }
    let mut builder = PathBuilder::new();
    builder.move_to(segment.from.x, segment.from.y);
    builder.line_to(segment.to.x, segment.to.y);
    let Some(path) = builder.finish() else {
        return;
    };
    let stroke = Stroke {
        width: segment.girth,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };
    bitmap.stroke_path(&path, paint, &stroke, Transform::identity(), None);
}
