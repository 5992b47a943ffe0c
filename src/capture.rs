//! Stroke capture: turns pen samples into stroke points.
//!
//! Each sample's pressure is scaled by the pen-size tier and folded into a
//! rolling average so the line width does not jitter with noisy digitizers.
//! Points are only ever appended; the segment just added is handed back so the
//! caller can draw it straight into the bitmap cache instead of repainting.

#[cfg(test)]
#[path = "capture_test.rs"]
mod capture_test;

use crate::consts::{MOUSE_PRESSURE, PRESSURE_WINDOW};
use crate::drawing::{ColorAlias, Drawing, Stroke, round2};
use crate::input::ToolConfig;
use crate::viewport::Point;

/// A piece of stroke geometry to paint incrementally.
///
/// `from == to` for the first sample of a stroke, which paints as a dot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub from: Point,
    pub to: Point,
    pub girth: f32,
    pub color: ColorAlias,
    pub alpha: u8,
}

#[derive(Debug, Clone, Copy)]
struct ActiveStroke {
    index: usize,
    last_point: Point,
    avg_girth: f32,
    multiplier: f32,
    color: ColorAlias,
    alpha: u8,
}

/// Builds strokes from pen samples.
#[derive(Debug, Clone)]
pub struct StrokeCapture {
    window: f32,
    active: Option<ActiveStroke>,
}

impl Default for StrokeCapture {
    fn default() -> Self {
        Self::new(PRESSURE_WINDOW)
    }
}

impl StrokeCapture {
    /// Capture with a rolling average over `window` samples (0 means 1).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn new(window: u32) -> Self {
        Self { window: window.max(1) as f32, active: None }
    }

    /// Start a new stroke at `point`, appended on top of the drawing.
    ///
    /// Color, alpha, and pen size are taken from `config` now and stay fixed
    /// for the rest of the stroke.
    pub fn begin_stroke(&mut self, drawing: &mut Drawing, point: Point, pressure: f32, config: &ToolConfig) -> Segment {
        let multiplier = config.pen_size.multiplier();
        let girth = pressure_width(pressure, multiplier);

        drawing.strokes.push(Stroke::new(point, girth, config.color, config.alpha));
        let index = drawing.strokes.len() - 1;

        self.active = Some(ActiveStroke {
            index,
            last_point: point,
            avg_girth: girth,
            multiplier,
            color: config.color,
            alpha: config.alpha,
        });
        tracing::trace!(index, x = point.x, y = point.y, girth, "stroke began");

        Segment { from: point, to: point, girth, color: config.color, alpha: config.alpha }
    }

    /// Append a sample to the active stroke.
    ///
    /// Returns `None` when no stroke is active or the active stroke has been
    /// removed from the drawing underneath the capture.
    pub fn extend_stroke(&mut self, drawing: &mut Drawing, point: Point, pressure: f32) -> Option<Segment> {
        let index = self.active?.index;
        let Some(stroke) = drawing.strokes.get_mut(index) else {
            self.active = None;
            return None;
        };
        let active = self.active.as_mut()?;

        let girth = pressure_width(pressure, active.multiplier);
        active.avg_girth = active.avg_girth - active.avg_girth / self.window + girth / self.window;
        stroke.push(point, active.avg_girth);

        let segment = Segment {
            from: active.last_point,
            to: point,
            girth: active.avg_girth,
            color: active.color,
            alpha: active.alpha,
        };
        active.last_point = point;
        tracing::trace!(index = active.index, x = point.x, y = point.y, girth = active.avg_girth, "stroke extended");
        Some(segment)
    }

    /// Finish the active stroke, returning its index.
    pub fn end_stroke(&mut self) -> Option<usize> {
        self.active.take().map(|active| active.index)
    }

    /// Index of the stroke being captured, if any.
    #[must_use]
    pub fn active_index(&self) -> Option<usize> {
        self.active.map(|active| active.index)
    }
}

/// Stroke width for a pressure sample, rounded to two decimals.
///
/// Negative pressure counts as zero; a non-finite sample is replaced by
/// [`MOUSE_PRESSURE`] so a glitching digitizer never yields a NaN girth.
#[must_use]
pub fn pressure_width(pressure: f32, multiplier: f32) -> f32 {
    let pressure = if pressure.is_finite() { pressure.max(0.0) } else { MOUSE_PRESSURE };
    round2(pressure * multiplier)
}
