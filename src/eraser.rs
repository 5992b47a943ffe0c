//! Eraser: whole-stroke deletion along an eraser sweep.
//!
//! The eraser keeps the two most recent sweep points as a line segment and
//! tests it against every segment of every stroke. The test is a detour
//! check rather than exact segment intersection: a point lies near a segment
//! when going through it barely lengthens the trip between the segment's
//! endpoints. Checking both eraser points against the stroke segment and both
//! stroke points against the eraser segment catches crossings and near
//! misses alike.
//!
//! Cost is O(strokes × points) per sample, which is fine for a user-paced
//! gesture and never runs per frame.

#[cfg(test)]
#[path = "eraser_test.rs"]
mod eraser_test;

use crate::consts::ERASER_TOLERANCE;
use crate::drawing::{Drawing, Stroke};
use crate::viewport::Point;

/// Sliding two-point window over the eraser path.
#[derive(Debug, Clone)]
pub struct Eraser {
    previous: Option<Point>,
    current: Option<Point>,
    tolerance: f32,
}

impl Default for Eraser {
    fn default() -> Self {
        Self::new(ERASER_TOLERANCE)
    }
}

impl Eraser {
    #[must_use]
    pub fn new(tolerance: f32) -> Self {
        Self { previous: None, current: None, tolerance }
    }

    /// Forget the sweep; the next two samples rebuild the window.
    pub fn reset(&mut self) {
        self.previous = None;
        self.current = None;
    }

    /// The current sweep segment, once two samples have arrived.
    #[must_use]
    pub fn window(&self) -> Option<(Point, Point)> {
        Some((self.previous?, self.current?))
    }

    #[must_use]
    pub fn tolerance(&self) -> f32 {
        self.tolerance
    }

    /// Feed one sweep sample and delete every stroke it touches.
    ///
    /// Returns the removed strokes' indices as they were before removal, in
    /// ascending order. The first sample after a reset only primes the window.
    pub fn erase_at(&mut self, drawing: &mut Drawing, point: Point) -> Vec<usize> {
        match (self.previous, self.current) {
            (None, _) => {
                self.previous = Some(point);
                return Vec::new();
            }
            (Some(_), None) => self.current = Some(point),
            (Some(_), Some(current)) => {
                self.previous = Some(current);
                self.current = Some(point);
            }
        }

        let Some((e1, e2)) = self.window() else {
            return Vec::new();
        };

        let hits: Vec<usize> = drawing
            .strokes
            .iter()
            .enumerate()
            .filter(|(_, stroke)| stroke_touches(stroke, e1, e2, self.tolerance))
            .map(|(index, _)| index)
            .collect();

        if !hits.is_empty() {
            let mut index = 0;
            drawing.strokes.retain(|_| {
                let keep = hits.binary_search(&index).is_err();
                index += 1;
                keep
            });
            tracing::debug!(removed = hits.len(), remaining = drawing.strokes.len(), "strokes erased");
        }
        hits
    }
}

/// Whether any segment of `stroke` passes near the sweep `e1 → e2`.
///
/// Single-point strokes have no segment and are never touched.
#[must_use]
pub fn stroke_touches(stroke: &Stroke, e1: Point, e2: Point, tolerance: f32) -> bool {
    stroke
        .segments()
        .any(|(p1, p2, _)| segments_touch(p1, p2, e1, e2, tolerance))
}

/// Approximate proximity test between stroke segment `p1 → p2` and sweep
/// segment `e1 → e2`.
#[must_use]
pub fn segments_touch(p1: Point, p2: Point, e1: Point, e2: Point, tolerance: f32) -> bool {
    let stroke_len = p1.distance(p2);
    let sweep_len = e1.distance(e2);

    let via_e1 = p1.distance(e1) + e1.distance(p2);
    let via_e2 = p1.distance(e2) + e2.distance(p2);
    let via_p1 = e1.distance(p1) + p1.distance(e2);
    let via_p2 = e1.distance(p2) + p2.distance(e2);

    via_e1 - stroke_len < tolerance
        || via_e2 - stroke_len < tolerance
        || via_p1 - sweep_len < tolerance
        || via_p2 - sweep_len < tolerance
}
