//! Drawing model: strokes, colors, and the persisted document shape.
//!
//! A [`Drawing`] is the whole vector state of one handwritten page: the
//! viewport transform the user left it at, the strokes in paint order, and an
//! optional per-document palette. Strokes are stored as parallel coordinate
//! and girth arrays so the persisted JSON stays compact.
//!
//! Data flows into this layer from the host (JSON the document store handed
//! over) and from the capture and eraser paths. The raster layer reads from it
//! whenever the bitmap cache is rebuilt.

#[cfg(test)]
#[path = "drawing_test.rs"]
mod drawing_test;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::viewport::Point;

/// Round a model-space value to two decimal digits.
#[must_use]
pub fn round2(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}

/// Errors produced while loading a persisted drawing.
#[derive(Debug, thiserror::Error)]
pub enum DrawingError {
    /// The document is not valid drawing JSON.
    #[error("could not load drawing: {0}")]
    Parse(#[from] serde_json::Error),

    /// The stored scale is zero, negative, or not a number.
    #[error("could not load drawing: invalid scale {0}")]
    InvalidScale(f32),

    /// The stored translation is not finite.
    #[error("could not load drawing: invalid translation ({x}, {y})")]
    InvalidTranslation { x: f32, y: f32 },

    /// A stroke carries no points at all.
    #[error("could not load drawing: stroke {index} has no points")]
    EmptyStroke { index: usize },

    /// A stroke point has a negative or non-finite girth.
    #[error("could not load drawing: stroke {index} point {point} has invalid girth {girth}")]
    InvalidGirth { index: usize, point: usize, girth: f32 },

    /// A stroke's parallel point arrays disagree in length.
    #[error("could not load drawing: stroke {index} has {xs} x, {ys} y and {girths} girth values")]
    MismatchedPoints { index: usize, xs: usize, ys: usize, girths: usize },
}

/// Named stroke colors. The concrete RGB is resolved through the drawing's
/// theme, falling back to [`ColorAlias::default_rgb`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum ColorAlias {
    #[default]
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
}

impl ColorAlias {
    /// Built-in palette entry for this alias.
    #[must_use]
    pub fn default_rgb(self) -> Rgb {
        match self {
            Self::Black => Rgb::new(0x00, 0x00, 0x00),
            Self::Red => Rgb::new(0xD9, 0x4B, 0x4B),
            Self::Green => Rgb::new(0x3C, 0x9A, 0x5F),
            Self::Yellow => Rgb::new(0xE8, 0xC5, 0x47),
            Self::Blue => Rgb::new(0x3A, 0x6E, 0xD8),
            Self::Magenta => Rgb::new(0xC2, 0x4B, 0xC9),
            Self::Cyan => Rgb::new(0x3F, 0xB8, 0xC9),
            Self::White => Rgb::new(0xFF, 0xFF, 0xFF),
        }
    }
}

/// An opaque 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// One continuous pen-down-to-pen-up gesture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    /// X coordinates in model space.
    pub points_x: Vec<f32>,
    /// Y coordinates in model space.
    pub points_y: Vec<f32>,
    /// Painted width at each point, derived from pen pressure.
    pub points_girth: Vec<f32>,
    /// Palette entry the stroke is painted with.
    pub color: ColorAlias,
    /// Opacity, 0 (transparent) to 255 (opaque).
    pub alpha: u8,
}

impl Stroke {
    /// Create a stroke holding a single point.
    #[must_use]
    pub fn new(start: Point, girth: f32, color: ColorAlias, alpha: u8) -> Self {
        Self {
            points_x: vec![start.x],
            points_y: vec![start.y],
            points_girth: vec![girth],
            color,
            alpha,
        }
    }

    /// Append a point.
    ///
    /// # Panics
    ///
    /// Panics if the parallel arrays already disagree in length.
    pub fn push(&mut self, point: Point, girth: f32) {
        assert!(self.in_step(), "stroke point arrays out of step");
        self.points_x.push(point.x);
        self.points_y.push(point.y);
        self.points_girth.push(girth);
    }

    /// Number of points in the stroke.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points_x.len()
    }

    /// Returns `true` if the stroke has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points_x.is_empty()
    }

    /// The point at `index`, if present.
    #[must_use]
    pub fn point(&self, index: usize) -> Option<Point> {
        let x = *self.points_x.get(index)?;
        let y = *self.points_y.get(index)?;
        Some(Point::new(x, y))
    }

    /// Consecutive point pairs with the girth of the trailing point.
    ///
    /// A single-point stroke yields nothing.
    ///
    /// # Panics
    ///
    /// Panics if the parallel arrays disagree in length. Validated and
    /// captured strokes always agree.
    pub fn segments(&self) -> impl Iterator<Item = (Point, Point, f32)> + '_ {
        assert!(self.in_step(), "stroke point arrays out of step");
        (1..self.len()).map(move |i| {
            let from = Point::new(self.points_x[i - 1], self.points_y[i - 1]);
            let to = Point::new(self.points_x[i], self.points_y[i]);
            (from, to, self.points_girth[i])
        })
    }

    fn in_step(&self) -> bool {
        self.points_x.len() == self.points_y.len() && self.points_y.len() == self.points_girth.len()
    }

    fn check(&self, index: usize) -> Result<(), DrawingError> {
        let (xs, ys, girths) = (self.points_x.len(), self.points_y.len(), self.points_girth.len());
        if xs != ys || ys != girths {
            return Err(DrawingError::MismatchedPoints { index, xs, ys, girths });
        }
        if xs == 0 {
            return Err(DrawingError::EmptyStroke { index });
        }
        if let Some((point, &girth)) =
            self.points_girth.iter().enumerate().find(|(_, girth)| !girth.is_finite() || **girth < 0.0)
        {
            return Err(DrawingError::InvalidGirth { index, point, girth });
        }
        Ok(())
    }
}

/// The whole-document vector state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Drawing {
    /// Zoom factor the page was last viewed at.
    pub scale: f32,
    /// Model-space horizontal pan offset.
    pub translation_x: f32,
    /// Model-space vertical pan offset.
    pub translation_y: f32,
    /// Strokes in paint order; later strokes cover earlier ones.
    pub strokes: Vec<Stroke>,
    /// Per-document palette overrides.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<BTreeMap<ColorAlias, Rgb>>,
}

impl Default for Drawing {
    fn default() -> Self {
        Self {
            scale: 1.0,
            translation_x: 0.0,
            translation_y: 0.0,
            strokes: Vec::new(),
            theme: None,
        }
    }
}

impl Drawing {
    /// Create an empty drawing at identity zoom.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a persisted drawing.
    ///
    /// # Errors
    ///
    /// Returns [`DrawingError`] if the JSON is malformed or describes an
    /// impossible drawing (bad transform, empty or ragged strokes, bad girths).
    pub fn from_json(json: &str) -> Result<Self, DrawingError> {
        let drawing: Self = serde_json::from_str(json)?;
        drawing.validate()?;
        Ok(drawing)
    }

    /// Serialize for the document store.
    ///
    /// # Errors
    ///
    /// Returns [`DrawingError::Parse`] if serialization fails.
    pub fn to_json(&self) -> Result<String, DrawingError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Check the structural invariants of a drawing from an untrusted source.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), DrawingError> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(DrawingError::InvalidScale(self.scale));
        }
        if !self.translation_x.is_finite() || !self.translation_y.is_finite() {
            return Err(DrawingError::InvalidTranslation { x: self.translation_x, y: self.translation_y });
        }
        for (index, stroke) in self.strokes.iter().enumerate() {
            stroke.check(index)?;
        }
        Ok(())
    }

    /// Resolve a color alias through the theme, then the built-in palette.
    #[must_use]
    pub fn rgb(&self, alias: ColorAlias) -> Rgb {
        self.theme
            .as_ref()
            .and_then(|theme| theme.get(&alias).copied())
            .unwrap_or_else(|| alias.default_rgb())
    }

    /// Total number of points across all strokes.
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.strokes.iter().map(Stroke::len).sum()
    }
}
