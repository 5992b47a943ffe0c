//! Input model: tools, pointer events, and gesture state.
//!
//! `ToolConfig` captures the user's pen settings; it is replaced wholesale by
//! the engine's setters and copied into a stroke when the stroke begins, so a
//! setting change never alters a stroke mid-gesture. `PointerEvent` is the
//! platform-neutral sample the host forwards from its event loop, and
//! `InputState` is the gesture being tracked between pointer-down and
//! pointer-up.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use serde::{Deserialize, Serialize};

use crate::consts::{PEN_SIZE_LARGE, PEN_SIZE_MEDIUM, PEN_SIZE_SMALL};
use crate::drawing::ColorAlias;
use crate::viewport::Point;

/// Which tool the stylus applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    /// Draw strokes (default).
    #[default]
    Pen,
    /// Delete whole strokes touched by the sweep.
    Eraser,
}

/// Discrete pen width tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PenSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl PenSize {
    /// Factor turning a normalized pressure into a stroke width.
    #[must_use]
    pub fn multiplier(self) -> f32 {
        match self {
            Self::Small => PEN_SIZE_SMALL,
            Self::Medium => PEN_SIZE_MEDIUM,
            Self::Large => PEN_SIZE_LARGE,
        }
    }
}

/// Pen settings in effect for the next stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolConfig {
    pub tool: Tool,
    pub color: ColorAlias,
    pub alpha: u8,
    pub pen_size: PenSize,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self { tool: Tool::Pen, color: ColorAlias::Black, alpha: 255, pen_size: PenSize::Medium }
    }
}

/// What produced a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerKind {
    /// Stylus tip.
    Stylus,
    /// Eraser end of a stylus.
    StylusEraser,
    /// Touch contact; always routed to pan/zoom.
    Finger,
    /// Mouse; treated like a stylus at a fixed pressure.
    Mouse,
}

/// Where in a gesture the event falls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Down,
    Move,
    Up,
    Cancel,
}

/// One contact of a pointer event, in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub x: f32,
    pub y: f32,
    /// Normalized pressure, nominally `0.0..=1.0`.
    #[serde(default = "default_pressure")]
    pub pressure: f32,
}

fn default_pressure() -> f32 {
    1.0
}

impl Contact {
    #[must_use]
    pub fn new(x: f32, y: f32, pressure: f32) -> Self {
        Self { x, y, pressure }
    }

    #[must_use]
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// A platform pointer event after the host has normalized it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub phase: Phase,
    pub kind: PointerKind,
    /// Active contacts; the first one is the primary pointer.
    pub pointers: Vec<Contact>,
    /// Stylus side button mapped to erase is held.
    #[serde(default)]
    pub erase_button: bool,
}

impl PointerEvent {
    /// Single-contact event.
    #[must_use]
    pub fn single(phase: Phase, kind: PointerKind, contact: Contact) -> Self {
        Self { phase, kind, pointers: vec![contact], erase_button: false }
    }

    /// The primary contact, if any.
    #[must_use]
    pub fn primary(&self) -> Option<Contact> {
        self.pointers.first().copied()
    }

    /// Whether the event belongs to the pan/zoom path.
    #[must_use]
    pub fn is_navigation(&self) -> bool {
        self.kind == PointerKind::Finger || self.pointers.len() > 1
    }

    /// Centroid of all contacts.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn focus(&self) -> Option<Point> {
        if self.pointers.is_empty() {
            return None;
        }
        let n = self.pointers.len() as f32;
        let (sx, sy) = self.pointers.iter().fold((0.0, 0.0), |(sx, sy), c| (sx + c.x, sy + c.y));
        Some(Point::new(sx / n, sy / n))
    }

    /// Mean distance of the contacts from their centroid; zero for one contact.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn span(&self) -> f32 {
        let Some(focus) = self.focus() else {
            return 0.0;
        };
        if self.pointers.len() < 2 {
            return 0.0;
        }
        let total: f32 = self.pointers.iter().map(|c| c.position().distance(focus)).sum();
        total / self.pointers.len() as f32
    }
}

/// The gesture currently being tracked.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InputState {
    /// No gesture in progress.
    #[default]
    Idle,
    /// A stroke is being drawn.
    Drawing,
    /// An erase sweep is in progress.
    Erasing,
    /// Fingers are panning or pinching the viewport.
    Navigating {
        /// Contact count the anchor was captured with.
        pointers: usize,
        /// Contact spread at the previous event.
        last_span: f32,
    },
}
