//! Engine tuning, with defaults overridable from the environment.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::time::Duration;

use crate::consts::{CANVAS_HEIGHT, CANVAS_WIDTH, ERASER_TOLERANCE, FRAME_INTERVAL_MS, PRESSURE_WINDOW};
use crate::drawing::Rgb;

/// Page color painted under the strokes.
pub const DEFAULT_BACKGROUND: Rgb = Rgb::new(0xFF, 0xFF, 0xFF);

/// Color painted outside the page.
pub const DEFAULT_BACKDROP: Rgb = Rgb::new(0xE6, 0xE4, 0xE0);

/// Settings fixed for the lifetime of an engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Page width in model units; also the bitmap cache width in pixels.
    pub canvas_width: u32,
    /// Page height in model units; also the bitmap cache height in pixels.
    pub canvas_height: u32,
    /// Minimum time between presented frames.
    pub frame_interval: Duration,
    /// Eraser detour slack in model units.
    pub eraser_tolerance: f32,
    /// Samples in the rolling pressure average.
    pub pressure_window: u32,
    pub background: Rgb,
    pub backdrop: Rgb,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            canvas_width: CANVAS_WIDTH,
            canvas_height: CANVAS_HEIGHT,
            frame_interval: Duration::from_millis(FRAME_INTERVAL_MS),
            eraser_tolerance: ERASER_TOLERANCE,
            pressure_window: PRESSURE_WINDOW,
            background: DEFAULT_BACKGROUND,
            backdrop: DEFAULT_BACKDROP,
        }
    }
}

impl EngineConfig {
    /// Build config from environment variables, falling back to defaults.
    ///
    /// Optional:
    /// - `INKPAD_CANVAS_WIDTH`: default 2125
    /// - `INKPAD_CANVAS_HEIGHT`: default 2750
    /// - `INKPAD_FRAME_INTERVAL_MS`: default 16
    /// - `INKPAD_ERASER_TOLERANCE`: default 20
    /// - `INKPAD_PRESSURE_WINDOW`: default 5
    ///
    /// Zero sizes, intervals and windows fall back to the defaults, as do
    /// non-positive tolerances. A zero interval would spin the render thread.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let eraser_tolerance = env_parse("INKPAD_ERASER_TOLERANCE", defaults.eraser_tolerance);
        Self {
            canvas_width: non_zero(env_parse("INKPAD_CANVAS_WIDTH", defaults.canvas_width), CANVAS_WIDTH),
            canvas_height: non_zero(env_parse("INKPAD_CANVAS_HEIGHT", defaults.canvas_height), CANVAS_HEIGHT),
            frame_interval: Duration::from_millis(non_zero(
                env_parse("INKPAD_FRAME_INTERVAL_MS", FRAME_INTERVAL_MS),
                FRAME_INTERVAL_MS,
            )),
            eraser_tolerance: if eraser_tolerance.is_finite() && eraser_tolerance > 0.0 {
                eraser_tolerance
            } else {
                ERASER_TOLERANCE
            },
            pressure_window: non_zero(env_parse("INKPAD_PRESSURE_WINDOW", defaults.pressure_window), PRESSURE_WINDOW),
            ..defaults
        }
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}

fn non_zero<T: Default + PartialEq>(value: T, default: T) -> T {
    if value == T::default() { default } else { value }
}
