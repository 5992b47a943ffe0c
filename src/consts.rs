//! Shared numeric constants for the drawing engine.

// ── Canvas ──────────────────────────────────────────────────────

/// Width of the drawable page in model units.
pub const CANVAS_WIDTH: u32 = 2125;

/// Height of the drawable page in model units.
pub const CANVAS_HEIGHT: u32 = 2750;

// ── Capture ─────────────────────────────────────────────────────

/// Number of pressure samples folded into the rolling girth average.
pub const PRESSURE_WINDOW: u32 = 5;

/// Pressure-to-width multiplier for the small pen.
pub const PEN_SIZE_SMALL: f32 = 7.0;

/// Pressure-to-width multiplier for the medium pen.
pub const PEN_SIZE_MEDIUM: f32 = 20.0;

/// Pressure-to-width multiplier for the large pen.
pub const PEN_SIZE_LARGE: f32 = 40.0;

// ── Eraser ──────────────────────────────────────────────────────

/// Detour slack, in model units, under which a stroke segment counts as touched.
pub const ERASER_TOLERANCE: f32 = 20.0;

// ── Rendering ───────────────────────────────────────────────────

/// Minimum time between two presented frames, in milliseconds (~60 fps).
pub const FRAME_INTERVAL_MS: u64 = 16;

/// Floor for any configured frame interval, in milliseconds.
pub const MIN_FRAME_INTERVAL_MS: u64 = 1;

// ── Input ───────────────────────────────────────────────────────

/// Pressure assumed for mouse input, which reports none, and for non-finite samples.
pub const MOUSE_PRESSURE: f32 = 0.5;
