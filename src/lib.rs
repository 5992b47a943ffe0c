//! Freehand drawing and handwriting annotation engine.
//!
//! The engine owns the vector model of hand-drawn strokes, the pan/zoom
//! viewport, pressure-smoothed stroke capture, a whole-stroke eraser, and a
//! render loop that presents an off-screen bitmap on its own thread. The host
//! application wires platform pointer events and a presentation surface into
//! [`engine::Engine`] and persists the [`drawing::Drawing`] it exposes.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level engine and the thread-free [`engine::EngineCore`] |
//! | [`drawing`] | Persistent drawing model: strokes, colors, JSON codec |
//! | [`viewport`] | Screen/model coordinate mapping and pinch-zoom anchoring |
//! | [`input`] | Pointer event types, tools, and gesture state |
//! | [`capture`] | Stroke capture with rolling-average pressure smoothing |
//! | [`eraser`] | Eraser sweep window and whole-stroke hit testing |
//! | [`raster`] | Bitmap cache and frame painting |
//! | [`render_loop`] | Dedicated render thread and presentation surfaces |
//! | [`config`] | Engine tuning loaded from defaults or environment |
//! | [`consts`] | Shared numeric constants (canvas bounds, tolerances, etc.) |

pub mod capture;
pub mod config;
pub mod consts;
pub mod drawing;
pub mod engine;
pub mod eraser;
pub mod input;
pub mod raster;
pub mod render_loop;
pub mod viewport;
