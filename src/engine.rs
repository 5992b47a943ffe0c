use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info, warn};

use crate::capture::{Segment, StrokeCapture};
use crate::config::EngineConfig;
use crate::consts::MOUSE_PRESSURE;
use crate::drawing::{ColorAlias, Drawing, DrawingError};
use crate::eraser::Eraser;
use crate::input::{Contact, InputState, PenSize, Phase, PointerEvent, PointerKind, Tool, ToolConfig};
use crate::raster::{RasterError, Scene};
use crate::render_loop::{RenderLoop, RenderLoopError, Surface};
use crate::viewport::{Point, Viewport};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Errors surfaced by the engine's lifecycle calls.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Drawing(#[from] DrawingError),
    #[error(transparent)]
    Raster(#[from] RasterError),
    #[error(transparent)]
    RenderLoop(#[from] RenderLoopError),
}

/// Notifications returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    StrokeBegan { index: usize },
    StrokeExtended { index: usize, points: usize },
    StrokeEnded { index: usize },
    StrokesErased { removed: Vec<usize> },
    ViewportChanged { scale: f32, translation_x: f32, translation_y: f32 },
    ViewportSettled { scale: f32, translation_x: f32, translation_y: f32 },
}

impl Action {
    /// Whether the drawing reached a state worth persisting.
    #[must_use]
    pub fn is_content_change(&self) -> bool {
        matches!(self, Self::StrokeEnded { .. } | Self::StrokesErased { .. } | Self::ViewportSettled { .. })
    }
}

/// Core engine state: everything that runs on the input thread.
///
/// Separated from `Engine` so it can be tested without a render thread.
pub struct EngineCore {
    drawing: Drawing,
    viewport: Viewport,
    capture: StrokeCapture,
    eraser: Eraser,
    input: InputState,
    tools: ToolConfig,
    touchable: bool,
    scene: Arc<Mutex<Scene>>,
    config: EngineConfig,
}

impl EngineCore {
    /// Create a core holding an empty drawing.
    ///
    /// # Errors
    ///
    /// Returns [`RasterError`] if the bitmap cache cannot be allocated.
    #[allow(clippy::cast_precision_loss)]
    pub fn new(config: EngineConfig) -> Result<Self, RasterError> {
        let scene = Scene::new(config.canvas_width, config.canvas_height, config.background, config.backdrop)?;
        Ok(Self {
            drawing: Drawing::new(),
            viewport: Viewport::new(config.canvas_width as f32, config.canvas_height as f32),
            capture: StrokeCapture::new(config.pressure_window),
            eraser: Eraser::new(config.eraser_tolerance),
            input: InputState::Idle,
            tools: ToolConfig::default(),
            touchable: true,
            scene: Arc::new(Mutex::new(scene)),
            config,
        })
    }

    // --- Data inputs ---

    /// Seed the model (empty when `None`) and repaint the cache from it.
    ///
    /// # Errors
    ///
    /// Returns the [`DrawingError`] when `drawing` breaks a structural
    /// invariant; the core falls back to an empty drawing and stays usable.
    pub fn load(&mut self, drawing: Option<Drawing>) -> Result<(), DrawingError> {
        let (drawing, invalid) = match drawing.map(|drawing| drawing.validate().map(|()| drawing)) {
            None => (Drawing::new(), None),
            Some(Ok(drawing)) => (drawing, None),
            Some(Err(e)) => {
                warn!(error = %e, "falling back to an empty drawing");
                (Drawing::new(), Some(e))
            }
        };
        self.install(drawing);
        match invalid {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn install(&mut self, drawing: Drawing) {
        self.drawing = drawing;
        self.viewport
            .set_transform(self.drawing.scale, self.drawing.translation_x, self.drawing.translation_y);
        self.capture.end_stroke();
        self.eraser.reset();
        self.input = InputState::Idle;

        let (scale, (tx, ty)) = (self.viewport.scale(), self.viewport.translation());
        let drawing = &self.drawing;
        self.with_scene(|scene| {
            scene.set_transform(scale, tx, ty);
            scene.repaint(drawing);
        });
        info!(strokes = self.drawing.strokes.len(), points = self.drawing.point_count(), "drawing loaded");
    }

    /// Load persisted JSON, falling back to an empty drawing when it is bad.
    ///
    /// # Errors
    ///
    /// Returns the [`DrawingError`] that forced the fallback; the core is
    /// usable either way.
    pub fn load_json(&mut self, json: &str) -> Result<(), DrawingError> {
        match Drawing::from_json(json) {
            Ok(drawing) => {
                self.install(drawing);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "falling back to an empty drawing");
                self.install(Drawing::new());
                Err(e)
            }
        }
    }

    /// Resize the viewport for a new surface size and rebuild the cache.
    ///
    /// # Errors
    ///
    /// Returns [`RasterError`] if the cache cannot be reallocated.
    #[allow(clippy::cast_precision_loss)]
    pub fn set_surface_size(&mut self, width: u32, height: u32) -> Result<(), RasterError> {
        self.viewport.set_surface_size(width as f32, height as f32);
        let drawing = &self.drawing;
        self.with_scene(|scene| {
            scene.reallocate()?;
            scene.repaint(drawing);
            Ok(())
        })
    }

    // --- Tool configuration ---

    /// Switch tools. An in-progress stroke ends.
    pub fn set_tool(&mut self, tool: Tool) {
        if tool != self.tools.tool {
            self.capture.end_stroke();
            self.input = InputState::Idle;
        }
        self.tools = ToolConfig { tool, ..self.tools };
    }

    pub fn set_color(&mut self, color: ColorAlias) {
        self.tools = ToolConfig { color, ..self.tools };
    }

    pub fn set_alpha(&mut self, alpha: u8) {
        self.tools = ToolConfig { alpha, ..self.tools };
    }

    pub fn set_pen_size(&mut self, pen_size: PenSize) {
        self.tools = ToolConfig { pen_size, ..self.tools };
    }

    /// Enable or disable input handling (read-only preview when `false`).
    pub fn set_touchable(&mut self, touchable: bool) {
        self.touchable = touchable;
    }

    // --- Model operations (model-space coordinates) ---

    /// Start a stroke with the current tool configuration.
    pub fn begin_stroke(&mut self, point: Point, pressure: f32) -> Action {
        let tools = self.tools;
        let segment = self.capture.begin_stroke(&mut self.drawing, point, pressure, &tools);
        self.paint_segment(&segment);
        self.input = InputState::Drawing;
        Action::StrokeBegan { index: self.drawing.strokes.len() - 1 }
    }

    /// Extend the active stroke; `None` when no stroke is active.
    pub fn extend_stroke(&mut self, point: Point, pressure: f32) -> Option<Action> {
        let segment = self.capture.extend_stroke(&mut self.drawing, point, pressure)?;
        self.paint_segment(&segment);
        let index = self.capture.active_index()?;
        let points = self.drawing.strokes.get(index).map_or(0, |stroke| stroke.len());
        Some(Action::StrokeExtended { index, points })
    }

    /// Finish the active stroke.
    pub fn end_stroke(&mut self) -> Option<Action> {
        let index = self.capture.end_stroke()?;
        self.input = InputState::Idle;
        Some(Action::StrokeEnded { index })
    }

    /// Feed one eraser sample; repaints the cache when strokes were removed.
    ///
    /// A stroke still being captured is ended first, since removal shifts
    /// stroke indices under it.
    pub fn erase_at(&mut self, point: Point) -> Vec<Action> {
        let mut actions: Vec<Action> = self.end_stroke().into_iter().collect();
        let removed = self.eraser.erase_at(&mut self.drawing, point);
        if !removed.is_empty() {
            let drawing = &self.drawing;
            self.with_scene(|scene| scene.repaint(drawing));
            actions.push(Action::StrokesErased { removed });
        }
        actions
    }

    /// Restart the eraser window.
    pub fn reset_eraser(&mut self) {
        self.eraser.reset();
    }

    /// One-shot zoom by `factor` about a surface point.
    pub fn apply_zoom(&mut self, focus: Point, factor: f32) -> Option<Action> {
        if !self.viewport.apply_zoom(focus, factor) {
            return None;
        }
        Some(self.publish_transform(false))
    }

    /// Map a surface point into model space.
    #[must_use]
    pub fn screen_to_model(&self, screen: Point) -> Point {
        self.viewport.screen_to_model(screen)
    }

    // --- Input pipeline ---

    /// Route one pointer event to navigation, erasing, or drawing.
    pub fn handle_event(&mut self, event: &PointerEvent) -> Vec<Action> {
        if !self.touchable {
            return Vec::new();
        }
        if event.is_navigation() {
            return self.navigate(event);
        }

        let mut actions = Vec::new();
        if let InputState::Navigating { .. } = self.input {
            if let Some(action) = self.finish_navigation() {
                actions.push(action);
            }
        }

        let Some(contact) = event.primary() else {
            return actions;
        };
        let erasing =
            self.tools.tool == Tool::Eraser || event.erase_button || event.kind == PointerKind::StylusEraser;
        if erasing {
            self.erase_event(event.phase, contact, &mut actions);
        } else {
            self.draw_event(event.phase, event.kind, contact, &mut actions);
        }
        actions
    }

    fn draw_event(&mut self, phase: Phase, kind: PointerKind, contact: Contact, actions: &mut Vec<Action>) {
        if self.input == InputState::Erasing {
            self.input = InputState::Idle;
        }
        let point = self.viewport.screen_to_model(contact.position());
        let pressure = if kind == PointerKind::Mouse { MOUSE_PRESSURE } else { contact.pressure };

        match phase {
            Phase::Down => {
                actions.extend(self.end_stroke());
                actions.push(self.begin_stroke(point, pressure));
            }
            Phase::Move => match self.extend_stroke(point, pressure) {
                Some(action) => actions.push(action),
                None => actions.push(self.begin_stroke(point, pressure)),
            },
            Phase::Up | Phase::Cancel => actions.extend(self.end_stroke()),
        }
    }

    fn erase_event(&mut self, phase: Phase, contact: Contact, actions: &mut Vec<Action>) {
        if phase == Phase::Down || self.input != InputState::Erasing {
            actions.extend(self.end_stroke());
            self.eraser.reset();
            self.input = InputState::Erasing;
        }
        match phase {
            Phase::Down | Phase::Move => {
                let point = self.viewport.screen_to_model(contact.position());
                actions.extend(self.erase_at(point));
            }
            Phase::Up | Phase::Cancel => self.input = InputState::Idle,
        }
    }

    fn navigate(&mut self, event: &PointerEvent) -> Vec<Action> {
        let mut actions = Vec::new();
        if matches!(event.phase, Phase::Up | Phase::Cancel) {
            actions.extend(self.finish_navigation());
            return actions;
        }
        let Some(focus) = event.focus() else {
            return actions;
        };
        let span = event.span();
        let pointers = event.pointers.len();

        match (event.phase, self.input) {
            (Phase::Move, InputState::Navigating { pointers: anchored, last_span }) if anchored == pointers => {
                let factor = if last_span > 0.0 && span > 0.0 { span / last_span } else { 1.0 };
                if self.viewport.update_zoom(focus, factor) {
                    actions.push(self.publish_transform(false));
                }
                self.input = InputState::Navigating { pointers, last_span: span };
            }
            _ => {
                actions.extend(self.end_stroke());
                self.viewport.begin_zoom(focus);
                self.input = InputState::Navigating { pointers, last_span: span };
                debug!(pointers, focus_x = focus.x, focus_y = focus.y, "navigation anchored");
            }
        }
        actions
    }

    fn finish_navigation(&mut self) -> Option<Action> {
        let InputState::Navigating { .. } = self.input else {
            return None;
        };
        self.viewport.end_zoom();
        self.input = InputState::Idle;
        Some(self.publish_transform(true))
    }

    fn publish_transform(&mut self, settled: bool) -> Action {
        let scale = self.viewport.scale();
        let (translation_x, translation_y) = self.viewport.translation();
        self.drawing.scale = scale;
        self.drawing.translation_x = translation_x;
        self.drawing.translation_y = translation_y;
        self.with_scene(|scene| scene.set_transform(scale, translation_x, translation_y));
        if settled {
            debug!(scale, translation_x, translation_y, "viewport settled");
            Action::ViewportSettled { scale, translation_x, translation_y }
        } else {
            Action::ViewportChanged { scale, translation_x, translation_y }
        }
    }

    fn paint_segment(&self, segment: &Segment) {
        let rgb = self.drawing.rgb(segment.color);
        self.with_scene(|scene| scene.draw_segment(segment, rgb));
    }

    fn with_scene<R>(&self, f: impl FnOnce(&mut Scene) -> R) -> R {
        let mut scene = self.scene.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut scene)
    }

    // --- Queries ---

    /// The current drawing, for the host to persist.
    #[must_use]
    pub fn drawing(&self) -> &Drawing {
        &self.drawing
    }

    /// Serialize the current drawing.
    ///
    /// # Errors
    ///
    /// Returns [`DrawingError::Parse`] if serialization fails.
    pub fn to_json(&self) -> Result<String, DrawingError> {
        self.drawing.to_json()
    }

    #[must_use]
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    #[must_use]
    pub fn tools(&self) -> ToolConfig {
        self.tools
    }

    #[must_use]
    pub fn input_state(&self) -> InputState {
        self.input
    }

    #[must_use]
    pub fn is_touchable(&self) -> bool {
        self.touchable
    }

    #[must_use]
    pub fn eraser(&self) -> &Eraser {
        &self.eraser
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Shared handle to the published scene.
    #[must_use]
    pub fn scene(&self) -> Arc<Mutex<Scene>> {
        Arc::clone(&self.scene)
    }
}

/// The full engine. Wraps `EngineCore` and drives the render thread through
/// the surface lifecycle.
pub struct Engine {
    pub core: EngineCore,
    render_loop: RenderLoop,
    surface: Option<Box<dyn Surface>>,
    initialized: bool,
}

impl Engine {
    /// Create an engine with no surface and an empty drawing.
    ///
    /// # Errors
    ///
    /// Returns [`RasterError`] if the bitmap cache cannot be allocated.
    pub fn new(config: EngineConfig) -> Result<Self, RasterError> {
        Ok(Self { core: EngineCore::new(config)?, render_loop: RenderLoop::new(), surface: None, initialized: false })
    }

    // --- Load / persist ---

    /// Seed the drawing, repaint it, and start rendering if a surface exists.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::RenderLoop`] if the render thread cannot start,
    /// or [`EngineError::Drawing`] if `drawing` was invalid; the engine has
    /// started on an empty drawing in that case.
    pub fn initialize_with_drawing(&mut self, drawing: Option<Drawing>) -> Result<(), EngineError> {
        if let Some(surface) = self.render_loop.stop() {
            self.surface = Some(surface);
        }
        let loaded = self.core.load(drawing);
        self.initialized = true;
        self.resume()?;
        loaded.map_err(EngineError::from)
    }

    /// Like [`Engine::initialize_with_drawing`] from persisted JSON.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Drawing`] when the JSON could not be loaded; the
    /// engine has started on an empty drawing in that case.
    pub fn initialize_from_json(&mut self, json: &str) -> Result<(), EngineError> {
        let (drawing, load_error) = match Drawing::from_json(json) {
            Ok(drawing) => (Some(drawing), None),
            Err(e) => {
                warn!(error = %e, "falling back to an empty drawing");
                (None, Some(e))
            }
        };
        self.initialize_with_drawing(drawing)?;
        match load_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    #[must_use]
    pub fn drawing(&self) -> &Drawing {
        self.core.drawing()
    }

    /// Serialize the current drawing.
    ///
    /// # Errors
    ///
    /// Returns [`DrawingError::Parse`] if serialization fails.
    pub fn to_json(&self) -> Result<String, DrawingError> {
        self.core.to_json()
    }

    // --- Surface lifecycle ---

    /// Attach a presentation surface and start rendering once initialized.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if the cache or render thread cannot be set up.
    pub fn on_surface_created(&mut self, surface: Box<dyn Surface>) -> Result<(), EngineError> {
        drop(self.render_loop.stop());
        let (width, height) = surface.size();
        info!(width, height, "surface created");
        self.core.set_surface_size(width, height)?;
        self.surface = Some(surface);
        self.resume()
    }

    /// Rebuild for a new surface size and restart the render thread.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if the cache or render thread cannot be set up.
    pub fn on_surface_changed(&mut self, width: u32, height: u32) -> Result<(), EngineError> {
        if let Some(surface) = self.render_loop.stop() {
            self.surface = Some(surface);
        }
        info!(width, height, "surface changed");
        self.core.set_surface_size(width, height)?;
        self.resume()
    }

    /// Stop rendering and release the surface.
    pub fn on_surface_destroyed(&mut self) {
        drop(self.render_loop.stop());
        self.surface = None;
        info!("surface destroyed");
    }

    #[must_use]
    pub fn is_rendering(&self) -> bool {
        self.render_loop.is_running()
    }

    fn resume(&mut self) -> Result<(), EngineError> {
        if !self.initialized || self.render_loop.is_running() {
            return Ok(());
        }
        let Some(surface) = self.surface.take() else {
            return Ok(());
        };
        self.render_loop.start(surface, self.core.scene(), self.core.config().frame_interval)?;
        Ok(())
    }

    // --- Delegated input and configuration ---

    pub fn handle_event(&mut self, event: &PointerEvent) -> Vec<Action> {
        self.core.handle_event(event)
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.core.set_tool(tool);
    }

    pub fn set_color(&mut self, color: ColorAlias) {
        self.core.set_color(color);
    }

    pub fn set_alpha(&mut self, alpha: u8) {
        self.core.set_alpha(alpha);
    }

    pub fn set_pen_size(&mut self, pen_size: PenSize) {
        self.core.set_pen_size(pen_size);
    }

    pub fn set_touchable(&mut self, touchable: bool) {
        self.core.set_touchable(touchable);
    }
}
