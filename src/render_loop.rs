//! Render loop: a dedicated thread presenting the scene continuously.
//!
//! DESIGN
//! ======
//! The loop owns the presentation surface while it runs. Each iteration locks
//! the surface, locks the shared [`Scene`] just long enough to composite it,
//! and posts the frame. Iterations are paced to a fixed frame interval; the
//! loop sleeps whatever is left of the interval after presenting.
//!
//! ERROR HANDLING
//! ==============
//! Surface failures (not ready yet, torn down mid-frame) skip the frame and
//! retry on the next iteration. The surface lock is held by a guard that
//! releases it on every exit path, so a failed frame never leaves the
//! surface locked.
//!
//! `stop()` is level-triggered: the running flag is checked once per
//! iteration and the frame in flight always completes before the thread is
//! joined and the surface handed back.

#[cfg(test)]
#[path = "render_loop_test.rs"]
mod render_loop_test;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tiny_skia::Pixmap;
use tracing::{debug, info, trace, warn};

use crate::consts::MIN_FRAME_INTERVAL_MS;
use crate::raster::{RasterError, Scene};

/// Errors reported by a presentation surface.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SurfaceError {
    /// The surface cannot be locked right now (not yet created, busy).
    #[error("surface unavailable")]
    Unavailable,

    /// The surface went away while a frame was in flight.
    #[error("surface lost: {0}")]
    Lost(String),
}

/// Errors starting the render loop.
#[derive(Debug, thiserror::Error)]
pub enum RenderLoopError {
    /// `start` was called while the loop is already running.
    #[error("render loop already running")]
    AlreadyRunning,

    /// The render thread could not be spawned.
    #[error("failed to spawn render thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// A platform presentation target with lock/post semantics.
pub trait Surface: Send {
    /// Surface size in pixels.
    fn size(&self) -> (u32, u32);

    /// Lock the back buffer for drawing.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError`] if the buffer cannot be locked this frame.
    fn lock(&mut self) -> Result<(), SurfaceError>;

    /// The back buffer. Only meaningful between `lock` and unlock.
    fn buffer(&mut self) -> &mut Pixmap;

    /// Unlock the buffer and present it. The lock is released even on error.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError`] if the frame could not be presented.
    fn unlock_and_post(&mut self) -> Result<(), SurfaceError>;

    /// Unlock the buffer without presenting it.
    fn unlock(&mut self);
}

/// Scoped surface lock: unlocks on drop unless the frame was posted.
pub struct SurfaceLock<'a> {
    surface: &'a mut dyn Surface,
    posted: bool,
}

impl<'a> SurfaceLock<'a> {
    /// Lock `surface` for one frame.
    ///
    /// # Errors
    ///
    /// Propagates the surface's lock failure; nothing is held in that case.
    pub fn acquire(surface: &'a mut dyn Surface) -> Result<Self, SurfaceError> {
        surface.lock()?;
        Ok(Self { surface, posted: false })
    }

    pub fn buffer(&mut self) -> &mut Pixmap {
        self.surface.buffer()
    }

    /// Present the frame and release the lock.
    ///
    /// # Errors
    ///
    /// Propagates the surface's present failure.
    pub fn post(mut self) -> Result<(), SurfaceError> {
        self.posted = true;
        self.surface.unlock_and_post()
    }
}

impl Drop for SurfaceLock<'_> {
    fn drop(&mut self) {
        if !self.posted {
            self.surface.unlock();
        }
    }
}

/// Dedicated render thread.
pub struct RenderLoop {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<Box<dyn Surface>>>,
}

impl Default for RenderLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderLoop {
    #[must_use]
    pub fn new() -> Self {
        Self { running: Arc::new(AtomicBool::new(false)), handle: None }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Spawn the render thread presenting `scene` on `surface`.
    ///
    /// `frame_interval` is raised to [`MIN_FRAME_INTERVAL_MS`] when shorter.
    ///
    /// # Errors
    ///
    /// Returns [`RenderLoopError::AlreadyRunning`] if a thread is live, or
    /// [`RenderLoopError::Spawn`] if the OS refuses a new thread.
    pub fn start(
        &mut self,
        mut surface: Box<dyn Surface>,
        scene: Arc<Mutex<Scene>>,
        frame_interval: Duration,
    ) -> Result<(), RenderLoopError> {
        if self.handle.is_some() {
            return Err(RenderLoopError::AlreadyRunning);
        }

        let frame_interval = frame_interval.max(Duration::from_millis(MIN_FRAME_INTERVAL_MS));
        self.running.store(true, Ordering::Release);
        let running = Arc::clone(&self.running);
        let spawned = thread::Builder::new().name("inkpad-render".into()).spawn(move || {
            let frames = run(&running, surface.as_mut(), &scene, frame_interval);
            debug!(frames, "render thread exiting");
            surface
        });

        match spawned {
            Ok(handle) => {
                info!(frame_interval_ms = frame_interval.as_millis(), "render loop started");
                self.handle = Some(handle);
                Ok(())
            }
            Err(e) => {
                self.running.store(false, Ordering::Release);
                Err(RenderLoopError::Spawn(e))
            }
        }
    }

    /// Stop the thread and take the surface back.
    ///
    /// A no-op returning `None` when the loop is not running.
    pub fn stop(&mut self) -> Option<Box<dyn Surface>> {
        let handle = self.handle.take()?;
        self.running.store(false, Ordering::Release);
        match handle.join() {
            Ok(surface) => {
                info!("render loop stopped");
                Some(surface)
            }
            Err(_) => {
                warn!("render thread panicked; surface dropped");
                None
            }
        }
    }
}

impl Drop for RenderLoop {
    fn drop(&mut self) {
        drop(self.stop());
    }
}

fn run(running: &AtomicBool, surface: &mut dyn Surface, scene: &Mutex<Scene>, frame_interval: Duration) -> u64 {
    let mut frames = 0_u64;
    while running.load(Ordering::Acquire) {
        let started = Instant::now();
        match render_frame(surface, scene) {
            Ok(()) => frames += 1,
            Err(e) => trace!(error = %e, "frame skipped"),
        }
        if let Some(rest) = frame_interval.checked_sub(started.elapsed()) {
            thread::sleep(rest);
        }
    }
    frames
}

/// Paint and present one frame.
///
/// # Errors
///
/// Returns the surface failure that cut the frame short.
pub fn render_frame(surface: &mut dyn Surface, scene: &Mutex<Scene>) -> Result<(), SurfaceError> {
    let mut lock = SurfaceLock::acquire(surface)?;
    {
        let scene = scene.lock().unwrap_or_else(PoisonError::into_inner);
        scene.paint_frame(lock.buffer());
    }
    lock.post()
}

// =============================================================================
// HEADLESS SURFACE
// =============================================================================

/// Counters shared between a [`PixmapSurface`] and whoever observes it.
#[derive(Debug, Default)]
pub struct SurfaceStats {
    presented: AtomicU64,
    failed: AtomicU64,
    locked: AtomicBool,
    fail_next: AtomicU64,
}

impl SurfaceStats {
    /// Frames successfully presented.
    #[must_use]
    pub fn presented(&self) -> u64 {
        self.presented.load(Ordering::Acquire)
    }

    /// Lock attempts that failed.
    #[must_use]
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Acquire)
    }

    /// Whether the surface is currently locked.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Acquire)
    }

    /// Make the next `count` lock attempts fail with [`SurfaceError::Lost`].
    pub fn fail_next(&self, count: u64) {
        self.fail_next.store(count, Ordering::Release);
    }
}

/// In-memory surface backed by a pixmap; the last presented frame is kept in
/// a shared front buffer.
pub struct PixmapSurface {
    back: Pixmap,
    front: Arc<Mutex<Pixmap>>,
    stats: Arc<SurfaceStats>,
}

impl PixmapSurface {
    /// Create a `width` × `height` surface.
    ///
    /// # Errors
    ///
    /// Returns [`RasterError::Allocation`] for zero or oversized dimensions.
    pub fn new(width: u32, height: u32) -> Result<Self, RasterError> {
        let back = Pixmap::new(width, height).ok_or(RasterError::Allocation { width, height })?;
        let front = Arc::new(Mutex::new(back.clone()));
        Ok(Self { back, front, stats: Arc::new(SurfaceStats::default()) })
    }

    /// Shared counters for this surface.
    #[must_use]
    pub fn stats(&self) -> Arc<SurfaceStats> {
        Arc::clone(&self.stats)
    }

    /// Shared handle to the last presented frame.
    #[must_use]
    pub fn front(&self) -> Arc<Mutex<Pixmap>> {
        Arc::clone(&self.front)
    }
}

impl Surface for PixmapSurface {
    fn size(&self) -> (u32, u32) {
        (self.back.width(), self.back.height())
    }

    fn lock(&mut self) -> Result<(), SurfaceError> {
        let pending = self.stats.fail_next.load(Ordering::Acquire);
        if pending > 0 {
            self.stats.fail_next.store(pending - 1, Ordering::Release);
            self.stats.failed.fetch_add(1, Ordering::AcqRel);
            return Err(SurfaceError::Lost("injected failure".into()));
        }
        if self.stats.locked.swap(true, Ordering::AcqRel) {
            self.stats.failed.fetch_add(1, Ordering::AcqRel);
            return Err(SurfaceError::Unavailable);
        }
        Ok(())
    }

    fn buffer(&mut self) -> &mut Pixmap {
        &mut self.back
    }

    fn unlock_and_post(&mut self) -> Result<(), SurfaceError> {
        {
            let mut front = self.front.lock().unwrap_or_else(PoisonError::into_inner);
            front.clone_from(&self.back);
        }
        self.stats.locked.store(false, Ordering::Release);
        self.stats.presented.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    fn unlock(&mut self) {
        self.stats.locked.store(false, Ordering::Release);
    }
}
