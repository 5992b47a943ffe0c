use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::thread;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use inkpad::config::EngineConfig;
use inkpad::drawing::{ColorAlias, Drawing, DrawingError};
use inkpad::engine::{Engine, EngineError};
use inkpad::input::PointerEvent;
use inkpad::raster::RasterError;
use inkpad::render_loop::PixmapSurface;

/// Upper bound on waiting for the render thread to present the requested frames.
const RENDER_DEADLINE: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error(transparent)]
    Drawing(#[from] DrawingError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Raster(#[from] RasterError),
    #[error("timed out waiting for {wanted} frames ({presented} presented)")]
    RenderTimeout { wanted: u64, presented: u64 },
}

#[derive(Parser, Debug)]
#[command(name = "inkpad", about = "Inspect and replay handwriting drawings")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarize a persisted drawing.
    Stats { path: PathBuf },
    /// Drive a headless engine with recorded pointer events.
    Replay {
        /// JSON array of pointer events.
        events: PathBuf,
        /// Drawing to start from; empty when absent.
        #[arg(long)]
        drawing: Option<PathBuf>,
        /// Where to write the resulting drawing; stdout when absent.
        #[arg(long)]
        out: Option<PathBuf>,
        /// Frames the render thread must present before exiting.
        #[arg(long, default_value_t = 3)]
        frames: u64,
        #[arg(long, default_value_t = 800)]
        width: u32,
        #[arg(long, default_value_t = 600)]
        height: u32,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Stats { path } => stats(&path),
        Command::Replay { events, drawing, out, frames, width, height } => {
            replay(&events, drawing.as_deref(), out.as_deref(), frames, width, height)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn stats(path: &Path) -> Result<(), CliError> {
    let drawing = Drawing::from_json(&fs::read_to_string(path)?)?;

    let mut by_color: BTreeMap<ColorAlias, usize> = BTreeMap::new();
    for stroke in &drawing.strokes {
        *by_color.entry(stroke.color).or_default() += 1;
    }
    let dots = drawing.strokes.iter().filter(|stroke| stroke.len() < 2).count();

    println!("strokes:     {}", drawing.strokes.len());
    println!("points:      {}", drawing.point_count());
    println!("dots:        {dots}");
    println!("scale:       {}", drawing.scale);
    println!("translation: ({}, {})", drawing.translation_x, drawing.translation_y);
    for (color, count) in by_color {
        println!("  {color:?}: {count}");
    }
    Ok(())
}

fn replay(
    events_path: &Path,
    drawing_path: Option<&Path>,
    out: Option<&Path>,
    frames: u64,
    width: u32,
    height: u32,
) -> Result<(), CliError> {
    let events: Vec<PointerEvent> = serde_json::from_str(&fs::read_to_string(events_path)?)?;

    let mut engine = Engine::new(EngineConfig::from_env())?;
    let surface = PixmapSurface::new(width, height)?;
    let surface_stats = surface.stats();
    engine.on_surface_created(Box::new(surface))?;

    match drawing_path {
        Some(path) => match engine.initialize_from_json(&fs::read_to_string(path)?) {
            Ok(()) => {}
            Err(EngineError::Drawing(e)) => tracing::warn!(error = %e, "replaying onto an empty drawing"),
            Err(e) => return Err(e.into()),
        },
        None => engine.initialize_with_drawing(None)?,
    }

    let mut changes = 0_usize;
    for event in &events {
        changes += engine
            .handle_event(event)
            .iter()
            .filter(|action| action.is_content_change())
            .count();
    }

    let started = Instant::now();
    while surface_stats.presented() < frames {
        if started.elapsed() > RENDER_DEADLINE {
            engine.on_surface_destroyed();
            return Err(CliError::RenderTimeout { wanted: frames, presented: surface_stats.presented() });
        }
        thread::sleep(engine.core.config().frame_interval);
    }
    engine.on_surface_destroyed();

    tracing::info!(
        events = events.len(),
        changes,
        strokes = engine.drawing().strokes.len(),
        frames = surface_stats.presented(),
        "replay finished"
    );

    let json = engine.to_json()?;
    match out {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }
    Ok(())
}
