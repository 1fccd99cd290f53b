//! # Sketch Ink Replay
//!
//! Replays a recorded event log (`Vec<SessionEvent>` as JSON) through a
//! [`SketchSession`] on a headless [`RasterSurface`] and writes the result
//! as an image, optionally with an edit mask.
//!
//! ## Components
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `ReplayConfig` - Resolved settings: config file merged with flags
//! - `replay` - Runs a log and writes the outputs

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use sketch_core::{Color, Diagnostics, PenConfig, SessionEvent, SketchConfig, SketchSession};
use sketch_renderer::{ExportConfig, ExportFormat, MaskRenderer, RasterSurface, SketchExporter};

/// Command-line arguments for sketch-replay.
#[derive(Debug, Clone, Parser)]
#[command(name = "sketch-replay")]
#[command(about = "Replay a recorded sketch event log to an image")]
#[command(version)]
pub struct CliArgs {
    /// JSON event log to replay
    #[arg(long, env = "SKETCH_EVENTS")]
    pub events: PathBuf,

    /// JSON session configuration (pen, sampler, mask margin)
    #[arg(long, env = "SKETCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Logical surface width
    #[arg(long, env = "SKETCH_WIDTH", default_value = "800")]
    pub width: f32,

    /// Logical surface height
    #[arg(long, env = "SKETCH_HEIGHT", default_value = "600")]
    pub height: f32,

    /// Device pixel ratio
    #[arg(long, env = "SKETCH_RATIO", default_value = "1")]
    pub ratio: f32,

    /// Output image (`.jpg`/`.jpeg` writes JPEG, anything else PNG)
    #[arg(long, env = "SKETCH_OUT", default_value = "sketch.png")]
    pub out: PathBuf,

    /// Also write an edit mask PNG
    #[arg(long, env = "SKETCH_MASK")]
    pub mask: Option<PathBuf>,

    /// Also write the stroke store as JSON
    #[arg(long, env = "SKETCH_STROKES")]
    pub strokes: Option<PathBuf>,

    /// Override the initial pen width
    #[arg(long, env = "SKETCH_PEN_WIDTH")]
    pub pen_width: Option<f32>,

    /// Override the initial pen colour (#rgb, #rrggbb, ...)
    #[arg(long, env = "SKETCH_PEN_COLOR")]
    pub pen_color: Option<String>,

    /// Override the mask margin in logical pixels
    #[arg(long, env = "SKETCH_MASK_MARGIN")]
    pub mask_margin: Option<f32>,

    /// Background colour under the ink; JPEG output defaults to white
    #[arg(long, env = "SKETCH_BACKGROUND")]
    pub background: Option<String>,

    /// Print the image as a data URI on stdout
    #[arg(long)]
    pub data_url: bool,
}

/// Resolved replay settings.
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Event log path.
    pub events: PathBuf,
    /// Session settings.
    pub session: SketchConfig,
    /// Logical surface size.
    pub size: (f32, f32),
    /// Device pixel ratio.
    pub ratio: f32,
    /// Image output path.
    pub out: PathBuf,
    /// Mask output path.
    pub mask: Option<PathBuf>,
    /// Stroke JSON output path.
    pub strokes: Option<PathBuf>,
    /// Background colour for the exported image.
    pub background: Option<Color>,
    /// Whether to return the image as a data URI.
    pub data_url: bool,
}

impl ReplayConfig {
    /// Resolve arguments: read the config file if given, then apply flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or any value is
    /// invalid.
    pub fn from_args(args: CliArgs) -> anyhow::Result<Self> {
        let mut session = match &args.config {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                SketchConfig::from_json(&json)
                    .with_context(|| format!("Invalid config {}", path.display()))?
            }
            None => SketchConfig::default(),
        };

        if args.pen_width.is_some() || args.pen_color.is_some() {
            let color = match &args.pen_color {
                Some(c) => c.parse::<Color>().context("Invalid --pen-color")?,
                None => session.pen.color,
            };
            let width = args.pen_width.unwrap_or(session.pen.width);
            session.pen = PenConfig::new(width, color).context("Invalid pen")?;
        }
        if let Some(margin) = args.mask_margin {
            anyhow::ensure!(
                margin.is_finite() && margin >= 0.0,
                "Mask margin must be a non-negative number, got {margin}"
            );
            session.mask_margin = margin;
        }

        let background = args
            .background
            .as_deref()
            .map(str::parse::<Color>)
            .transpose()
            .context("Invalid --background")?;

        Ok(Self {
            events: args.events,
            session,
            size: (args.width, args.height),
            ratio: args.ratio,
            out: args.out,
            mask: args.mask,
            strokes: args.strokes,
            background,
            data_url: args.data_url,
        })
    }
}

/// Outcome of a replay.
#[derive(Debug, Clone)]
pub struct ReplayReport {
    /// Diagnostics after the last event.
    pub diagnostics: Diagnostics,
    /// Strokes in the final store.
    pub strokes: usize,
    /// Events the session handled.
    pub handled: usize,
    /// Events the session ignored.
    pub ignored: usize,
    /// Backing size of the output image.
    pub backing: (u32, u32),
    /// Image data URI, when requested.
    pub data_url: Option<String>,
}

/// Read an event log.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a JSON event array.
pub fn load_events(path: &Path) -> anyhow::Result<Vec<SessionEvent>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read event log {}", path.display()))?;
    serde_json::from_str(&json)
        .with_context(|| format!("Invalid event log {}", path.display()))
}

/// Output format for a path, by extension.
#[must_use]
pub fn format_for(path: &Path) -> ExportFormat {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("jpg" | "jpeg") => ExportFormat::Jpeg,
        _ => ExportFormat::Png,
    }
}

/// Replay the configured log and write every requested output.
///
/// # Errors
///
/// Returns an error if the log cannot be loaded, an event fails, or an
/// output cannot be encoded or written.
pub fn replay(config: &ReplayConfig) -> anyhow::Result<ReplayReport> {
    let events = load_events(&config.events)?;
    tracing::info!(
        "Replaying {} events on {}x{} @{}",
        events.len(),
        config.size.0,
        config.size.1,
        config.ratio
    );

    let surface = RasterSurface::new(config.size.0, config.size.1, config.ratio)?;
    let mut session = SketchSession::new(surface, config.session)?;

    let (mut handled, mut ignored) = (0, 0);
    for (index, event) in events.iter().enumerate() {
        let outcome = session
            .dispatch(event)
            .with_context(|| format!("Event {index} failed"))?;
        if outcome.is_handled() {
            handled += 1;
        } else {
            ignored += 1;
        }
    }
    if session.store().is_drawing() {
        tracing::warn!("Log ends mid-gesture; the open stroke is kept as drawn");
    }

    let controller = session.controller();
    let backing = controller.backing_size();
    let exporter = SketchExporter::new(ExportConfig {
        background: config.background,
        ..ExportConfig::default()
    });
    let pixmap = session.surface().pixmap();

    let format = format_for(&config.out);
    let bytes = exporter.export(pixmap, format)?;
    std::fs::write(&config.out, &bytes)
        .with_context(|| format!("Failed to write {}", config.out.display()))?;
    tracing::info!("Wrote {} ({} bytes)", config.out.display(), bytes.len());

    if let Some(mask_path) = &config.mask {
        let mask = MaskRenderer::new(config.session.mask_margin).render(
            session.store(),
            backing,
            controller.device_ratio(),
        )?;
        let png = SketchExporter::with_defaults().export(&mask, ExportFormat::Png)?;
        std::fs::write(mask_path, png)
            .with_context(|| format!("Failed to write {}", mask_path.display()))?;
        tracing::info!("Wrote mask {}", mask_path.display());
    }

    if let Some(strokes_path) = &config.strokes {
        std::fs::write(strokes_path, session.store().to_json()?)
            .with_context(|| format!("Failed to write {}", strokes_path.display()))?;
    }

    let data_url = config
        .data_url
        .then(|| sketch_renderer::data_url(&bytes, format));

    Ok(ReplayReport {
        diagnostics: session.diagnostics(),
        strokes: session.store().len(),
        handled,
        ignored,
        backing,
        data_url,
    })
}
