//! # Sketch Ink Replay
//!
//! Renders a recorded event log to an image without a browser.

use clap::Parser;
use sketch_replay::{replay, CliArgs, ReplayConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize structured tracing with optional JSON format.
///
/// Set `RUST_LOG` to control log levels (default: info,sketch_core=debug).
/// Set `RUST_LOG_FORMAT=json` for JSON output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sketch_core=debug"));

    // Logs go to stderr; stdout carries diagnostics and the data URI.
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = CliArgs::parse();
    let config = ReplayConfig::from_args(args)?;

    let report = replay(&config)?;
    tracing::info!(
        handled = report.handled,
        ignored = report.ignored,
        strokes = report.strokes,
        "Replay finished at {}x{}",
        report.backing.0,
        report.backing.1
    );

    println!("{}", report.diagnostics);
    if let Some(url) = report.data_url {
        println!("{url}");
    }
    Ok(())
}
