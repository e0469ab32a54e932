// limbwatch command line interface
// Flags violent limb motion in a recorded video and writes an annotated copy

mod settings;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use limbwatch_core::ProgressEvent;
use limbwatch_eye::{run_video, VisionError};
use settings::{Overrides, Settings};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "limbwatch")]
#[command(about = "Detect violent limb motion in a video and write an annotated copy", long_about = None)]
#[command(version)]
struct Cli {
    /// Video to analyze
    #[arg(long, short)]
    input: PathBuf,

    /// Annotated video to write
    #[arg(long, short)]
    output: PathBuf,

    /// YOLOv8-pose ONNX model
    #[arg(long, short)]
    model: Option<PathBuf>,

    /// TOML settings file with [monitor] and [vision] tables
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Smoothed limb speed (px/s) that counts as violent
    #[arg(long)]
    threshold: Option<f64>,

    /// Seconds between two alerts
    #[arg(long)]
    cooldown: Option<f64>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            model: self.model.clone(),
            threshold: self.threshold,
            cooldown: self.cooldown,
        }
    }
}

fn main() {
    // Usage errors exit 1; status 2 is reserved for an unreadable input.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    if let Err(e) = init_logging(&cli.log_level, cli.log_format) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(&cli) {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(exit_code(&e));
    }
}

fn init_logging(level: &str, format: LogFormat) -> Result<()> {
    let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
    if !valid_log_levels.contains(&level) {
        return Err(anyhow::anyhow!("Invalid log level: {}", level));
    }

    // RUST_LOG wins over --log-level
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false);

    match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
    .map_err(|e| anyhow::anyhow!("Failed to install logger: {}", e))
}

fn run(cli: &Cli) -> Result<()> {
    let settings = Settings::resolve(cli.config.as_deref(), &cli.overrides())?;
    debug!("Settings: {:?}", settings);

    let summary = run_video(
        &cli.input,
        &cli.output,
        &settings.monitor,
        &settings.vision,
        &mut print_progress,
    )
    .with_context(|| format!("Failed to annotate {}", cli.input.display()))?;

    info!(
        "Summary: {} frames, {} with a person, {} alerts, {} evidence frames held",
        summary.frames, summary.frames_with_detection, summary.alerts, summary.evidence_frames
    );
    Ok(())
}

/// Progress lines go to stdout, one per event, flushed immediately.
fn print_progress(event: &ProgressEvent) {
    let mut stdout = io::stdout().lock();
    if let Err(e) = writeln!(stdout, "{}", event).and_then(|_| stdout.flush()) {
        debug!("Dropped progress line: {}", e);
    }
}

/// 2 for an unreadable input, 1 for anything else
fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<VisionError>().map_or(1, VisionError::exit_code)
}
