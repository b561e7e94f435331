//! InkSight - Handwriting graphology analysis
//!
//! Measures pen pressure, letter size, slant, baseline, spacing and margins
//! on a scanned page and maps them to a personality trait profile.

mod analysis;
mod app;
mod config;
mod error;
mod render;
mod vision;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::app::{AnalysisSession, SessionOptions};
use crate::config::AppConfig;
use crate::vision::TranscriptionMode;

/// InkSight - Handwriting graphology analysis
#[derive(Parser, Debug)]
#[command(name = "inksight")]
#[command(about = "Extracts graphological features from handwriting and scores a trait profile")]
struct Args {
    /// Scanned handwriting page (PNG, JPEG, ...)
    #[arg(required_unless_present = "write_default_config")]
    image: Option<PathBuf>,

    /// Configuration file (defaults to the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Save a radar chart of the trait scores
    #[arg(long, value_name = "OUT.png")]
    radar: Option<PathBuf>,

    /// Save each detected line as line_NNN.png in this directory
    #[arg(long, value_name = "DIR")]
    lines_dir: Option<PathBuf>,

    /// Handwriting style used to pick the transcription engine
    #[arg(long, value_enum, default_value = "print")]
    mode: TranscriptionMode,

    /// Transcribe the detected lines with the configured engine
    #[arg(long)]
    transcribe: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Write the default configuration to PATH and exit
    #[arg(long, value_name = "PATH")]
    write_default_config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging (RUST_LOG overrides the default level)
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if let Some(path) = &args.write_default_config {
        config::save_config(&AppConfig::default(), path)?;
        info!("Wrote default configuration to {:?}", path);
        return Ok(());
    }

    let image = args.image.clone().context("No input image given")?;

    let config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => load_or_create_config(),
    };

    let options = SessionOptions {
        json: args.json,
        radar_path: args.radar,
        lines_dir: args.lines_dir,
        transcribe: args.transcribe,
        mode: args.mode,
    };

    let session = AnalysisSession::new(config, options);
    let stdout = std::io::stdout();
    session.run(&image, &mut stdout.lock())?;

    Ok(())
}

/// Load configuration from the default location or fall back to defaults
fn load_or_create_config() -> AppConfig {
    if let Ok(config_path) = config::default_config_path() {
        if config_path.exists() {
            match config::load_config(&config_path) {
                Ok(config) => {
                    info!("Loaded configuration from {:?}", config_path);
                    return config;
                }
                Err(e) => warn!("Ignoring {:?}: {:#}", config_path, e),
            }
        }
    }
    info!("Using default configuration");
    AppConfig::default()
}
