//! HLS Segmenter
//!
//! Repackages a media file into keyframe-aligned MPEG-TS segments and keeps
//! an HLS media playlist up to date while doing so, either listing every
//! segment (VOD) or a sliding window of the most recent ones (live).

mod config;
mod config_file;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hls_segmenter_lib::SegmentationReport;

use crate::config::{AppConfig, LogFormat, LoggingConfig};
use crate::error::{AppError, Result};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
const APP_NAME: &str = "hls-segmenter";

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Source media file
    pub input: Option<PathBuf>,

    /// Directory receiving the segment files
    pub output_dir: Option<PathBuf>,

    /// Playlist path, used as given
    pub index: Option<PathBuf>,

    /// Segment file name prefix
    pub base_name: Option<String>,

    /// Segment file name extension, including the dot
    pub ext: Option<String>,

    /// Target segment duration in seconds
    pub duration: Option<u32>,

    /// Segments kept in the playlist, 0 for all of them
    pub max_segments: Option<usize>,

    /// TOML configuration file supplying defaults
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// FFmpeg muxer used for the segments
    #[arg(long)]
    pub container_format: Option<String>,

    /// Hard cap on segments produced in one run
    #[arg(long)]
    pub segment_limit: Option<u64>,

    /// Abort when an intermediate playlist update fails
    #[arg(long)]
    pub strict_manifest: bool,

    /// Log output format
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    pub summary_json: bool,

    /// Write a default configuration file and exit
    #[arg(long, value_name = "PATH")]
    pub write_default_config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Some(path) = &args.write_default_config {
        return match config_file::generate_default_config(path) {
            Ok(()) => {
                println!("Wrote default configuration to {}", path.display());
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("{}: {}", APP_NAME, e);
                ExitCode::FAILURE
            }
        };
    }

    let config = match AppConfig::load(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", APP_NAME, e);
            eprintln!(
                "Usage: {} <input> <output_dir> <index> <base_name> <ext> <duration> [max_segments]",
                APP_NAME
            );
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config.logging);

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(config: &AppConfig) -> Result<()> {
    tracing::info!("{} v{} starting", APP_NAME, VERSION);
    tracing::info!("FFmpeg version: {}", hls_segmenter_lib::ffmpeg_version_info());

    hls_segmenter_lib::init()?;
    hls_segmenter_lib::install_log_filter();

    let options = &config.segmenter;
    tracing::debug!("Configuration loaded: {:?}", options);

    if config.create_output_dir {
        std::fs::create_dir_all(&options.output_dir).map_err(|source| AppError::OutputDir {
            path: options.output_dir.clone(),
            source,
        })?;
    }

    let report = hls_segmenter_lib::segment_file(options)?;
    log_summary(&report);

    if config.summary_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    if !report.finished {
        tracing::warn!("No segment was produced from {:?}", options.input);
    }
    Ok(())
}

fn log_summary(report: &SegmentationReport) {
    tracing::info!(
        "Summary: {} segments ({}s), {} listed from sequence {}, {} packets written, {} dropped, {} write failures, {} playlist failures",
        report.segments_created,
        report.total_duration_secs,
        report.segments_listed,
        report.media_sequence,
        report.packets_written,
        report.packets_dropped,
        report.write_failures,
        report.manifest_failures
    );
}

/// Initialize logging with tracing
fn init_logging(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| logging.default_directive().into());
    let registry = tracing_subscriber::registry().with(filter);

    match logging.format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}
