//! Runtime configuration
//!
//! Merges command-line arguments over the optional configuration file.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use hls_segmenter_lib::SegmenterOptions;

use crate::config_file::ConfigFile;
use crate::error::{AppError, Result};
use crate::Args;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(AppError::Usage(format!("unknown log format {:?}", other))),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level for the segmenter crates when `RUST_LOG` is unset
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub fn default_directive(&self) -> String {
        format!(
            "hls_segmenter={level},hls_segmenter_lib={level}",
            level = self.level
        )
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub segmenter: SegmenterOptions,
    pub logging: LoggingConfig,
    /// Create the output directory when missing
    pub create_output_dir: bool,
    /// Print the run summary as JSON on stdout
    pub summary_json: bool,
}

impl AppConfig {
    /// Load the configuration file named by `--config`, if any, and merge
    /// the arguments over it.
    pub fn load(args: &Args) -> Result<Self> {
        let file = args
            .config
            .as_ref()
            .map(ConfigFile::from_file)
            .transpose()?;
        Self::resolve(args, file.unwrap_or_default())
    }

    pub fn resolve(args: &Args, file: ConfigFile) -> Result<Self> {
        let input = required(&args.input, "<input>")?;
        let output_dir = required(&args.output_dir, "<output_dir>")?;
        let manifest_path = required(&args.index, "<index>")?;

        let mut segmenter = SegmenterOptions::new(input, output_dir, manifest_path);

        let segment = file.segment;
        if let Some(prefix) = args.base_name.clone().or(segment.prefix) {
            segmenter.segment_prefix = prefix;
        }
        if let Some(extension) = args.ext.clone().or(segment.extension) {
            segmenter.segment_extension = extension;
        }
        if let Some(duration) = args.duration.or(segment.target_duration_secs) {
            segmenter.target_duration_secs = duration;
        }
        if let Some(window) = args.max_segments.or(segment.window_size) {
            segmenter.window_size = window;
        }
        if let Some(limit) = args.segment_limit.or(segment.segment_limit) {
            segmenter.segment_limit = limit;
        }

        let output = file.output.unwrap_or_default();
        if let Some(format) = args.container_format.clone().or(output.container_format) {
            segmenter.container_format = format;
        }
        if let Some(muxer_options) = output.muxer_options {
            segmenter.muxer_options = muxer_options;
        }
        segmenter.strict_manifest = args.strict_manifest || output.strict_manifest.unwrap_or(false);

        let mut logging = LoggingConfig::default();
        if let Some(settings) = file.logging {
            logging.level = settings.level;
            if let Some(format) = settings.format {
                logging.format = format.parse()?;
            }
        }
        if let Some(format) = args.log_format {
            logging.format = format;
        }

        segmenter.validate()?;

        Ok(Self {
            segmenter,
            logging,
            create_output_dir: output.create_output_dir.unwrap_or(true),
            summary_json: args.summary_json,
        })
    }
}

fn required<T: Clone>(value: &Option<T>, name: &str) -> Result<T> {
    value
        .clone()
        .ok_or_else(|| AppError::Usage(format!("missing {}", name)))
}
