//! Configuration file support
//!
//! Loads segmenter defaults from TOML files.  Every key is optional; values
//! given on the command line take precedence.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{AppError, Result};

/// Configuration file format
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Segment settings
    #[serde(default)]
    pub segment: SegmentSettings,
    /// Output settings
    pub output: Option<OutputSettings>,
    /// Logging settings
    pub logging: Option<LoggingSettings>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SegmentSettings {
    /// Target segment duration in seconds
    pub target_duration_secs: Option<u32>,
    /// Segments kept in the playlist, 0 for all
    pub window_size: Option<usize>,
    /// Hard cap on segments per run
    pub segment_limit: Option<u64>,
    /// Segment file name prefix
    pub prefix: Option<String>,
    /// Segment file name extension, including the dot
    pub extension: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    /// FFmpeg muxer name
    pub container_format: Option<String>,
    /// Options passed to the muxer header
    pub muxer_options: Option<BTreeMap<String, String>>,
    /// Abort when an intermediate playlist update fails
    pub strict_manifest: Option<bool>,
    /// Create the output directory when missing
    pub create_output_dir: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty)
    pub format: Option<String>,
}

impl ConfigFile {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| AppError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| AppError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| AppError::WriteFile {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Generate default configuration file
    pub fn default_config() -> Self {
        Self {
            segment: SegmentSettings {
                target_duration_secs: Some(10),
                window_size: Some(0),
                segment_limit: Some(hls_segmenter_lib::DEFAULT_SEGMENT_LIMIT),
                prefix: Some("segment".to_string()),
                extension: Some(".ts".to_string()),
            },
            output: Some(OutputSettings {
                container_format: Some(hls_segmenter_lib::DEFAULT_CONTAINER_FORMAT.to_string()),
                muxer_options: Some(BTreeMap::new()),
                strict_manifest: Some(false),
                create_output_dir: Some(true),
            }),
            logging: Some(LoggingSettings {
                level: "info".to_string(),
                format: Some("pretty".to_string()),
            }),
        }
    }
}

/// Generate default configuration file at the specified path
pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
    let config = ConfigFile::default_config();
    config.to_file(path)?;
    Ok(())
}
