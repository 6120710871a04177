use std::path::PathBuf;

use hls_segmenter_lib::{FfmpegError, HlsError};
use thiserror::Error;

/// Main error type for the segmenter binary
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Segmenter(#[from] HlsError),

    #[error(transparent)]
    Ffmpeg(#[from] FfmpegError),

    #[error("Failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Failed to write {path}: {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid arguments: {0}")]
    Usage(String),

    #[error("Failed to encode summary: {0}")]
    Summary(#[from] serde_json::Error),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
