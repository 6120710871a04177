use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the segmenter
#[derive(Error, Debug)]
pub enum HlsError {
    /// An error originating from the underlying FFmpeg library
    #[error("FFmpeg error: {0}")]
    Ffmpeg(#[from] FfmpegError),

    /// A standard I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The source does not contain a video stream
    #[error("No video stream found in source file")]
    NoVideoStream,

    /// Invalid segmenter options
    #[error("Configuration error: {0}")]
    Config(String),

    /// The playlist could not be written or moved into place
    #[error("Failed to publish playlist {} (via {}): {source}", path.display(), tmp_path.display())]
    ManifestWrite {
        path: PathBuf,
        tmp_path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The absolute number of segments allowed for one run was reached
    #[error("Segment limit reached ({limit} segments)")]
    SegmentLimit { limit: u64 },
}

/// FFmpeg-specific errors
#[derive(Error, Debug)]
pub enum FfmpegError {
    /// Failure during global FFmpeg initialization
    #[error("FFmpeg initialization failed: {0}")]
    InitFailed(String),

    /// Failure opening an input media file
    #[error("Failed to open input file: {0}")]
    OpenInput(String),

    /// Failure creating an output format muxer
    #[error("Failed to create muxer: {0}")]
    MuxerCreate(String),

    /// Failure configuring an output stream
    #[error("Stream configuration failed: {0}")]
    StreamConfig(String),

    /// Failure opening the output file of a segment
    #[error("Failed to open segment output: {0}")]
    OpenOutput(String),

    /// Failure writing the container header
    #[error("Failed to write header: {0}")]
    WriteHeader(String),

    /// Failure writing a media packet to the container
    #[error("Failed to write packet: {0}")]
    WritePacket(String),

    /// Failure writing the container trailer
    #[error("Failed to write trailer: {0}")]
    WriteTrailer(String),

    /// Failure reading a packet from the input context
    #[error("Failed to read frame: {0}")]
    ReadFrame(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, HlsError>;
