pub(crate) mod api;
pub mod config;
pub(crate) mod error;
pub(crate) mod ffmpeg_utils;
pub mod media;
pub mod playlist;
pub mod segment;
pub mod types;

#[cfg(test)]
pub(crate) mod tests;

pub use api::*;
pub use config::{SegmenterOptions, DEFAULT_CONTAINER_FORMAT, DEFAULT_SEGMENT_LIMIT};
pub use error::{FfmpegError, HlsError, Result};
pub use ffmpeg_utils::context::InputContext;
pub use ffmpeg_utils::ffmpeg;
pub use ffmpeg_utils::version_info as ffmpeg_version_info;
pub use ffmpeg_utils::{init, install_log_filter};
pub use media::{PacketSource, SegmentSink, StreamDescriptor};
pub use segment::{EngineState, SegmentMuxer, Segmenter};
pub use types::{SegmentEntry, SegmentNaming, SegmentationReport};
