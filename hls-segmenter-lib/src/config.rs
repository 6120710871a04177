//! Segmenter options

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::{HlsError, Result};
use crate::types::SegmentNaming;

/// Absolute number of segments one run may produce
pub const DEFAULT_SEGMENT_LIMIT: u64 = 4096;

/// Output container used for segments
pub const DEFAULT_CONTAINER_FORMAT: &str = "mpegts";

/// Options for a single segmentation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmenterOptions {
    /// Source media file
    pub input: PathBuf,

    /// Directory receiving the segment files
    pub output_dir: PathBuf,

    /// Playlist path, used as given
    pub manifest_path: PathBuf,

    /// Segment file name prefix (`{prefix}-{index}{extension}`)
    pub segment_prefix: String,

    /// Segment file name extension, including the dot
    pub segment_extension: String,

    /// Target segment duration in seconds
    pub target_duration_secs: u32,

    /// Number of segments kept in the playlist; 0 keeps all of them (VOD)
    pub window_size: usize,

    /// Hard cap on segments produced in one run
    pub segment_limit: u64,

    /// FFmpeg muxer name
    pub container_format: String,

    /// Options passed to the muxer when writing the header
    #[serde(default)]
    pub muxer_options: BTreeMap<String, String>,

    /// Abort the run when an intermediate playlist update fails
    #[serde(default)]
    pub strict_manifest: bool,
}

impl Default for SegmenterOptions {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output_dir: PathBuf::from("."),
            manifest_path: PathBuf::from("index.m3u8"),
            segment_prefix: "segment".to_string(),
            segment_extension: ".ts".to_string(),
            target_duration_secs: 10,
            window_size: 0,
            segment_limit: DEFAULT_SEGMENT_LIMIT,
            container_format: DEFAULT_CONTAINER_FORMAT.to_string(),
            muxer_options: BTreeMap::new(),
            strict_manifest: false,
        }
    }
}

impl SegmenterOptions {
    pub fn new(
        input: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        manifest_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            input: input.into(),
            output_dir: output_dir.into(),
            manifest_path: manifest_path.into(),
            ..Default::default()
        }
    }

    /// Check the options before any file is touched
    pub fn validate(&self) -> Result<()> {
        if self.target_duration_secs == 0 {
            return Err(HlsError::Config(
                "segment duration must be positive".to_string(),
            ));
        }
        if self.segment_prefix.is_empty() {
            return Err(HlsError::Config(
                "segment prefix must not be empty".to_string(),
            ));
        }
        if self.segment_prefix.contains('/') || self.segment_extension.contains('/') {
            return Err(HlsError::Config(format!(
                "segment name {:?}/{:?} must not contain a path separator",
                self.segment_prefix, self.segment_extension
            )));
        }
        if self.segment_limit == 0 {
            return Err(HlsError::Config(
                "segment limit must be positive".to_string(),
            ));
        }
        if self.container_format.is_empty() {
            return Err(HlsError::Config(
                "container format must not be empty".to_string(),
            ));
        }
        if self.manifest_path.as_os_str().is_empty() {
            return Err(HlsError::Config("manifest path must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn naming(&self) -> SegmentNaming {
        SegmentNaming::new(
            self.output_dir.clone(),
            &self.segment_prefix,
            &self.segment_extension,
        )
    }
}
