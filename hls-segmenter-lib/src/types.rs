use ffmpeg_next as ffmpeg;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Role a selected source track plays in the output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackRole {
    Video,
    Audio,
}

/// A source track carried into the segments
#[derive(Debug, Clone, Copy)]
pub struct Track {
    pub role: TrackRole,
    pub source_index: usize,
    pub source_time_base: ffmpeg::Rational,
    pub output_index: usize,
    /// Known once the container header has been written
    pub output_time_base: ffmpeg::Rational,
}

/// A sealed segment as tracked by the sliding window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentEntry {
    /// 1-based, never reused within a run
    pub index: u64,
    pub path: PathBuf,
    /// Whole seconds, at least 1
    pub duration_secs: u32,
}

/// Naming scheme for segment files: `{dir}/{prefix}-{index}{extension}`
#[derive(Debug, Clone)]
pub struct SegmentNaming {
    pub output_dir: PathBuf,
    pub prefix: String,
    pub extension: String,
}

impl SegmentNaming {
    pub fn new(output_dir: impl Into<PathBuf>, prefix: &str, extension: &str) -> Self {
        Self {
            output_dir: output_dir.into(),
            prefix: prefix.to_string(),
            extension: extension.to_string(),
        }
    }

    /// File name as it appears in the playlist
    pub fn file_name(&self, index: u64) -> String {
        format!("{}-{}{}", self.prefix, index, self.extension)
    }

    pub fn path(&self, index: u64) -> PathBuf {
        self.output_dir.join(self.file_name(index))
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

/// Outcome of a complete segmentation run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SegmentationReport {
    /// Segments sealed during the run, including evicted ones
    pub segments_created: u64,
    /// Segments listed in the last published playlist
    pub segments_listed: usize,
    pub media_sequence: u64,
    /// Sum of the declared durations of every sealed segment
    pub total_duration_secs: u64,
    pub packets_written: u64,
    pub packets_dropped: u64,
    pub write_failures: u64,
    pub manifest_failures: u64,
    /// Whether the playlist carrying `#EXT-X-ENDLIST` was published
    pub finished: bool,
}
