//! Media playlist generator and atomic publisher
//!
//! The playlist is rendered in full, written to `<manifest>.tmp` next to the
//! final path, then renamed over it.  A reader polling the manifest path sees
//! either the previous complete playlist or the new one, never a partial
//! write.

use std::collections::VecDeque;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{HlsError, Result};
use crate::types::{SegmentEntry, SegmentNaming};

/// HLS protocol version declared in every playlist
pub const PROTOCOL_VERSION: u32 = 3;

/// Render the playlist for `segments`, or `None` if there is nothing to list.
pub fn render_media_playlist(
    segments: &VecDeque<SegmentEntry>,
    media_sequence: u64,
    naming: &SegmentNaming,
    is_final: bool,
) -> Option<String> {
    if segments.is_empty() {
        return None;
    }

    let mut output = String::new();

    // Header
    output.push_str("#EXTM3U\n");
    output.push_str(&format!("#EXT-X-VERSION:{}\n", PROTOCOL_VERSION));
    output.push_str(&format!("#EXT-X-MEDIA-SEQUENCE:{}\n", media_sequence));
    output.push_str(&format!(
        "#EXT-X-TARGETDURATION:{}\n",
        calculate_target_duration(segments)
    ));

    for segment in segments {
        output.push_str(&format!("#EXTINF:{},\n", segment.duration_secs));
        output.push_str(&naming.file_name(segment.index));
        output.push('\n');
    }

    if is_final {
        output.push_str("#EXT-X-ENDLIST\n");
    }

    Some(output)
}

/// Largest declared duration among the listed segments
pub fn calculate_target_duration(segments: &VecDeque<SegmentEntry>) -> u32 {
    segments
        .iter()
        .map(|s| s.duration_secs)
        .max()
        .unwrap_or(0)
}

/// Writes the playlist for the current window to a fixed path
#[derive(Debug, Clone)]
pub struct ManifestWriter {
    path: PathBuf,
    tmp_path: PathBuf,
    naming: SegmentNaming,
}

impl ManifestWriter {
    pub fn new(path: impl Into<PathBuf>, naming: SegmentNaming) -> Self {
        let path = path.into();
        let tmp_path = tmp_path_for(&path);
        Self {
            path,
            tmp_path,
            naming,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn tmp_path(&self) -> &Path {
        &self.tmp_path
    }

    /// Publish the playlist for `segments`.  Returns `Ok(false)` without
    /// touching the filesystem when `segments` is empty.
    pub fn publish(
        &self,
        segments: &VecDeque<SegmentEntry>,
        media_sequence: u64,
        is_final: bool,
    ) -> Result<bool> {
        let Some(content) = render_media_playlist(segments, media_sequence, &self.naming, is_final)
        else {
            return Ok(false);
        };

        self.write_atomic(content.as_bytes())
            .map_err(|source| HlsError::ManifestWrite {
                path: self.path.clone(),
                tmp_path: self.tmp_path.clone(),
                source,
            })?;

        tracing::debug!(
            "Published {:?}: sequence={}, segments={}, final={}",
            self.path,
            media_sequence,
            segments.len(),
            is_final
        );

        Ok(true)
    }

    fn write_atomic(&self, content: &[u8]) -> std::io::Result<()> {
        let mut file = std::fs::File::create(&self.tmp_path)?;
        file.write_all(content)?;
        file.flush()?;
        drop(file);
        std::fs::rename(&self.tmp_path, &self.path)
    }
}

/// Sibling temporary path: `<manifest>.tmp`
fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}
