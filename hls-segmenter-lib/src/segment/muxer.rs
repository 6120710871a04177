//! Segment muxer backed by an FFmpeg output context
//!
//! A single output context is kept for the whole run.  The container header
//! is written once into the first segment file; at each boundary only the
//! AVIO context underneath is swapped for the next file, so the muxer's
//! continuity counters and timestamps carry across segments.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{FfmpegError, Result};
use crate::ffmpeg_utils::helpers;
use crate::media::{SegmentSink, StreamDescriptor};
use ffmpeg_next as ffmpeg;

/// Muxer writing consecutive segment files
pub struct SegmentMuxer {
    output: ffmpeg::format::context::Output,
    format_name: String,
    options: BTreeMap<String, String>,
    current_path: Option<PathBuf>,
    /// Packets may sit in the interleaving queue between header and trailer
    header_written: bool,
    trailer_written: bool,
}

impl SegmentMuxer {
    /// Create a muxer for `format_name` (e.g. `mpegts`).  `options` are
    /// passed to the muxer when the header is written.
    pub fn new(format_name: &str, options: &BTreeMap<String, String>) -> Result<Self> {
        let output = helpers::alloc_output_context(format_name)?;

        tracing::debug!("Created {} muxer", format_name);

        Ok(Self {
            output,
            format_name: format_name.to_string(),
            options: options.clone(),
            current_path: None,
            header_written: false,
            trailer_written: false,
        })
    }

    pub fn format_name(&self) -> &str {
        &self.format_name
    }

    /// Path of the segment currently receiving packets
    pub fn current_path(&self) -> Option<&Path> {
        self.current_path.as_deref()
    }
}

impl SegmentSink for SegmentMuxer {
    fn add_stream(&mut self, stream: &StreamDescriptor) -> Result<usize> {
        let mut out_stream = self
            .output
            .add_stream(ffmpeg::encoder::find(ffmpeg::codec::Id::None))
            .map_err(|e| {
                FfmpegError::StreamConfig(format!(
                    "Failed to add output stream for input {}: {}",
                    stream.index, e
                ))
            })?;

        out_stream.set_parameters(stream.parameters.clone());
        // Reset codec_tag to let the muxer decide the correct tag for the
        // target container.
        helpers::stream_reset_codec_tag(&mut out_stream);
        out_stream.set_time_base(stream.time_base);

        let out_index = out_stream.index();

        tracing::debug!(
            "Added {} stream: input {} -> output {}",
            crate::ffmpeg_utils::utils::media_type_name(stream.medium),
            stream.index,
            out_index
        );

        Ok(out_index)
    }

    fn open_segment(&mut self, path: &Path) -> Result<()> {
        helpers::open_avio(&mut self.output, path)?;
        self.current_path = Some(path.to_path_buf());
        Ok(())
    }

    fn write_header(&mut self) -> Result<()> {
        let mut opts = ffmpeg::Dictionary::new();
        for (key, value) in &self.options {
            opts.set(key, value);
        }

        self.output.write_header_with(opts).map_err(|e| {
            FfmpegError::WriteHeader(format!(
                "{}: {}",
                self.current_path
                    .as_deref()
                    .unwrap_or_else(|| Path::new("<no output>"))
                    .display(),
                e
            ))
        })?;
        self.header_written = true;
        Ok(())
    }

    fn output_time_base(&self, index: usize) -> Option<ffmpeg::Rational> {
        self.output.stream(index).map(|s| s.time_base())
    }

    fn write_packet(&mut self, packet: &mut ffmpeg::Packet) -> Result<()> {
        packet
            .write_interleaved(&mut self.output)
            .map_err(|e| FfmpegError::WritePacket(e.to_string()))?;
        Ok(())
    }

    fn close_segment(&mut self) -> Result<()> {
        // Packets queued for interleaving belong to the segment being closed.
        if self.header_written && !self.trailer_written && helpers::has_avio(&self.output) {
            helpers::flush_interleaved(&mut self.output)?;
        }
        helpers::close_avio(&mut self.output).map_err(|e| {
            FfmpegError::OpenOutput(format!(
                "{}: {}",
                self.current_path
                    .as_deref()
                    .unwrap_or_else(|| Path::new("<no output>"))
                    .display(),
                e
            ))
        })?;
        self.current_path = None;
        Ok(())
    }

    fn write_trailer(&mut self) -> Result<()> {
        self.output
            .write_trailer()
            .map_err(|e| FfmpegError::WriteTrailer(e.to_string()))?;
        self.trailer_written = true;
        Ok(())
    }
}

impl Drop for SegmentMuxer {
    fn drop(&mut self) {
        if helpers::has_avio(&self.output) {
            if let Err(e) = helpers::close_avio(&mut self.output) {
                tracing::debug!("Failed to close segment on drop: {}", e);
            }
        }
    }
}
