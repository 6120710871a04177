//! Media container seam
//!
//! The segmentation engine never talks to FFmpeg directly.  It reads packets
//! from a [`PacketSource`] and writes them into a [`SegmentSink`]; the FFmpeg
//! implementations live in `ffmpeg_utils::context` and `segment::muxer`.

use std::path::Path;

use ffmpeg_next as ffmpeg;

use crate::error::Result;

/// Description of one track in the source container.
#[derive(Clone)]
pub struct StreamDescriptor {
    /// Index of the stream in the source container
    pub index: usize,
    pub medium: ffmpeg::media::Type,
    pub time_base: ffmpeg::Rational,
    /// Codec parameters copied onto the output stream
    pub parameters: ffmpeg::codec::Parameters,
}

impl std::fmt::Debug for StreamDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamDescriptor")
            .field("index", &self.index)
            .field("medium", &self.medium)
            .field("time_base", &self.time_base)
            .finish_non_exhaustive()
    }
}

/// Demuxing side of the media container library.
pub trait PacketSource {
    /// Enumerate the tracks of the source, in container order.
    fn streams(&self) -> Vec<StreamDescriptor>;

    /// Read the next packet, or `None` once the source is exhausted.
    ///
    /// `packet.stream()` holds the source stream index.
    fn read_packet(&mut self) -> Result<Option<ffmpeg::Packet>>;
}

/// Muxing side of the media container library.
///
/// One sink produces every segment of a run: the container header is written
/// once, and the backing file is swapped at each segment boundary.
pub trait SegmentSink {
    /// Add an output stream copying the codec parameters of `stream`.
    /// Returns the output stream index.
    fn add_stream(&mut self, stream: &StreamDescriptor) -> Result<usize>;

    /// Create the file at `path` and direct subsequent writes into it.
    fn open_segment(&mut self, path: &Path) -> Result<()>;

    fn write_header(&mut self) -> Result<()>;

    /// Timebase the muxer settled on for an output stream.  Only meaningful
    /// after `write_header`.
    fn output_time_base(&self, index: usize) -> Option<ffmpeg::Rational>;

    /// Write a packet whose stream index and timestamps are already in
    /// output terms.
    fn write_packet(&mut self, packet: &mut ffmpeg::Packet) -> Result<()>;

    /// Flush and close the current segment file.
    fn close_segment(&mut self) -> Result<()>;

    fn write_trailer(&mut self) -> Result<()>;
}
