//! FFmpeg input context wrapper, the packet source of a segmentation run

use crate::error::{FfmpegError, Result};
use crate::media::{PacketSource, StreamDescriptor};
use ffmpeg_next as ffmpeg;
use ffmpeg_next::format::input;
use std::path::Path;

/// Wrapper for FFmpeg input context
pub struct InputContext {
    inner: ffmpeg::format::context::Input,
    source_path: std::path::PathBuf,
}

impl InputContext {
    /// Open a media file for reading
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let inner = input(&path).map_err(|e| {
            FfmpegError::OpenInput(format!("Failed to open {}: {}", path.display(), e))
        })?;

        tracing::debug!("Opened input file: {:?}", path);

        Ok(Self {
            inner,
            source_path: path.to_path_buf(),
        })
    }

    /// Get the source file path
    pub fn source_path(&self) -> &std::path::Path {
        &self.source_path
    }

    /// Get the duration of the media in seconds
    pub fn duration(&self) -> f64 {
        self.inner.duration() as f64 / ffmpeg::ffi::AV_TIME_BASE as f64
    }

    /// Get the number of streams
    pub fn num_streams(&self) -> usize {
        self.inner.streams().len()
    }
}

impl PacketSource for InputContext {
    fn streams(&self) -> Vec<StreamDescriptor> {
        self.inner
            .streams()
            .map(|stream| {
                let parameters = stream.parameters();
                StreamDescriptor {
                    index: stream.index(),
                    medium: parameters.medium(),
                    time_base: stream.time_base(),
                    parameters,
                }
            })
            .collect()
    }

    fn read_packet(&mut self) -> Result<Option<ffmpeg::Packet>> {
        let mut packet = ffmpeg::Packet::empty();
        match packet.read(&mut self.inner) {
            Ok(()) => Ok(Some(packet)),
            Err(ffmpeg::Error::Eof) => Ok(None),
            Err(e) => Err(FfmpegError::ReadFrame(format!(
                "{}: {}",
                self.source_path.display(),
                e
            ))
            .into()),
        }
    }
}
