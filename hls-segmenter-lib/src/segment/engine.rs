//! Segmentation engine
//!
//! Pulls packets from a [`PacketSource`] one at a time, drops everything
//! before the first video keyframe, cuts a new segment on every video
//! keyframe once the target duration has elapsed, and republishes the
//! playlist after each sealed segment.
//!
//! ```text
//! Init -> AwaitKeyframe -> Segmenting -> (seal) -> Segmenting ... -> Finalized
//! ```

use ffmpeg_next as ffmpeg;

use crate::config::SegmenterOptions;
use crate::error::{HlsError, Result};
use crate::ffmpeg_utils::utils::{pts_to_seconds, rescale_packet};
use crate::media::{PacketSource, SegmentSink, StreamDescriptor};
use crate::playlist::ManifestWriter;
use crate::types::{SegmentEntry, SegmentNaming, SegmentationReport, Track, TrackRole};

use super::boundary::{BoundaryDetector, Decision, PacketView};
use super::window::SlidingWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Init,
    AwaitKeyframe,
    Segmenting,
    Finalized,
}

/// Timing derived from the video track, in seconds
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaybackClock {
    /// Time of the last video packet seen
    pub current: f64,
    /// Time of the last video packet written
    pub previous_video: f64,
}

pub struct Segmenter<S: PacketSource, K: SegmentSink> {
    source: S,
    sink: K,
    options: SegmenterOptions,
    naming: SegmentNaming,
    tracks: Vec<Track>,
    detector: BoundaryDetector,
    window: SlidingWindow,
    manifest: ManifestWriter,
    clock: PlaybackClock,
    state: EngineState,
    /// Index of the segment currently open in the sink
    current_index: u64,
    report: SegmentationReport,
}

impl<S: PacketSource, K: SegmentSink> Segmenter<S, K> {
    pub fn new(source: S, sink: K, options: SegmenterOptions) -> Result<Self> {
        options.validate()?;

        let naming = options.naming();
        let manifest = ManifestWriter::new(options.manifest_path.clone(), naming.clone());

        Ok(Self {
            source,
            sink,
            detector: BoundaryDetector::new(options.target_duration_secs),
            window: SlidingWindow::new(options.window_size),
            naming,
            manifest,
            options,
            tracks: Vec::new(),
            clock: PlaybackClock::default(),
            state: EngineState::Init,
            current_index: 0,
            report: SegmentationReport::default(),
        })
    }

    /// Process the whole source.  Fatal errors abort the run; the report
    /// gathered so far stays available through [`Segmenter::report`].
    pub fn run(&mut self) -> Result<SegmentationReport> {
        if self.state != EngineState::Init {
            return Err(HlsError::Config("segmenter has already run".to_string()));
        }

        self.init()?;

        loop {
            let packet = match self.source.read_packet() {
                Ok(Some(packet)) => packet,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!("Stopping at read error, finalizing: {}", e);
                    break;
                }
            };
            self.process_packet(packet)?;
        }

        self.finalize()?;
        Ok(self.report.clone())
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn report(&self) -> &SegmentationReport {
        &self.report
    }

    pub fn window(&self) -> &SlidingWindow {
        &self.window
    }

    pub fn clock(&self) -> PlaybackClock {
        self.clock
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    fn init(&mut self) -> Result<()> {
        let streams = self.source.streams();
        let video = streams
            .iter()
            .find(|s| s.medium == ffmpeg::media::Type::Video)
            .ok_or(HlsError::NoVideoStream)?;
        let audio = streams
            .iter()
            .find(|s| s.medium == ffmpeg::media::Type::Audio);

        tracing::info!("Video stream: index {}", video.index);
        if let Some(audio) = audio {
            tracing::info!("Audio stream: index {}", audio.index);
        }
        for skipped in streams
            .iter()
            .filter(|s| s.index != video.index && Some(s.index) != audio.map(|a| a.index))
        {
            tracing::debug!(
                "Dropping stream {} ({})",
                skipped.index,
                crate::ffmpeg_utils::utils::media_type_name(skipped.medium)
            );
        }

        let video_track = self.add_track(TrackRole::Video, video)?;
        self.tracks.push(video_track);
        if let Some(audio) = audio {
            let audio_track = self.add_track(TrackRole::Audio, audio)?;
            self.tracks.push(audio_track);
        }

        self.open_segment(1)?;
        self.sink.write_header()?;

        for track in &mut self.tracks {
            if let Some(tb) = self.sink.output_time_base(track.output_index) {
                track.output_time_base = tb;
            }
        }

        self.state = EngineState::AwaitKeyframe;
        Ok(())
    }

    fn add_track(&mut self, role: TrackRole, stream: &StreamDescriptor) -> Result<Track> {
        let output_index = self.sink.add_stream(stream)?;
        Ok(Track {
            role,
            source_index: stream.index,
            source_time_base: stream.time_base,
            output_index,
            output_time_base: stream.time_base,
        })
    }

    fn track_for(&self, source_index: usize) -> Option<Track> {
        self.tracks
            .iter()
            .find(|t| t.source_index == source_index)
            .copied()
    }

    fn process_packet(&mut self, mut packet: ffmpeg::Packet) -> Result<()> {
        let track = self.track_for(packet.stream());
        // Video packets without any timestamp keep the previous time.
        let time = track.filter(|t| t.role == TrackRole::Video).map(|t| {
            packet
                .pts()
                .or(packet.dts())
                .map_or(self.clock.current, |ts| pts_to_seconds(ts, t.source_time_base))
        });
        if let Some(time) = time {
            self.clock.current = time;
        }

        let segment_start = self.detector.segment_start_time();
        let decision = self.detector.should_cut(&PacketView {
            role: track.map(|t| t.role),
            time,
            is_key: packet.is_key(),
        });

        let track = match (decision, track) {
            (Decision::Drop, track) => {
                if track.is_some() {
                    self.report.packets_dropped += 1;
                }
                return Ok(());
            }
            (_, Some(track)) => track,
            (_, None) => return Ok(()),
        };

        if self.state == EngineState::AwaitKeyframe {
            tracing::info!(
                "First keyframe at {:.3}s, dropped {} packets before it",
                self.detector.segment_start_time(),
                self.report.packets_dropped
            );
            self.state = EngineState::Segmenting;
        } else if decision == Decision::Cut {
            self.seal_segment(segment_start)?;
            self.open_segment(self.current_index + 1)?;
        }

        if let Some(time) = time {
            self.clock.previous_video = time;
        }

        rescale_packet(&mut packet, track.source_time_base, track.output_time_base);
        packet.set_stream(track.output_index);
        match self.sink.write_packet(&mut packet) {
            Ok(()) => self.report.packets_written += 1,
            Err(e) => {
                self.report.write_failures += 1;
                tracing::warn!(
                    "Dropping packet for segment {}: {}",
                    self.current_index,
                    e
                );
            }
        }

        Ok(())
    }

    fn open_segment(&mut self, index: u64) -> Result<()> {
        let path = self.naming.path(index);
        self.sink.open_segment(&path)?;
        self.current_index = index;
        tracing::info!("Starting segment {}: {:?}", index, path);
        Ok(())
    }

    /// Close the open segment, hand it to the window and republish.
    fn seal_segment(&mut self, segment_start: f64) -> Result<()> {
        self.sink.close_segment()?;
        self.admit_current(segment_start);
        self.publish(false)?;

        if self.report.segments_created >= self.options.segment_limit {
            tracing::error!(
                "Segment limit reached ({} segments)",
                self.options.segment_limit
            );
            self.state = EngineState::Finalized;
            return Err(HlsError::SegmentLimit {
                limit: self.options.segment_limit,
            });
        }
        Ok(())
    }

    fn admit_current(&mut self, segment_start: f64) {
        let entry = SegmentEntry {
            index: self.current_index,
            path: self.naming.path(self.current_index),
            duration_secs: sealed_duration(self.clock.previous_video, segment_start),
        };
        tracing::debug!(
            "Sealed segment {} ({}s)",
            entry.index,
            entry.duration_secs
        );

        self.report.segments_created += 1;
        self.report.total_duration_secs += entry.duration_secs as u64;
        self.window.admit(entry);
        self.report.segments_listed = self.window.len();
        self.report.media_sequence = self.window.media_sequence();
    }

    fn publish(&mut self, is_final: bool) -> Result<()> {
        match self
            .manifest
            .publish(self.window.entries(), self.window.media_sequence(), is_final)
        {
            Ok(_) => Ok(()),
            Err(e) if !is_final && !self.options.strict_manifest => {
                self.report.manifest_failures += 1;
                tracing::warn!("Playlist update skipped: {}", e);
                Ok(())
            }
            Err(e) => {
                self.report.manifest_failures += 1;
                Err(e)
            }
        }
    }

    fn finalize(&mut self) -> Result<()> {
        if let Err(e) = self.sink.write_trailer() {
            tracing::warn!("Failed to write trailer: {}", e);
        }
        self.sink.close_segment()?;

        if self.detector.awaiting_first_keyframe() {
            let path = self.naming.path(self.current_index);
            match std::fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!("Failed to remove {}: {}", path.display(), e),
            }
            tracing::warn!("Source ended before the first video keyframe; no segments produced");
            self.state = EngineState::Finalized;
            return Ok(());
        }

        let segment_start = self.detector.segment_start_time();
        self.admit_current(segment_start);
        self.window.finish();
        self.publish(true)?;

        self.report.finished = true;
        self.state = EngineState::Finalized;

        tracing::info!(
            "Segmentation finished at {:.2}s: {} segments created, {} listed",
            self.clock.current,
            self.report.segments_created,
            self.report.segments_listed
        );
        Ok(())
    }
}

/// Declared duration of a sealed segment in whole seconds, at least 1
fn sealed_duration(previous_video_time: f64, segment_start: f64) -> u32 {
    let secs = (previous_video_time - segment_start).round_ties_even();
    if secs < 1.0 {
        1
    } else {
        secs as u32
    }
}
