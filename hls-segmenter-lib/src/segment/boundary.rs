//! Keyframe-aligned segment boundary detection

use crate::types::TrackRole;

/// Slack subtracted from the target duration when deciding a cut, absorbing
/// keyframe-interval jitter in the source encoding.
pub const CUT_TOLERANCE_SECS: f64 = 0.25;

/// What the engine should do with a packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Not on a selected track, or still waiting for the first keyframe
    Drop,
    /// Write into the currently open segment
    Write,
    /// Seal the open segment; the packet starts the next one
    Cut,
}

/// Per-packet view the detector needs
#[derive(Debug, Clone, Copy)]
pub struct PacketView {
    /// `None` for packets of tracks that were not selected
    pub role: Option<TrackRole>,
    /// Presentation time in seconds, when known
    pub time: Option<f64>,
    pub is_key: bool,
}

#[derive(Debug, Clone)]
pub struct BoundaryDetector {
    target_duration: f64,
    awaiting_first_keyframe: bool,
    segment_start_time: f64,
}

impl BoundaryDetector {
    pub fn new(target_duration_secs: u32) -> Self {
        Self {
            target_duration: target_duration_secs as f64,
            awaiting_first_keyframe: true,
            segment_start_time: 0.0,
        }
    }

    pub fn awaiting_first_keyframe(&self) -> bool {
        self.awaiting_first_keyframe
    }

    /// Time at which the currently open segment began
    pub fn segment_start_time(&self) -> f64 {
        self.segment_start_time
    }

    /// Classify `packet`.  On `Cut`, the packet's time becomes the start of
    /// the next segment.
    pub fn should_cut(&mut self, packet: &PacketView) -> Decision {
        let Some(role) = packet.role else {
            return Decision::Drop;
        };
        let video_key_time = match (role, packet.is_key, packet.time) {
            (TrackRole::Video, true, Some(time)) => Some(time),
            _ => None,
        };

        if self.awaiting_first_keyframe {
            return match video_key_time {
                Some(time) => {
                    self.awaiting_first_keyframe = false;
                    self.segment_start_time = time;
                    Decision::Write
                }
                None => Decision::Drop,
            };
        }

        match video_key_time {
            Some(time) if time - self.segment_start_time >= self.target_duration - CUT_TOLERANCE_SECS => {
                self.segment_start_time = time;
                Decision::Cut
            }
            _ => Decision::Write,
        }
    }
}
