//! Segment generation module
//!
//! This module cuts the source into MPEG-TS segments:
//! - `boundary`: keyframe-aligned cut decisions
//! - `window`: the sliding window of published segments
//! - `muxer`: the FFmpeg output context shared by all segment files
//! - `engine`: the packet loop tying them together

pub mod boundary;
pub mod engine;
pub mod muxer;
pub mod window;

pub use engine::{EngineState, Segmenter};
pub use muxer::SegmentMuxer;
pub use window::SlidingWindow;
