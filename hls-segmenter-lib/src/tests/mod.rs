//! Integration testing module
//!
//! End-to-end tests for the segmenter:
//! - Synthetic sources driving the engine through a recording sink
//! - Playlist parsing and validation
//! - Real media through the FFmpeg source and muxer

pub mod scenarios;
