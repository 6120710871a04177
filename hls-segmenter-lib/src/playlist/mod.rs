//! Playlist generation module
//!
//! This module handles the HLS media playlist:
//! - Header with protocol version, media sequence and target duration
//! - One `#EXTINF` entry per segment in the current window
//! - `#EXT-X-ENDLIST` once the source is exhausted
//! - Atomic publication via a temporary sibling file

pub mod manifest;

pub use manifest::{render_media_playlist, ManifestWriter};
