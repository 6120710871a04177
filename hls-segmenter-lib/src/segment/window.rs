//! Sliding window of published segments
//!
//! Holds the segments currently advertised by the playlist, oldest first.
//! In live mode (`max_size > 0`) admitting a segment past the limit evicts
//! the oldest one and deletes its file; in VOD mode (`max_size == 0`) the
//! window only grows.

use std::collections::VecDeque;

use crate::types::SegmentEntry;

#[derive(Debug, Clone)]
pub struct SlidingWindow {
    entries: VecDeque<SegmentEntry>,
    /// Media sequence number of the oldest entry
    media_sequence: u64,
    max_size: usize,
    ended: bool,
}

impl SlidingWindow {
    /// `max_size == 0` means unbounded
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            media_sequence: 1,
            max_size,
            ended: false,
        }
    }

    /// Append a sealed segment, evicting the oldest one if the window is
    /// over its limit.  Returns the evicted entry.
    pub fn admit(&mut self, entry: SegmentEntry) -> Option<SegmentEntry> {
        debug_assert!(
            self.entries
                .back()
                .map_or(true, |last| last.index + 1 == entry.index),
            "segment indices must be contiguous"
        );
        if self.entries.is_empty() {
            self.media_sequence = entry.index;
        }
        self.entries.push_back(entry);

        if self.max_size == 0 || self.entries.len() <= self.max_size {
            return None;
        }

        let evicted = self.entries.pop_front()?;
        self.media_sequence += 1;
        remove_segment_file(&evicted);
        Some(evicted)
    }

    /// Mark the stream as complete; the next playlist carries the end marker.
    pub fn finish(&mut self) {
        self.ended = true;
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn entries(&self) -> &VecDeque<SegmentEntry> {
        &self.entries
    }

    pub fn media_sequence(&self) -> u64 {
        self.media_sequence
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

fn remove_segment_file(entry: &SegmentEntry) {
    match std::fs::remove_file(&entry.path) {
        Ok(()) => tracing::info!("Evicted segment {}: {:?}", entry.index, entry.path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("Evicted segment {} already gone: {:?}", entry.index, entry.path)
        }
        Err(e) => tracing::warn!(
            "Failed to delete evicted segment {}: {}",
            entry.path.display(),
            e
        ),
    }
}
