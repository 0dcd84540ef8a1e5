//! Collaborators the engine notifies: an observer for completions and a
//! renderer for state snapshots.

use crate::config::SegmentStyle;
use crate::engine::PlaybackState;
use serde::{Deserialize, Serialize};

/// Receives segment completion callbacks.
pub trait SegmentObserver: Send + Sync {
    /// A segment filled during playback.
    fn on_segment_finished(&self, finished_index: usize, is_last_index: bool);
}

/// Draws the bar from an engine snapshot.
pub trait SegmentRenderer: Send + Sync {
    /// Redraw from `frame`.
    fn render(&self, frame: &SegmentFrame<'_>);
}

/// Borrowed snapshot of engine state handed to a renderer.
#[derive(Debug, Clone, Copy)]
pub struct SegmentFrame<'a> {
    /// Progress of every segment, in playback order
    pub progress: &'a [f64],
    /// Active segment
    pub current_index: usize,
    /// Whether ticks are being ignored
    pub is_paused: bool,
    /// Derived playback state
    pub state: PlaybackState,
    /// Styling to draw with
    pub style: &'a SegmentStyle,
}

impl SegmentFrame<'_> {
    /// Number of segments.
    pub fn len(&self) -> usize {
        self.progress.len()
    }

    /// Whether the bar has no segments.
    pub fn is_empty(&self) -> bool {
        self.progress.is_empty()
    }
}

/// Owned completion event, for hosts that forward completions over channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentEvent {
    /// Segment `index` filled; `is_last` marks the final segment
    Finished {
        /// Finished segment
        index: usize,
        /// Whether it was the last segment
        is_last: bool,
    },
}
