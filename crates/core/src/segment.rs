//! Per-segment progress state.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Elapsed time within this much of the duration counts as complete.
///
/// Absorbs nanosecond rounding when float-second durations become [`Duration`]s.
const COMPLETION_SLACK: Duration = Duration::from_micros(1);

/// Fill level of one segment, tracked as elapsed time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentState {
    /// Time played so far, never more than `duration`
    elapsed: Duration,
    /// Time the segment takes to fill
    duration: Duration,
}

impl SegmentState {
    /// An empty segment filling over `duration`.
    pub fn new(duration: Duration) -> Self {
        Self {
            elapsed: Duration::ZERO,
            duration,
        }
    }

    /// Current fraction filled, within `[0, 1]`.
    pub fn progress(&self) -> f64 {
        if self.duration.is_zero() || self.is_complete() {
            return 1.0;
        }
        (self.elapsed.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }

    /// Time played so far.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Set the fraction, clamped into `[0, 1]`.
    pub fn set_progress(&mut self, progress: f64) {
        let fraction = progress.clamp(0.0, 1.0);
        self.elapsed = if fraction >= 1.0 {
            self.duration
        } else {
            self.duration.mul_f64(fraction)
        };
    }

    /// Play `delta` more time, saturating at full. Returns whether the segment is full.
    pub fn advance_by(&mut self, delta: Duration) -> bool {
        let elapsed = self.elapsed.saturating_add(delta);
        self.elapsed = if elapsed.saturating_add(COMPLETION_SLACK) >= self.duration {
            self.duration
        } else {
            elapsed
        };
        self.is_complete()
    }

    /// Whether the segment is full.
    pub fn is_complete(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// Empty the segment.
    pub fn clear(&mut self) {
        self.elapsed = Duration::ZERO;
    }

    /// Fill the segment.
    pub fn fill(&mut self) {
        self.elapsed = self.duration;
    }
}
