//! The segment advancement engine.
//!
//! [`ProgressEngine`] owns the per-segment progress, the active index, the
//! paused flag and at most one clock subscription. Every method takes
//! `&mut self`; hosts that tick from another task serialize access themselves
//! (see `storybar-player`).

use crate::clock::{ClockHandle, SubscriptionId, TimingClock};
use crate::config::SegmentConfig;
use crate::error::Result;
use crate::observer::{SegmentFrame, SegmentObserver, SegmentRenderer};
use crate::segment::SegmentState;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Playback state derived from the engine fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaybackState {
    /// No clock subscription and not finished
    Idle,
    /// Clock subscribed, ticks advance progress
    Running,
    /// Clock subscribed, ticks ignored
    Paused,
    /// Last segment filled and the clock released
    Finished,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackState::Idle => write!(f, "idle"),
            PlaybackState::Running => write!(f, "running"),
            PlaybackState::Paused => write!(f, "paused"),
            PlaybackState::Finished => write!(f, "finished"),
        }
    }
}

/// Segment progress state machine.
pub struct ProgressEngine {
    config: SegmentConfig,
    segments: Vec<SegmentState>,
    current_index: usize,
    is_paused: bool,
    clock: Box<dyn TimingClock>,
    clock_handle: Option<ClockHandle>,
    next_subscription: SubscriptionId,
    observer: Option<Weak<dyn SegmentObserver>>,
    renderer: Option<Weak<dyn SegmentRenderer>>,
}

impl ProgressEngine {
    /// Create an engine for `config`, driven by `clock`.
    ///
    /// Fails if the configuration does not validate.
    pub fn new(config: SegmentConfig, clock: impl TimingClock + 'static) -> Result<Self> {
        config.validate()?;
        debug!(
            segments = config.segment_count,
            duration = config.segment_duration,
            "creating progress engine"
        );

        Ok(Self {
            segments: vec![SegmentState::new(config.duration()); config.segment_count],
            config,
            current_index: 0,
            is_paused: false,
            clock: Box::new(clock),
            clock_handle: None,
            next_subscription: SubscriptionId::new(0),
            observer: None,
            renderer: None,
        })
    }

    /// Register the completion observer. The engine keeps only a weak reference.
    pub fn set_observer<O: SegmentObserver + 'static>(&mut self, observer: &Arc<O>) {
        let weak: Weak<O> = Arc::downgrade(observer);
        self.observer = Some(weak);
    }

    /// Forget the observer.
    pub fn clear_observer(&mut self) {
        self.observer = None;
    }

    /// Register the renderer and draw the current state once.
    pub fn set_renderer<R: SegmentRenderer + 'static>(&mut self, renderer: &Arc<R>) {
        let weak: Weak<R> = Arc::downgrade(renderer);
        self.renderer = Some(weak);
        self.notify_renderer();
    }

    /// Forget the renderer.
    pub fn clear_renderer(&mut self) {
        self.renderer = None;
    }

    // === Clock entry points ===

    /// Advance the active segment by `tick_delta` of wall-clock time.
    ///
    /// Ignored while paused or when there is no segment to fill. When the
    /// segment fills, the observer hears about it before the next segment is
    /// touched; after the last segment the clock is released.
    pub fn advance(&mut self, tick_delta: Duration) {
        if self.step(tick_delta) {
            self.notify_renderer();
        }
    }

    /// Deliver a tick from whichever subscription is active.
    ///
    /// Does nothing when no clock is subscribed.
    pub fn tick(&mut self, delta: Duration) {
        if self.clock_handle.is_some() {
            self.advance(delta);
        }
    }

    /// Deliver a tick produced by `subscription`.
    ///
    /// Ticks from a released subscription are dropped.
    pub fn on_tick(&mut self, subscription: SubscriptionId, delta: Duration) {
        if self.active_subscription() == Some(subscription) {
            self.advance(delta);
        } else {
            trace!(%subscription, "dropping stale tick");
        }
    }

    // === Lifecycle ===

    /// Subscribe to the clock if not already subscribed.
    pub fn start(&mut self) {
        if self.subscribe_clock() {
            self.notify_renderer();
        }
    }

    /// Ignore ticks until [`resume`](Self::resume). The subscription stays alive.
    pub fn pause(&mut self) {
        self.is_paused = true;
        self.notify_renderer();
    }

    /// Stop ignoring ticks.
    pub fn resume(&mut self) {
        self.is_paused = false;
        self.notify_renderer();
    }

    /// [`reset`](Self::reset) then [`start`](Self::start).
    pub fn restart(&mut self) {
        self.reset();
        self.start();
    }

    /// Release the clock, empty every segment and return to the first one.
    pub fn reset(&mut self) {
        self.release_clock();
        self.segments.iter_mut().for_each(SegmentState::clear);
        self.current_index = 0;
        self.is_paused = false;
        debug!("engine reset");
        self.notify_renderer();
    }

    // === Navigation ===

    /// Mark the active segment full and move to the next one.
    ///
    /// No completion event is emitted. Ignored on the last segment.
    pub fn next_segment(&mut self) {
        if self.current_index + 1 >= self.segments.len() {
            debug!(index = self.current_index, "next_segment ignored at last segment");
            return;
        }

        self.segments[self.current_index].fill();
        self.current_index += 1;
        debug!(index = self.current_index, "skipped to next segment");
        self.refresh_clock();
    }

    /// Empty the active segment and the one before it, and step back.
    ///
    /// Ignored on the first segment.
    pub fn previous_segment(&mut self) {
        if self.current_index == 0 {
            debug!("previous_segment ignored at first segment");
            return;
        }

        self.segments[self.current_index].clear();
        self.current_index -= 1;
        self.segments[self.current_index].clear();
        debug!(index = self.current_index, "stepped back to previous segment");
        self.refresh_clock();
    }

    /// Empty the active segment without moving.
    pub fn restart_current_segment(&mut self) {
        let Some(segment) = self.segments.get_mut(self.current_index) else {
            return;
        };

        segment.clear();
        debug!(index = self.current_index, "restarted current segment");
        self.refresh_clock();
    }

    /// Seek to `percentage` (0-100) of segment `index` and stop the clock.
    ///
    /// Out-of-range indices are ignored. The percentage is clamped to
    /// `[0, 100]`. Call [`start`](Self::start) to resume playback.
    pub fn set_progress_manually(&mut self, index: usize, percentage: f64) {
        if index >= self.segments.len() {
            debug!(index, count = self.segments.len(), "seek index out of range");
            return;
        }
        if percentage.is_nan() {
            warn!(index, "ignoring NaN seek percentage");
            return;
        }

        self.release_clock();
        self.current_index = index;
        self.segments[index].set_progress(percentage.clamp(0.0, 100.0) / 100.0);
        debug!(index, percentage, "progress set manually");
        self.notify_renderer();
    }

    // === Read-only state ===

    /// Whether ticks are being ignored.
    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    /// Active segment index.
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Number of segments.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Progress of segment `index`, if it exists.
    pub fn progress(&self, index: usize) -> Option<f64> {
        self.segments.get(index).map(SegmentState::progress)
    }

    /// Progress of every segment in order.
    pub fn progress_values(&self) -> Vec<f64> {
        self.segments.iter().map(SegmentState::progress).collect()
    }

    /// Whether a clock subscription is held.
    pub fn is_clock_active(&self) -> bool {
        self.clock_handle.is_some()
    }

    /// The subscription currently allowed to tick.
    pub fn active_subscription(&self) -> Option<SubscriptionId> {
        self.clock_handle.as_ref().map(ClockHandle::id)
    }

    /// Derived playback state.
    pub fn state(&self) -> PlaybackState {
        match (self.clock_handle.is_some(), self.is_paused) {
            (true, true) => PlaybackState::Paused,
            (true, false) => PlaybackState::Running,
            (false, _) if self.is_finished() => PlaybackState::Finished,
            (false, _) => PlaybackState::Idle,
        }
    }

    /// Configuration the engine was built with.
    pub fn config(&self) -> &SegmentConfig {
        &self.config
    }

    /// Hand a snapshot of the current state to `f`.
    pub fn with_frame<T>(&self, f: impl FnOnce(&SegmentFrame<'_>) -> T) -> T {
        let progress = self.progress_values();
        let frame = SegmentFrame {
            progress: &progress,
            current_index: self.current_index,
            is_paused: self.is_paused,
            state: self.state(),
            style: &self.config.style,
        };
        f(&frame)
    }

    // === Internals ===

    /// Apply a tick without rendering. Returns whether anything was applied.
    fn step(&mut self, tick_delta: Duration) -> bool {
        if self.is_paused || self.current_index >= self.segments.len() {
            return false;
        }

        let index = self.current_index;
        if self.segments[index].advance_by(tick_delta) {
            let is_last = index + 1 == self.segments.len();
            debug!(index, is_last, "segment finished");
            self.notify_finished(index, is_last);

            if is_last {
                self.release_clock();
            } else {
                self.segments[index + 1].clear();
                self.current_index += 1;
            }
        }

        true
    }

    /// Refresh after navigation: re-evaluate if a clock is held, otherwise start one.
    fn refresh_clock(&mut self) {
        if self.clock_handle.is_some() {
            self.step(Duration::ZERO);
        } else {
            self.subscribe_clock();
        }
        self.notify_renderer();
    }

    fn subscribe_clock(&mut self) -> bool {
        if self.clock_handle.is_some() {
            return false;
        }
        if self.segments.is_empty() {
            debug!("no segments to animate, clock not started");
            return false;
        }

        let id = self.next_subscription;
        self.next_subscription = id.next();
        self.clock_handle = Some(self.clock.subscribe(id));
        debug!(%id, "clock subscribed");
        true
    }

    fn release_clock(&mut self) {
        if let Some(handle) = self.clock_handle.take() {
            debug!(id = %handle.id(), "clock released");
            handle.release();
        }
    }

    fn is_finished(&self) -> bool {
        self.segments
            .last()
            .is_some_and(|last| last.is_complete() && self.current_index + 1 == self.segments.len())
    }

    fn notify_finished(&self, index: usize, is_last: bool) {
        if let Some(observer) = self.observer.as_ref().and_then(Weak::upgrade) {
            observer.on_segment_finished(index, is_last);
        }
    }

    fn notify_renderer(&self) {
        if let Some(renderer) = self.renderer.as_ref().and_then(Weak::upgrade) {
            self.with_frame(|frame| renderer.render(frame));
        }
    }
}

impl fmt::Debug for ProgressEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressEngine")
            .field("segments", &self.segments)
            .field("current_index", &self.current_index)
            .field("is_paused", &self.is_paused)
            .field("clock_handle", &self.clock_handle)
            .finish_non_exhaustive()
    }
}
