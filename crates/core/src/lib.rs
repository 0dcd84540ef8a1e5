//! Storybar core: the segmented progress engine.
//!
//! This crate holds the data model, configuration and the
//! [`ProgressEngine`] state machine that fills a row of fixed-duration
//! segments one after another, the way story viewers do.

#![warn(missing_docs)]

// Data model
mod color;
mod config;
mod segment;

// Engine and collaborators
mod clock;
mod engine;
mod error;
mod observer;

// Re-exports
pub use color::{ColorParseError, Rgba};
pub use config::{
    CornerStyle, SegmentConfig, SegmentDataSource, SegmentStyle, DEFAULT_PADDING,
    DEFAULT_SEGMENT_DURATION,
};
pub use segment::SegmentState;

pub use clock::{
    ClockHandle, ClockMonitor, ClockTick, ManualClock, ManualClockStats, SubscriptionId, TimingClock,
};
pub use engine::{PlaybackState, ProgressEngine};
pub use error::{ConfigError, Result};
pub use observer::{SegmentEvent, SegmentFrame, SegmentObserver, SegmentRenderer};
