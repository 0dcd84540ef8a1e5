//! Tokio host for the storybar engine.
//!
//! A [`Player`] owns one [`ProgressEngine`](storybar_core::ProgressEngine)
//! inside a single task. Commands from any number of [`PlayerHandle`]s and
//! ticks from the [`IntervalClock`] arrive on channels and are applied one
//! at a time, so the engine never sees concurrent calls.

#![warn(missing_docs)]

pub mod clock;
pub mod error;
pub mod player;

pub use clock::IntervalClock;
pub use error::{PlayerError, Result};
pub use player::{ChannelObserver, Player, PlayerCommand, PlayerConfig, PlayerHandle, PlayerStatus};
