//! Player errors.

use storybar_core::ConfigError;

/// Result alias for player operations.
pub type Result<T> = std::result::Result<T, PlayerError>;

/// Errors that can occur while building or talking to a player.
#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    /// The player task has stopped
    #[error("player is no longer running")]
    Closed,

    /// No tokio runtime to spawn clock tasks on
    #[error("a tokio runtime is required to drive the clock")]
    NoRuntime,

    /// Frame rate of zero
    #[error("frames per second must be at least 1, got {0}")]
    InvalidFrameRate(u32),

    /// Segment configuration rejected
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}
