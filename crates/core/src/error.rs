//! Error types for segment configuration.

use crate::color::ColorParseError;

/// Result alias for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur while building or loading a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Segment duration is zero, negative or not finite
    #[error("segment duration must be a positive number of seconds, got {0}")]
    InvalidDuration(f64),

    /// Padding is negative or not finite
    #[error("padding between segments must be non-negative, got {0}")]
    InvalidPadding(f32),

    /// Color could not be parsed
    #[error("invalid color: {0}")]
    InvalidColor(#[from] ColorParseError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
