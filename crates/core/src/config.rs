//! Segment configuration and the data-source capability that supplies it.

use crate::color::Rgba;
use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Seconds a segment takes to fill when nothing else is configured.
pub const DEFAULT_SEGMENT_DURATION: f64 = 5.0;

/// Gap between adjacent segments when nothing else is configured.
pub const DEFAULT_PADDING: f32 = 5.0;

/// Corner treatment for the rendered bars.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CornerStyle {
    /// Square corners everywhere
    #[default]
    None,
    /// Every segment rounded on both ends
    RoundedSegments {
        /// Corner radius
        radius: f32,
    },
    /// Only the outer ends of the whole bar rounded
    RoundedBar {
        /// Corner radius
        radius: f32,
    },
}

impl CornerStyle {
    /// Corner radius, zero for square corners.
    pub fn radius(&self) -> f32 {
        match self {
            CornerStyle::None => 0.0,
            CornerStyle::RoundedSegments { radius } | CornerStyle::RoundedBar { radius } => *radius,
        }
    }
}

/// Presentation settings. The engine carries these for the renderer and never reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentStyle {
    /// Gap between adjacent segments
    pub padding_between_segments: f32,

    /// Color of the unfilled part of a segment
    pub track_color: Rgba,

    /// Color of the filled part of a segment
    pub progress_color: Rgba,

    /// Corner treatment
    pub corner_style: CornerStyle,
}

impl Default for SegmentStyle {
    fn default() -> Self {
        Self {
            padding_between_segments: DEFAULT_PADDING,
            track_color: Rgba::rgb(255, 0, 0).with_alpha(0.3),
            progress_color: Rgba::rgb(255, 0, 0),
            corner_style: CornerStyle::None,
        }
    }
}

/// Configuration read by the engine at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentConfig {
    /// Number of segments in the bar
    pub segment_count: usize,

    /// Seconds for one segment to fill from 0 to 1
    pub segment_duration: f64,

    /// Renderer styling
    pub style: SegmentStyle,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            segment_count: 0,
            segment_duration: DEFAULT_SEGMENT_DURATION,
            style: SegmentStyle::default(),
        }
    }
}

impl SegmentConfig {
    /// Create a configuration with `segment_count` segments and default timing.
    pub fn new(segment_count: usize) -> Self {
        Self {
            segment_count,
            ..Self::default()
        }
    }

    /// Set the per-segment duration in seconds.
    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.segment_duration = seconds;
        self
    }

    /// Set the styling.
    pub fn with_style(mut self, style: SegmentStyle) -> Self {
        self.style = style;
        self
    }

    /// Snapshot a data source.
    pub fn from_source(source: &dyn SegmentDataSource) -> Self {
        Self {
            segment_count: source.number_of_segments(),
            segment_duration: source.segment_duration(),
            style: SegmentStyle {
                padding_between_segments: source.padding_between_segments(),
                track_color: source.track_color(),
                progress_color: source.progress_color(),
                corner_style: source.corner_style(),
            },
        }
    }

    /// Load a configuration from a JSON file and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values the engine divides by or lays out with.
    pub fn validate(&self) -> Result<()> {
        if self.segment_duration <= 0.0 || Duration::try_from_secs_f64(self.segment_duration).is_err() {
            return Err(ConfigError::InvalidDuration(self.segment_duration));
        }
        let padding = self.style.padding_between_segments;
        if !padding.is_finite() || padding < 0.0 {
            return Err(ConfigError::InvalidPadding(padding));
        }
        Ok(())
    }

    /// Per-segment duration as a [`Duration`].
    ///
    /// Only meaningful after [`validate`](Self::validate) succeeded.
    pub fn duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.segment_duration).unwrap_or(Duration::MAX)
    }
}

/// Capability a host implements to describe the bar.
///
/// Only the segment count is required; everything else falls back to the
/// same defaults as [`SegmentConfig::default`].
pub trait SegmentDataSource {
    /// Number of segments.
    fn number_of_segments(&self) -> usize;

    /// Seconds per segment.
    fn segment_duration(&self) -> f64 {
        DEFAULT_SEGMENT_DURATION
    }

    /// Gap between segments.
    fn padding_between_segments(&self) -> f32 {
        DEFAULT_PADDING
    }

    /// Unfilled color.
    fn track_color(&self) -> Rgba {
        SegmentStyle::default().track_color
    }

    /// Filled color.
    fn progress_color(&self) -> Rgba {
        SegmentStyle::default().progress_color
    }

    /// Corner treatment.
    fn corner_style(&self) -> CornerStyle {
        CornerStyle::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Stories;

    impl SegmentDataSource for Stories {
        fn number_of_segments(&self) -> usize {
            4
        }

        fn segment_duration(&self) -> f64 {
            3.0
        }

        fn corner_style(&self) -> CornerStyle {
            CornerStyle::RoundedBar { radius: 2.0 }
        }
    }

    #[test]
    fn test_defaults() {
        let config = SegmentConfig::default();
        assert_eq!(config.segment_count, 0);
        assert_eq!(config.segment_duration, 5.0);
        assert_eq!(config.style.padding_between_segments, 5.0);
        assert_eq!(config.style.progress_color, Rgba::rgb(255, 0, 0));
        assert_eq!(config.style.corner_style, CornerStyle::None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_source_uses_overrides_and_defaults() {
        let config = SegmentConfig::from_source(&Stories);
        assert_eq!(config.segment_count, 4);
        assert_eq!(config.segment_duration, 3.0);
        assert_eq!(config.style.padding_between_segments, DEFAULT_PADDING);
        assert_eq!(config.style.corner_style.radius(), 2.0);
    }

    #[test]
    fn test_validate_rejects_bad_duration() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY, 1e30] {
            let config = SegmentConfig::new(3).with_duration(bad);
            assert!(matches!(config.validate(), Err(ConfigError::InvalidDuration(_))));
        }
    }

    #[test]
    fn test_validate_rejects_negative_padding() {
        let mut config = SegmentConfig::new(3);
        config.style.padding_between_segments = -2.0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidPadding(_))));
    }

    #[test]
    fn test_json_partial_config() {
        let json = r##"{
            "segment_count": 3,
            "style": { "corner_style": { "type": "rounded_segments", "radius": 4.0 }, "track_color": "#00000080" }
        }"##;
        let config: SegmentConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.segment_count, 3);
        assert_eq!(config.segment_duration, DEFAULT_SEGMENT_DURATION);
        assert_eq!(config.style.corner_style, CornerStyle::RoundedSegments { radius: 4.0 });
        assert_eq!(config.style.track_color, Rgba::rgba(0, 0, 0, 0x80));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("storybar-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"segment_count": 2, "segment_duration": 1.5}"#).unwrap();
        let config = SegmentConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(config.segment_count, 2);
        assert_eq!(config.duration(), Duration::from_millis(1500));
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let path = std::env::temp_dir().join(format!("storybar-bad-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"segment_count": 2, "segment_duration": 0}"#).unwrap();
        let result = SegmentConfig::load(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(ConfigError::InvalidDuration(_))));

        assert!(matches!(
            SegmentConfig::load("/definitely/not/here.json"),
            Err(ConfigError::Io(_))
        ));
    }
}
