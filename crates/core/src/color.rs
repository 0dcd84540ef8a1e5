//! RGBA colors used by segment styling.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An 8-bit RGBA color.
///
/// Serialized as a hex string: `#rrggbb` (opaque) or `#rrggbbaa`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
    /// Alpha channel (255 = opaque)
    pub a: u8,
}

impl Rgba {
    /// Opaque color from components.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Color with explicit alpha.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Same color with alpha set from a 0.0-1.0 fraction.
    pub fn with_alpha(self, alpha: f32) -> Self {
        let a = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self { a, ..self }
    }

    /// Composite onto black, dropping alpha.
    pub fn premultiplied(self) -> (u8, u8, u8) {
        let scale = |c: u8| ((c as u16 * self.a as u16 + 127) / 255) as u8;
        (scale(self.r), scale(self.g), scale(self.b))
    }
}

/// Error parsing a hex color string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColorParseError {
    /// Missing leading `#`
    #[error("color must start with '#': {0:?}")]
    MissingHash(String),

    /// Wrong number of hex digits
    #[error("color must have 6 or 8 hex digits: {0:?}")]
    BadLength(String),

    /// Non-hex character
    #[error("invalid hex digit in color: {0:?}")]
    BadDigit(String),
}

impl FromStr for Rgba {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .trim()
            .strip_prefix('#')
            .ok_or_else(|| ColorParseError::MissingHash(s.to_string()))?;

        if hex.len() != 6 && hex.len() != 8 {
            return Err(ColorParseError::BadLength(s.to_string()));
        }

        let channel = |i: usize| {
            hex.get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| ColorParseError::BadDigit(s.to_string()))
        };

        let a = if hex.len() == 8 { channel(6)? } else { 255 };
        Ok(Self::rgba(channel(0)?, channel(2)?, channel(4)?, a))
    }
}

impl TryFrom<String> for Rgba {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgba> for String {
    fn from(color: Rgba) -> Self {
        color.to_string()
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_opaque_and_alpha() {
        assert_eq!("#ff0000".parse::<Rgba>().unwrap(), Rgba::rgb(255, 0, 0));
        assert_eq!("#58A6FF4d".parse::<Rgba>().unwrap(), Rgba::rgba(0x58, 0xa6, 0xff, 0x4d));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!("ff0000".parse::<Rgba>(), Err(ColorParseError::MissingHash(_))));
        assert!(matches!("#ff00".parse::<Rgba>(), Err(ColorParseError::BadLength(_))));
        assert!(matches!("#gg0000".parse::<Rgba>(), Err(ColorParseError::BadDigit(_))));
    }

    #[test]
    fn test_with_alpha() {
        let track = Rgba::rgb(255, 0, 0).with_alpha(0.3);
        assert_eq!(track.a, 77);
        assert_eq!(track.to_string(), "#ff00004d");
    }

    #[test]
    fn test_premultiplied() {
        assert_eq!(Rgba::rgb(200, 100, 0).premultiplied(), (200, 100, 0));
        assert_eq!(Rgba::rgba(200, 100, 0, 0).premultiplied(), (0, 0, 0));
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&Rgba::rgb(1, 2, 3)).unwrap();
        assert_eq!(json, "\"#010203ff\"");
        let back: Rgba = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Rgba::rgb(1, 2, 3));
        assert!(serde_json::from_str::<Rgba>("\"red\"").is_err());
    }
}
