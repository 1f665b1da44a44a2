//! ARGB colors for bar render descriptions.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Named colors accepted in configuration, as `(name, r, g, b)`.
const NAMED_COLORS: &[(&str, u8, u8, u8)] = &[
    ("black", 0, 0, 0),
    ("white", 255, 255, 255),
    ("red", 255, 0, 0),
    ("lime", 0, 255, 0),
    ("green", 0, 128, 0),
    ("blue", 0, 0, 255),
    ("yellow", 255, 255, 0),
    ("orange", 255, 165, 0),
    ("cyan", 0, 255, 255),
    ("magenta", 255, 0, 255),
    ("gray", 128, 128, 128),
    ("silver", 192, 192, 192),
    ("maroon", 128, 0, 0),
    ("navy", 0, 0, 128),
    ("teal", 0, 128, 128),
    ("purple", 128, 0, 128),
];

/// An ARGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    /// Alpha (0 = transparent, 255 = opaque).
    pub a: u8,
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Color {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::from_argb(0, 0, 0, 0);

    /// Creates a color from its channels.
    #[must_use]
    pub const fn from_argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self { a, r, g, b }
    }

    /// Returns the same color with a different alpha.
    #[must_use]
    pub const fn with_alpha(mut self, a: u8) -> Self {
        self.a = a;
        self
    }

    /// Returns the color as `#AARRGGBB`.
    #[must_use]
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}{:02X}", self.a, self.r, self.g, self.b)
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    /// Parses `#RRGGBB`, `#AARRGGBB`, or a color name (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            let channel = |i: usize| {
                hex.get(i..i + 2)
                    .and_then(|c| u8::from_str_radix(c, 16).ok())
                    .ok_or_else(|| ColorParseError(s.to_string()))
            };
            return match hex.len() {
                6 => Ok(Self::from_argb(255, channel(0)?, channel(2)?, channel(4)?)),
                8 => Ok(Self::from_argb(
                    channel(0)?,
                    channel(2)?,
                    channel(4)?,
                    channel(6)?,
                )),
                _ => Err(ColorParseError(s.to_string())),
            };
        }

        let lower = s.to_lowercase();
        if lower == "transparent" {
            return Ok(Self::TRANSPARENT);
        }
        NAMED_COLORS
            .iter()
            .find(|(name, ..)| *name == lower)
            .map(|&(_, r, g, b)| Self::from_argb(255, r, g, b))
            .ok_or_else(|| ColorParseError(s.to_string()))
    }
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

/// Error returned when parsing an unknown color.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid color '{0}', expected a color name, #RRGGBB or #AARRGGBB")]
pub struct ColorParseError(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_colors() {
        assert_eq!("Lime".parse::<Color>().unwrap(), Color::from_argb(255, 0, 255, 0));
        assert_eq!("RED".parse::<Color>().unwrap(), Color::from_argb(255, 255, 0, 0));
        assert_eq!("transparent".parse::<Color>().unwrap(), Color::TRANSPARENT);
        assert!("chartreuse-ish".parse::<Color>().is_err());
    }

    #[test]
    fn test_hex_colors() {
        assert_eq!(
            "#102030".parse::<Color>().unwrap(),
            Color::from_argb(255, 0x10, 0x20, 0x30)
        );
        assert_eq!(
            "#80FF0000".parse::<Color>().unwrap(),
            Color::from_argb(0x80, 255, 0, 0)
        );
        assert!("#12345".parse::<Color>().is_err());
        assert!("#GG0000".parse::<Color>().is_err());
    }

    #[test]
    fn test_with_alpha_and_hex() {
        let color = "Lime".parse::<Color>().unwrap().with_alpha(100);
        assert_eq!(color.to_hex(), "#6400FF00");
        assert_eq!(color.to_hex().parse::<Color>().unwrap(), color);
    }
}
