//! Color values
//!
//! Colors parse from CSS named colors or `#rgb`/`#rrggbb` hex tokens and
//! canonicalize to lowercase `#rrggbb`, so `red` and `#ff0000` are the same
//! value after parsing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An 8-bit RGB color
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const BLACK: Self = Self::rgb(0, 0, 0);

    /// Create a color from RGB components
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a color token
    ///
    /// Accepts `#rgb`, `#rrggbb`, and CSS color names (case-insensitive).
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        if let Some(hex) = token.strip_prefix('#') {
            return Self::parse_hex(hex);
        }
        Self::named(&token.to_ascii_lowercase())
    }

    fn parse_hex(hex: &str) -> Option<Self> {
        match hex.len() {
            3 => {
                let r = u8::from_str_radix(&hex[0..1], 16).ok()?;
                let g = u8::from_str_radix(&hex[1..2], 16).ok()?;
                let b = u8::from_str_radix(&hex[2..3], 16).ok()?;
                Some(Self::rgb(r * 17, g * 17, b * 17))
            }
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some(Self::rgb(r, g, b))
            }
            _ => None,
        }
    }

    fn named(name: &str) -> Option<Self> {
        let color = match name {
            "black" => Self::rgb(0, 0, 0),
            "silver" => Self::rgb(192, 192, 192),
            "gray" | "grey" => Self::rgb(128, 128, 128),
            "white" => Self::rgb(255, 255, 255),
            "maroon" => Self::rgb(128, 0, 0),
            "red" => Self::rgb(255, 0, 0),
            "purple" => Self::rgb(128, 0, 128),
            "fuchsia" | "magenta" => Self::rgb(255, 0, 255),
            "green" => Self::rgb(0, 128, 0),
            "lime" => Self::rgb(0, 255, 0),
            "olive" => Self::rgb(128, 128, 0),
            "yellow" => Self::rgb(255, 255, 0),
            "navy" => Self::rgb(0, 0, 128),
            "blue" => Self::rgb(0, 0, 255),
            "teal" => Self::rgb(0, 128, 128),
            "aqua" | "cyan" => Self::rgb(0, 255, 255),
            "orange" => Self::rgb(255, 165, 0),
            "pink" => Self::rgb(255, 192, 203),
            "brown" => Self::rgb(165, 42, 42),
            "gold" => Self::rgb(255, 215, 0),
            "indigo" => Self::rgb(75, 0, 130),
            "violet" => Self::rgb(238, 130, 238),
            "coral" => Self::rgb(255, 127, 80),
            "salmon" => Self::rgb(250, 128, 114),
            "khaki" => Self::rgb(240, 230, 140),
            "turquoise" => Self::rgb(64, 224, 208),
            "crimson" => Self::rgb(220, 20, 60),
            "lavender" => Self::rgb(230, 230, 250),
            "ivory" => Self::rgb(255, 255, 240),
            "beige" => Self::rgb(245, 245, 220),
            "tan" => Self::rgb(210, 180, 140),
            "skyblue" => Self::rgb(135, 206, 235),
            "tomato" => Self::rgb(255, 99, 71),
            "orchid" => Self::rgb(218, 112, 214),
            "plum" => Self::rgb(221, 160, 221),
            "slategray" | "slategrey" => Self::rgb(112, 128, 144),
            _ => return None,
        };
        Some(color)
    }

    /// Canonical lowercase `#rrggbb` form
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
