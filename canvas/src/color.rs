//! Ink colour parsing.

#[cfg(test)]
#[path = "color_test.rs"]
mod color_test;

use tiny_skia::Color;

/// Parse `#RGB` or `#RRGGBB` values into RGB channels.
#[must_use]
pub fn parse_hex_rgb(raw: &str) -> Option<(u8, u8, u8)> {
    let hex = raw.trim().strip_prefix('#')?;
    let digits = hex.chars().map(|c| c.to_digit(16)).collect::<Option<Vec<u32>>>()?;
    let channel = |hi: u32, lo: u32| u8::try_from(hi * 16 + lo).unwrap_or(u8::MAX);
    match digits.as_slice() {
        [r, g, b] => Some((channel(*r, *r), channel(*g, *g), channel(*b, *b))),
        [r1, r2, g1, g2, b1, b2] => Some((channel(*r1, *r2), channel(*g1, *g2), channel(*b1, *b2))),
        _ => None,
    }
}

/// An opaque ink colour, kept alongside its canonical `#rrggbb` spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InkColor {
    r: u8,
    g: u8,
    b: u8,
}

impl InkColor {
    pub const RED: Self = Self { r: 255, g: 0, b: 0 };

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        parse_hex_rgb(raw).map(|(r, g, b)| Self { r, g, b })
    }

    #[must_use]
    pub fn rgb(self) -> (u8, u8, u8) {
        (self.r, self.g, self.b)
    }

    /// Canonical lowercase `#rrggbb`.
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    #[must_use]
    pub fn to_skia(self) -> Color {
        Color::from_rgba8(self.r, self.g, self.b, 255)
    }
}
