//! This module handles colours.

use serde::{Deserialize, Serialize};

/// An RGB colour.
pub type RGBArray = [u8; 3];

/// An RGB colour with a straight alpha channel.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Colour {
    /// The red component.
    pub r: u8,

    /// The green component.
    pub g: u8,

    /// The blue component.
    pub b: u8,

    /// The opacity, in [0, 1].
    pub a: f32,
}

impl Colour {
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0.);

    /// Create an opaque colour.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1. }
    }

    /// Create a colour with the given opacity.
    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Return this colour with a different opacity.
    pub const fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Parse a CSS-style hex colour, either `#RRGGBB` or the short `#RGB` form. The leading `#`
    /// is optional.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if !digits.is_ascii() {
            return None;
        }

        let channel = |s: &str| u8::from_str_radix(s, 16).ok();

        match digits.len() {
            6 => Some(Self::rgb(
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
            )),
            3 => {
                // `#abc` means `#aabbcc`
                let short = |s: &str| channel(s).map(|v| v * 17);
                Some(Self::rgb(
                    short(&digits[0..1])?,
                    short(&digits[1..2])?,
                    short(&digits[2..3])?,
                ))
            }
            _ => None,
        }
    }

    /// The RGB components without the alpha.
    pub const fn rgb_array(self) -> RGBArray {
        [self.r, self.g, self.b]
    }

    /// Linearly interpolate every channel between `self` (at `t = 0`) and `other` (at `t = 1`).
    pub fn lerp(self, other: Self, t: f32) -> Self {
        let t = t.clamp(0., 1.);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;

        Self {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: self.a + (other.a - self.a) * t,
        }
    }
}

impl From<RGBArray> for Colour {
    fn from([r, g, b]: RGBArray) -> Self {
        Self::rgb(r, g, b)
    }
}
