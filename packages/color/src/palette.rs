//! RGB colors and ordered palettes.

use std::fmt;

use caps_map_municipality_models::config::PaletteName;
use serde::{Serialize, Serializer};

use crate::ColorError;

/// ColorBrewer `OrRd`, 9 classes.
const OR_RD: [&str; 9] = [
    "#fff7ec", "#fee8c8", "#fdd49e", "#fdbb84", "#fc8d59", "#ef6548", "#d7301f", "#b30000",
    "#7f0000",
];

/// ColorBrewer `YlOrRd`, 9 classes.
const YL_OR_RD: [&str; 9] = [
    "#ffffcc", "#ffeda0", "#fed976", "#feb24c", "#fd8d3c", "#fc4e2a", "#e31a1c", "#bd0026",
    "#800026",
];

/// ColorBrewer `Reds`, 9 classes.
const REDS: [&str; 9] = [
    "#fff5f0", "#fee0d2", "#fcbba1", "#fc9272", "#fb6a4a", "#ef3b2c", "#cb181d", "#a50f15",
    "#67000d",
];

/// An opaque 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
}

impl Rgb {
    /// Parses `#rrggbb` (leading `#` optional, case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`ColorError::InvalidHex`] if the string is not six hex
    /// digits.
    pub fn from_hex(hex: &str) -> Result<Self, ColorError> {
        let digits = hex.trim().trim_start_matches('#');
        let invalid = || ColorError::InvalidHex {
            value: hex.to_string(),
        };

        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16).map_err(|_| invalid())
        };

        Ok(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }

    /// Formats as lowercase `#rrggbb`.
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Linear interpolation between two colors, `t` in `[0, 1]`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| {
            let a = f64::from(a);
            let b = f64::from(b);
            t.mul_add(b - a, a).round().clamp(0.0, 255.0) as u8
        };
        Self {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// An ordered sequence of at least two colors, interpolated linearly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Palette {
    colors: Vec<Rgb>,
}

impl Palette {
    /// Creates a palette from explicit colors.
    ///
    /// # Errors
    ///
    /// Returns [`ColorError::TooFewColors`] if fewer than two colors are
    /// given.
    pub fn new(colors: Vec<Rgb>) -> Result<Self, ColorError> {
        if colors.len() < 2 {
            return Err(ColorError::TooFewColors {
                count: colors.len(),
            });
        }
        Ok(Self { colors })
    }

    /// Returns one of the built-in palettes.
    #[must_use]
    pub fn named(name: PaletteName) -> Self {
        let hexes: &[&str] = match name {
            PaletteName::OrRd => &OR_RD,
            PaletteName::YlOrRd => &YL_OR_RD,
            PaletteName::Reds => &REDS,
        };
        Self {
            colors: hexes
                .iter()
                .filter_map(|hex| Rgb::from_hex(hex).ok())
                .collect(),
        }
    }

    /// The palette's colors, low to high.
    #[must_use]
    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    /// Color at position `t` in `[0, 1]` (clamped).
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn at(&self, t: f64) -> Rgb {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let last = self.colors.len() - 1;
        let position = t * last as f64;
        let lower = (position.floor() as usize).min(last);
        if lower == last {
            return self.colors[last];
        }
        self.colors[lower].lerp(self.colors[lower + 1], position - lower as f64)
    }
}
