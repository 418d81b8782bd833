#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Value-to-color scales for the choropleth.
//!
//! A [`ColorScale`] spans `[min, max]` of the *transformed* input values
//! and interpolates an ordered [`Palette`] across it. The transform is part
//! of the scale's contract: lookups through [`ColorScale::color_for`] expect
//! an already-transformed value, while [`ColorScale::color_for_value`]
//! applies the transform itself.
//!
//! A collapsed domain (one distinct value, or no values at all) never
//! fails: every lookup returns the palette midpoint.

pub mod palette;
pub mod style;

use caps_map_municipality_models::config::ScaleTransform;
use serde::Serialize;
use thiserror::Error;

pub use palette::{Palette, Rgb};

/// Errors from palette construction.
#[derive(Debug, Error)]
pub enum ColorError {
    /// A color string is not `#rrggbb`.
    #[error("Invalid hex color {value:?}")]
    InvalidHex {
        /// The rejected string.
        value: String,
    },

    /// A palette needs at least two colors to interpolate.
    #[error("Palette needs at least 2 colors, got {count}")]
    TooFewColors {
        /// Number of colors given.
        count: usize,
    },
}

/// Applies `transform` to a raw value.
#[must_use]
pub fn apply_transform(transform: ScaleTransform, value: f64) -> f64 {
    match transform {
        ScaleTransform::Identity => value,
        ScaleTransform::Log1p => value.ln_1p(),
    }
}

/// Inverts `transform`, mapping a domain value back to raw units.
#[must_use]
pub fn invert_transform(transform: ScaleTransform, value: f64) -> f64 {
    match transform {
        ScaleTransform::Identity => value,
        ScaleTransform::Log1p => value.exp_m1(),
    }
}

/// A legend entry in raw (untransformed) units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendStop {
    /// Raw value at this stop.
    pub value: f64,
    /// Color at this stop.
    pub color: Rgb,
}

/// A linear color scale over a transformed value domain.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorScale {
    vmin: f64,
    vmax: f64,
    transform: ScaleTransform,
    palette: Palette,
}

impl ColorScale {
    /// Builds a scale over `values` after applying `transform`.
    ///
    /// Non-finite transformed values are ignored. With no usable values the
    /// domain is `[0, 0]`.
    #[must_use]
    pub fn build(values: &[f64], transform: ScaleTransform, palette: Palette) -> Self {
        let (vmin, vmax) = values
            .iter()
            .map(|v| apply_transform(transform, *v))
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<(f64, f64)>, v| {
                Some(acc.map_or((v, v), |(lo, hi)| (lo.min(v), hi.max(v))))
            })
            .unwrap_or((0.0, 0.0));

        let scale = Self {
            vmin,
            vmax,
            transform,
            palette,
        };

        if scale.is_degenerate() {
            log::debug!(
                "Color scale domain collapsed to {vmin} over {} value(s); using palette midpoint",
                values.len()
            );
        }

        scale
    }

    /// `[vmin, vmax]` in transformed units.
    #[must_use]
    pub const fn domain(&self) -> (f64, f64) {
        (self.vmin, self.vmax)
    }

    /// The transform lookups must apply before [`Self::color_for`].
    #[must_use]
    pub const fn transform(&self) -> ScaleTransform {
        self.transform
    }

    /// The palette being interpolated.
    #[must_use]
    pub const fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Whether the domain has zero width.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.vmax <= self.vmin
    }

    /// Color for an already-transformed value. Values outside the domain
    /// clamp to the palette ends.
    #[must_use]
    pub fn color_for(&self, transformed: f64) -> Rgb {
        if self.is_degenerate() {
            return self.palette.at(0.5);
        }
        self.palette
            .at((transformed - self.vmin) / (self.vmax - self.vmin))
    }

    /// Color for a raw value, applying the scale's transform first.
    #[must_use]
    pub fn color_for_value(&self, raw: f64) -> Rgb {
        self.color_for(apply_transform(self.transform, raw))
    }

    /// Evenly spaced legend stops across the domain, in raw units.
    ///
    /// A degenerate domain yields a single stop.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn legend(&self, stops: usize) -> Vec<LegendStop> {
        if self.is_degenerate() || stops < 2 {
            return vec![LegendStop {
                value: invert_transform(self.transform, self.vmin),
                color: self.color_for(self.vmin),
            }];
        }

        (0..stops)
            .map(|i| {
                let t = i as f64 / (stops - 1) as f64;
                let domain_value = t.mul_add(self.vmax - self.vmin, self.vmin);
                LegendStop {
                    value: invert_transform(self.transform, domain_value),
                    color: self.color_for(domain_value),
                }
            })
            .collect()
    }
}
