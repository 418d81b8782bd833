//! Per-feature polygon styling handed to the rendering collaborator.
//!
//! A rate of exactly `0.0` means "no data" and is painted with the
//! configured no-data color instead of going through the scale.

use caps_map_municipality_models::config::StyleConfig;
use serde::Serialize;

use crate::ColorScale;

/// Style properties for one polygon.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Style {
    /// Fill color (`#rrggbb`).
    pub fill_color: String,
    /// Border color.
    pub color: String,
    /// Border weight in pixels.
    pub weight: f64,
    /// Fill opacity in `[0, 1]`.
    pub fill_opacity: f64,
}

/// Maps a raw rate to a [`Style`].
#[derive(Debug, Clone)]
pub struct StyleFunction<'a> {
    scale: &'a ColorScale,
    config: &'a StyleConfig,
    no_data_color: &'a str,
}

impl<'a> StyleFunction<'a> {
    /// Creates a style function over `scale`.
    #[must_use]
    pub const fn new(scale: &'a ColorScale, config: &'a StyleConfig, no_data_color: &'a str) -> Self {
        Self {
            scale,
            config,
            no_data_color,
        }
    }

    /// Style for a municipality with the given raw rate.
    #[must_use]
    pub fn style_for(&self, rate: f64) -> Style {
        let fill_color = if rate == 0.0 {
            self.no_data_color.to_string()
        } else {
            self.scale.color_for_value(rate).to_hex()
        };

        Style {
            fill_color,
            color: self.config.border_color.clone(),
            weight: self.config.border_weight,
            fill_opacity: self.config.fill_opacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use caps_map_municipality_models::config::{PaletteName, ScaleTransform};

    use super::*;
    use crate::Palette;

    #[test]
    fn zero_rate_uses_no_data_color() {
        let scale = ColorScale::build(
            &[10.0, 50.0],
            ScaleTransform::Identity,
            Palette::named(PaletteName::OrRd),
        );
        let config = StyleConfig::default();
        let style = StyleFunction::new(&scale, &config, "#ffffff").style_for(0.0);
        assert_eq!(style.fill_color, "#ffffff");
        assert_eq!(style.color, "black");
        assert!((style.weight - 0.5).abs() < f64::EPSILON);
        assert!((style.fill_opacity - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn non_zero_rate_goes_through_scale() {
        let scale = ColorScale::build(
            &[10.0, 50.0],
            ScaleTransform::Log1p,
            Palette::named(PaletteName::OrRd),
        );
        let config = StyleConfig::default();
        let styles = StyleFunction::new(&scale, &config, "#ffffff");
        assert_eq!(styles.style_for(50.0).fill_color, "#7f0000");
        assert_eq!(styles.style_for(10.0).fill_color, "#fff7ec");
    }

    #[test]
    fn serializes_with_leaflet_keys() {
        let style = Style {
            fill_color: "#fc8d59".to_string(),
            color: "black".to_string(),
            weight: 0.5,
            fill_opacity: 0.7,
        };
        let json = serde_json::to_value(&style).unwrap();
        assert_eq!(json["fillColor"], "#fc8d59");
        assert_eq!(json["fillOpacity"], 0.7);
    }
}
