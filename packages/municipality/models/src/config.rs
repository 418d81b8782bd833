//! Configuration schema, deserialized from TOML.
//!
//! Every section and field has a default, so a config file only needs to
//! name what it overrides. Unknown keys are rejected to catch typos.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CapsMapConfig {
    /// Where the source files live.
    pub data: DataConfig,
    /// Geometry loading.
    pub geometry: GeometryConfig,
    /// Service-count table layout.
    pub services: ServiceTableConfig,
    /// Population table layout.
    pub population: PopulationTableConfig,
    /// Facility overlay table layout.
    pub facilities: FacilityTableConfig,
    /// Selectable year range.
    pub years: YearConfig,
    /// Color scale.
    pub scale: ScaleConfig,
    /// Polygon styling handed to the rendering collaborator.
    pub style: StyleConfig,
}

/// Data directory layout.
///
/// Files are resolved as `geometry/{UF}.geojson`, `services/{UF}.csv`,
/// `population/{YEAR}.csv` and `facilities/{UF}.csv` under `root`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    /// Base data directory.
    pub root: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("data"),
        }
    }
}

/// Geometry loading options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeometryConfig {
    /// Candidate attribute names for the display name; first present wins.
    pub name_fields: Vec<String>,
    /// Douglas-Peucker tolerance in degrees. `0.0` disables simplification.
    pub simplify_tolerance: f64,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            name_fields: vec!["NM_MUN".to_string(), "name".to_string()],
            simplify_tolerance: 0.001,
        }
    }
}

/// Service-count table columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceTableConfig {
    /// Column holding the municipality name.
    pub municipality_column: String,
    /// Column holding the two-letter state code.
    pub state_column: String,
    /// Field delimiter.
    pub delimiter: char,
}

impl Default for ServiceTableConfig {
    fn default() -> Self {
        Self {
            municipality_column: "municipio".to_string(),
            state_column: "uf".to_string(),
            delimiter: ',',
        }
    }
}

/// Population table columns and available snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PopulationTableConfig {
    /// Column holding the city name.
    pub city_column: String,
    /// Column holding the resident count.
    pub population_column: String,
    /// Years for which a population snapshot file exists.
    pub snapshot_years: Vec<i32>,
    /// Field delimiter.
    pub delimiter: char,
}

impl Default for PopulationTableConfig {
    fn default() -> Self {
        Self {
            city_column: "municipio".to_string(),
            population_column: "populacao".to_string(),
            snapshot_years: vec![2014, 2016, 2018, 2020, 2022],
            delimiter: ',',
        }
    }
}

/// Facility overlay columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FacilityTableConfig {
    /// Column holding the facility name.
    pub name_column: String,
    /// Column holding the latitude.
    pub latitude_column: String,
    /// Column holding the longitude.
    pub longitude_column: String,
    /// Field delimiter.
    pub delimiter: char,
}

impl Default for FacilityTableConfig {
    fn default() -> Self {
        Self {
            name_column: "nome".to_string(),
            latitude_column: "latitude".to_string(),
            longitude_column: "longitude".to_string(),
            delimiter: ',',
        }
    }
}

/// Selectable year range (inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct YearConfig {
    /// First selectable year.
    pub min: i32,
    /// Last selectable year.
    pub max: i32,
    /// Year selected when none is given.
    pub default: i32,
}

impl Default for YearConfig {
    fn default() -> Self {
        Self {
            min: 2014,
            max: 2023,
            default: 2023,
        }
    }
}

impl YearConfig {
    /// Whether `year` lies within `[min, max]`.
    #[must_use]
    pub const fn contains(&self, year: i32) -> bool {
        year >= self.min && year <= self.max
    }
}

/// Named sequential palettes.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaletteName {
    /// Orange-red, 9 classes.
    #[default]
    OrRd,
    /// Yellow-orange-red, 9 classes.
    YlOrRd,
    /// Reds, 9 classes.
    Reds,
}

/// Value transform applied before a scale lookup.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ScaleTransform {
    /// Values are used as-is.
    Identity,
    /// `ln(1 + x)`; compresses right-skewed rate distributions.
    #[default]
    Log1p,
}

/// Color scale options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScaleConfig {
    /// Palette to interpolate across the domain.
    pub palette: PaletteName,
    /// Transform applied to values before building and querying.
    pub transform: ScaleTransform,
    /// Fill for municipalities with a rate of exactly 0.
    pub no_data_color: String,
    /// Number of legend stops.
    pub legend_stops: usize,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            palette: PaletteName::default(),
            transform: ScaleTransform::default(),
            no_data_color: "#ffffff".to_string(),
            legend_stops: 6,
        }
    }
}

/// Polygon border and opacity styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StyleConfig {
    /// Border color.
    pub border_color: String,
    /// Border weight in pixels.
    pub border_weight: f64,
    /// Fill opacity in `[0, 1]`.
    pub fill_opacity: f64,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            border_color: "black".to_string(),
            border_weight: 0.5,
            fill_opacity: 0.7,
        }
    }
}
