#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Core data types for the CAPS municipality choropleth.
//!
//! These types describe one render cycle's worth of data: municipality
//! boundaries for a single state, the service-count and population tables
//! they are joined against, facility overlay points, and the map viewport
//! persisted per state across renders.

pub mod config;
pub mod names;
pub mod states;

use std::collections::{BTreeMap, BTreeSet};

use geo::MultiPolygon;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use names::normalize_name;
pub use states::StateCode;

/// Rate scale factor: encounters per this many residents.
pub const RATE_PER: f64 = 100_000.0;

/// Why a municipality ended up with the rate it has.
///
/// `rate == 0.0` is ambiguous on its own (no data vs. a measured zero), so
/// the join records the outcome separately.
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
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RateStatus {
    /// Not joined yet.
    #[default]
    Pending,
    /// Service and population rows both matched; the rate was computed.
    Matched,
    /// No service row carries this municipality's name.
    NoServiceMatch,
    /// A service row matched but its cell for the requested year is empty.
    NoServiceValue,
    /// No population row carries this municipality's name.
    NoPopulationMatch,
    /// A population row matched but the population is missing or zero.
    ZeroPopulation,
}

/// A single municipality boundary with its joined rate.
#[derive(Debug, Clone, PartialEq)]
pub struct Municipality {
    /// Boundary in EPSG:4326 (lon/lat).
    pub geometry: MultiPolygon<f64>,
    /// Display name as sourced.
    pub name: String,
    /// Join key derived from `name` via [`normalize_name`].
    pub normalized_name: String,
    /// State this municipality belongs to.
    pub state_code: StateCode,
    /// Encounters per 100,000 residents. `0.0` when no data.
    pub rate: f64,
    /// How `rate` was derived.
    pub rate_status: RateStatus,
}

impl Municipality {
    /// Creates an unjoined municipality, deriving the join key from `name`.
    #[must_use]
    pub fn new(name: impl Into<String>, state_code: StateCode, geometry: MultiPolygon<f64>) -> Self {
        let name = name.into();
        let normalized_name = normalize_name(&name);
        Self {
            geometry,
            name,
            normalized_name,
            state_code,
            rate: 0.0,
            rate_status: RateStatus::Pending,
        }
    }

    /// Placeholder display name for features without a name attribute.
    #[must_use]
    pub fn placeholder_name(index: usize) -> String {
        format!("Municipality {}", index + 1)
    }
}

/// One service-table row: a municipality with per-year encounter counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRecord {
    /// Municipality name as sourced.
    pub municipality_name: String,
    /// State code as sourced (not validated).
    pub state_code: String,
    /// Year -> encounter count. Years with an empty cell are absent.
    pub counts: BTreeMap<i32, f64>,
}

/// A loaded service table.
///
/// `years` lists every year column present in the header, which may be a
/// superset of the keys populated on any given record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceTable {
    /// Year columns present in the source header.
    pub years: BTreeSet<i32>,
    /// Rows in file order.
    pub records: Vec<ServiceRecord>,
}

impl ServiceTable {
    /// Whether the source carried a column for `year`.
    #[must_use]
    pub fn has_year(&self, year: i32) -> bool {
        self.years.contains(&year)
    }
}

/// One population-table row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulationRecord {
    /// City name as sourced.
    pub city_name: String,
    /// Resident count. `None` when the cell was empty or unparseable.
    pub population: Option<u64>,
}

/// A population snapshot for a single year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopulationTable {
    /// Snapshot year.
    pub year: i32,
    /// Rows in file order.
    pub records: Vec<PopulationRecord>,
}

/// A facility overlay marker. Not joined to municipality geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilityPoint {
    /// Facility name.
    pub name: String,
    /// Latitude (EPSG:4326).
    pub latitude: f64,
    /// Longitude (EPSG:4326).
    pub longitude: f64,
}

impl FacilityPoint {
    /// Dedup key over the (name, latitude, longitude) triple.
    #[must_use]
    pub fn dedup_key(&self) -> (String, u64, u64) {
        (
            self.name.clone(),
            self.latitude.to_bits(),
            self.longitude.to_bits(),
        )
    }
}

/// A persisted map view for one state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// `[lat, lng]`.
    pub center: [f64; 2],
    /// Integer zoom level.
    pub zoom: u8,
}

impl Viewport {
    /// Whole-country view used when nothing better is known.
    pub const BRAZIL: Self = Self {
        center: [-14.2350, -51.9253],
        zoom: 4,
    };
}

/// A latitude/longitude pair as reported by the rendering collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
}

/// The "last active view" record returned by the rendering collaborator
/// after a user interaction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LastActiveView {
    /// Map center.
    pub center: LatLng,
    /// Zoom level; may be fractional.
    pub zoom: f64,
}

impl From<LastActiveView> for Viewport {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn from(view: LastActiveView) -> Self {
        Self {
            center: [view.center.lat, view.center.lng],
            zoom: view.zoom.round().clamp(0.0, f64::from(u8::MAX)) as u8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_municipality_is_unjoined() {
        let m = Municipality::new(" Campinas ", StateCode::Sp, MultiPolygon(vec![]));
        assert_eq!(m.normalized_name, "CAMPINAS");
        assert!(m.rate.abs() < f64::EPSILON);
        assert_eq!(m.rate_status, RateStatus::Pending);
    }

    #[test]
    fn placeholder_name_is_one_based() {
        assert_eq!(Municipality::placeholder_name(0), "Municipality 1");
        assert_eq!(Municipality::placeholder_name(41), "Municipality 42");
    }

    #[test]
    fn viewport_from_last_active_view_rounds_zoom() {
        let view = LastActiveView {
            center: LatLng {
                lat: -22.9,
                lng: -47.06,
            },
            zoom: 7.6,
        };
        let vp = Viewport::from(view);
        assert_eq!(vp.center, [-22.9, -47.06]);
        assert_eq!(vp.zoom, 8);
    }

    #[test]
    fn facility_dedup_key_distinguishes_coordinates() {
        let a = FacilityPoint {
            name: "CAPS I".to_string(),
            latitude: -22.9,
            longitude: -47.0,
        };
        let mut b = a.clone();
        assert_eq!(a.dedup_key(), b.dedup_key());
        b.longitude = -47.1;
        assert_ne!(a.dedup_key(), b.dedup_key());
    }

    #[test]
    fn rate_status_serializes_screaming_snake() {
        assert_eq!(RateStatus::NoServiceMatch.as_ref(), "NO_SERVICE_MATCH");
        assert_eq!(
            "ZERO_POPULATION".parse::<RateStatus>().ok(),
            Some(RateStatus::ZeroPopulation)
        );
    }
}
