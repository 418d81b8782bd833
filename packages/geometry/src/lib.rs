#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Per-state municipality boundary loading.
//!
//! A [`GeometryRepository`] yields raw features (geometry plus attribute
//! row) with an optional declared CRS. [`GeometrySource`] turns those into
//! [`Municipality`] rows: one per input feature, reprojected to EPSG:4326
//! and simplified for transmission.

pub mod crs;
pub mod file;
pub mod simplify;

use caps_map_municipality_models::config::GeometryConfig;
use caps_map_municipality_models::{Municipality, StateCode};
use geo::MultiPolygon;
use thiserror::Error;

use crate::crs::Crs;
use crate::simplify::simplify_multipolygon;

/// Errors that can occur while loading geometry.
#[derive(Debug, Error)]
pub enum GeometryError {
    /// No geometry file exists for the state.
    #[error("No geometry found for state {state}")]
    NotFound {
        /// The requested state.
        state: StateCode,
    },

    /// Reading the geometry file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The geometry file is not valid `GeoJSON`.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// The declared CRS is not one we can reproject from.
    #[error("Unsupported coordinate reference system: {crs}")]
    UnsupportedCrs {
        /// The CRS name as declared.
        crs: String,
    },

    /// The file parsed but does not have the expected shape.
    #[error("Conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

/// One source feature: an optional geometry and its attribute row.
#[derive(Debug, Clone, Default)]
pub struct RawFeature {
    /// Feature geometry, if present.
    pub geometry: Option<geo::Geometry<f64>>,
    /// Attribute columns.
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

/// A raw per-state layer as yielded by a [`GeometryRepository`].
#[derive(Debug, Clone, Default)]
pub struct RawLayer {
    /// Declared CRS name, if any.
    pub crs: Option<String>,
    /// Features in source order.
    pub features: Vec<RawFeature>,
}

/// Geometry file repository keyed by state code.
///
/// Implementations must return [`GeometryError::NotFound`] when the state
/// has no file, and an empty [`RawLayer`] only when the file exists but
/// holds no features.
pub trait GeometryRepository {
    /// Fetches the raw layer for `state`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError`] if the layer is absent or unreadable.
    fn fetch(&self, state: StateCode) -> Result<RawLayer, GeometryError>;
}

impl<R: GeometryRepository + ?Sized> GeometryRepository for &R {
    fn fetch(&self, state: StateCode) -> Result<RawLayer, GeometryError> {
        (**self).fetch(state)
    }
}

/// Loads municipalities for a state from a [`GeometryRepository`].
pub struct GeometrySource<R> {
    repository: R,
    config: GeometryConfig,
}

impl<R: GeometryRepository> GeometrySource<R> {
    /// Creates a source over `repository`.
    #[must_use]
    pub const fn new(repository: R, config: GeometryConfig) -> Self {
        Self { repository, config }
    }

    /// Loads every municipality of `state`.
    ///
    /// The output has one row per source feature, in source order.
    /// Features without a usable name attribute are named
    /// `"Municipality {index+1}"`; features without areal geometry get an
    /// empty boundary.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::NotFound`] if the state has no geometry, or
    /// another [`GeometryError`] if the layer cannot be read or its CRS is
    /// unsupported.
    pub fn load(&self, state: StateCode) -> Result<Vec<Municipality>, GeometryError> {
        let layer = self.repository.fetch(state)?;
        let crs = Crs::resolve(layer.crs.as_deref())?;

        if !crs.is_geographic() {
            log::info!("{state}: reprojecting {crs:?} boundaries to EPSG:4326");
        }

        let tolerance = self.config.simplify_tolerance;
        let mut rejected_total = 0;

        let municipalities: Vec<Municipality> = layer
            .features
            .into_iter()
            .enumerate()
            .map(|(index, feature)| {
                let name = self
                    .display_name(&feature.attributes)
                    .unwrap_or_else(|| Municipality::placeholder_name(index));

                let boundary = feature.geometry.map_or_else(
                    || {
                        log::warn!("{state}: feature {index} ({name}) has no geometry");
                        MultiPolygon(vec![])
                    },
                    |geometry| {
                        to_multipolygon(geometry).unwrap_or_else(|| {
                            log::warn!("{state}: feature {index} ({name}) is not a polygon");
                            MultiPolygon(vec![])
                        })
                    },
                );

                let projected = crs.to_wgs84(&boundary);
                let (simplified, rejected) = simplify_multipolygon(&projected, tolerance);
                rejected_total += rejected;

                Municipality::new(name, state, simplified)
            })
            .collect();

        if rejected_total > 0 {
            log::debug!(
                "{state}: kept {rejected_total} polygon(s) unsimplified to preserve validity"
            );
        }
        log::info!("{state}: loaded {} municipalities", municipalities.len());

        Ok(municipalities)
    }

    fn display_name(&self, attributes: &serde_json::Map<String, serde_json::Value>) -> Option<String> {
        self.config.name_fields.iter().find_map(|field| {
            attributes
                .get(field)
                .and_then(serde_json::Value::as_str)
                .filter(|s| !s.trim().is_empty())
                .map(ToString::to_string)
        })
    }
}

/// Coerces areal geometry into a [`MultiPolygon`].
///
/// Geometry collections contribute their polygonal members. Returns
/// `None` for geometry with no areal component.
#[must_use]
pub fn to_multipolygon(geometry: geo::Geometry<f64>) -> Option<MultiPolygon<f64>> {
    match geometry {
        geo::Geometry::MultiPolygon(mp) => Some(mp),
        geo::Geometry::Polygon(p) => Some(MultiPolygon(vec![p])),
        geo::Geometry::Rect(r) => Some(MultiPolygon(vec![r.to_polygon()])),
        geo::Geometry::GeometryCollection(collection) => {
            let polygons: Vec<_> = collection
                .0
                .into_iter()
                .filter_map(to_multipolygon)
                .flat_map(|mp| mp.0)
                .collect();
            (!polygons.is_empty()).then_some(MultiPolygon(polygons))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use geo::{Geometry, polygon};
    use serde_json::json;

    use super::*;

    struct MemoryRepository {
        layers: BTreeMap<StateCode, RawLayer>,
    }

    impl GeometryRepository for MemoryRepository {
        fn fetch(&self, state: StateCode) -> Result<RawLayer, GeometryError> {
            self.layers
                .get(&state)
                .cloned()
                .ok_or(GeometryError::NotFound { state })
        }
    }

    fn feature(name: Option<&str>) -> RawFeature {
        let mut attributes = serde_json::Map::new();
        if let Some(name) = name {
            attributes.insert("NM_MUN".to_string(), json!(name));
        }
        attributes.insert("CD_MUN".to_string(), json!("3509502"));
        RawFeature {
            geometry: Some(Geometry::Polygon(polygon![
                (x: -47.2, y: -22.9),
                (x: -47.0, y: -22.9),
                (x: -47.0, y: -22.7),
                (x: -47.2, y: -22.9),
            ])),
            attributes,
        }
    }

    fn source(layer: RawLayer) -> GeometrySource<MemoryRepository> {
        let mut layers = BTreeMap::new();
        layers.insert(StateCode::Sp, layer);
        GeometrySource::new(MemoryRepository { layers }, GeometryConfig::default())
    }

    #[test]
    fn missing_state_is_not_found() {
        let err = source(RawLayer::default()).load(StateCode::Rj).unwrap_err();
        assert!(matches!(err, GeometryError::NotFound { state: StateCode::Rj }));
    }

    #[test]
    fn empty_layer_is_empty_not_error() {
        let loaded = source(RawLayer::default()).load(StateCode::Sp).unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn one_row_per_feature_with_placeholder_names() {
        let layer = RawLayer {
            crs: None,
            features: vec![feature(Some("Campinas")), feature(None), feature(Some("  "))],
        };
        let loaded = source(layer).load(StateCode::Sp).unwrap();
        let names: Vec<&str> = loaded.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Campinas", "Municipality 2", "Municipality 3"]);
        assert!(loaded.iter().all(|m| m.state_code == StateCode::Sp));
        assert_eq!(loaded[0].normalized_name, "CAMPINAS");
    }

    #[test]
    fn non_areal_geometry_keeps_its_row() {
        let mut point = feature(Some("Ponto"));
        point.geometry = Some(Geometry::Point(geo::Point::new(-47.0, -22.9)));
        let mut missing = feature(Some("Vazio"));
        missing.geometry = None;

        let layer = RawLayer {
            crs: None,
            features: vec![point, missing],
        };
        let loaded = source(layer).load(StateCode::Sp).unwrap();
        assert_eq!(loaded.len(), 2);
        assert!(loaded.iter().all(|m| m.geometry.0.is_empty()));
    }

    #[test]
    fn web_mercator_layer_is_reprojected() {
        let mut f = feature(Some("Campinas"));
        f.geometry = Some(Geometry::Polygon(polygon![
            (x: -5_238_000.0, y: -2_620_000.0),
            (x: -5_230_000.0, y: -2_620_000.0),
            (x: -5_230_000.0, y: -2_610_000.0),
            (x: -5_238_000.0, y: -2_620_000.0),
        ]));
        let layer = RawLayer {
            crs: Some("urn:ogc:def:crs:EPSG::3857".to_string()),
            features: vec![f],
        };
        let loaded = source(layer).load(StateCode::Sp).unwrap();
        let first = loaded[0].geometry.0[0].exterior().0[0];
        assert!(first.x > -48.0 && first.x < -46.0, "lon {}", first.x);
        assert!(first.y > -24.0 && first.y < -22.0, "lat {}", first.y);
    }

    #[test]
    fn unsupported_crs_fails_the_load() {
        let layer = RawLayer {
            crs: Some("EPSG:31983".to_string()),
            features: vec![feature(Some("Campinas"))],
        };
        let err = source(layer).load(StateCode::Sp).unwrap_err();
        assert!(matches!(err, GeometryError::UnsupportedCrs { .. }));
    }

    #[test]
    fn geometry_collection_contributes_polygons() {
        let collection = Geometry::GeometryCollection(geo::GeometryCollection(vec![
            Geometry::Point(geo::Point::new(0.0, 0.0)),
            Geometry::Polygon(polygon![
                (x: 0.0, y: 0.0),
                (x: 1.0, y: 0.0),
                (x: 1.0, y: 1.0),
                (x: 0.0, y: 0.0),
            ]),
        ]));
        let mp = to_multipolygon(collection).unwrap();
        assert_eq!(mp.0.len(), 1);
        assert!(to_multipolygon(Geometry::Point(geo::Point::new(0.0, 0.0))).is_none());
    }
}
