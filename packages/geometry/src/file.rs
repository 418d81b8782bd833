//! `GeoJSON` file repository: one `FeatureCollection` per state under
//! `{root}/geometry/{UF}.geojson`.
//!
//! A legacy named `crs` member (`{"type": "name", "properties": {"name":
//! "EPSG:..."}}`) is honored when present.

use std::path::{Path, PathBuf};

use caps_map_municipality_models::StateCode;
use geojson::GeoJson;

use crate::{GeometryError, GeometryRepository, RawFeature, RawLayer};

/// Reads per-state `GeoJSON` files from a directory.
#[derive(Debug, Clone)]
pub struct GeoJsonFileRepository {
    dir: PathBuf,
}

impl GeoJsonFileRepository {
    /// Creates a repository reading from `{data_root}/geometry`.
    #[must_use]
    pub fn new(data_root: &Path) -> Self {
        Self {
            dir: data_root.join("geometry"),
        }
    }

    /// Path of the file for `state`.
    #[must_use]
    pub fn path_for(&self, state: StateCode) -> PathBuf {
        self.dir.join(format!("{state}.geojson"))
    }
}

impl GeometryRepository for GeoJsonFileRepository {
    fn fetch(&self, state: StateCode) -> Result<RawLayer, GeometryError> {
        let path = self.path_for(state);
        if !path.is_file() {
            return Err(GeometryError::NotFound { state });
        }

        log::debug!("Reading geometry from {}", path.display());
        let contents = std::fs::read_to_string(&path)?;
        parse_layer(&contents)
    }
}

/// Parses a `GeoJSON` document into a [`RawLayer`].
///
/// Accepts a `FeatureCollection` or a single `Feature`.
///
/// # Errors
///
/// Returns [`GeometryError::GeoJson`] if the document is not valid
/// `GeoJSON`, or [`GeometryError::Conversion`] if it is a bare geometry or
/// a feature geometry cannot be converted.
pub fn parse_layer(contents: &str) -> Result<RawLayer, GeometryError> {
    let geojson: GeoJson = contents.parse()?;

    let (features, foreign_members) = match geojson {
        GeoJson::FeatureCollection(collection) => {
            (collection.features, collection.foreign_members)
        }
        GeoJson::Feature(feature) => (vec![feature], None),
        GeoJson::Geometry(_) => {
            return Err(GeometryError::Conversion {
                message: "expected a FeatureCollection, found a bare geometry".to_string(),
            });
        }
    };

    let crs = foreign_members.as_ref().and_then(|members| {
        members
            .get("crs")?
            .get("properties")?
            .get("name")?
            .as_str()
            .map(ToString::to_string)
    });

    let features = features
        .into_iter()
        .enumerate()
        .map(|(index, feature)| {
            let geometry = feature
                .geometry
                .map(geo::Geometry::<f64>::try_from)
                .transpose()
                .map_err(|e| GeometryError::Conversion {
                    message: format!("feature {index}: {e}"),
                })?;

            Ok(RawFeature {
                geometry,
                attributes: feature.properties.unwrap_or_default(),
            })
        })
        .collect::<Result<Vec<_>, GeometryError>>()?;

    Ok(RawLayer { crs, features })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LAYER: &str = r#"{
        "type": "FeatureCollection",
        "crs": { "type": "name", "properties": { "name": "urn:ogc:def:crs:EPSG::4674" } },
        "features": [
            {
                "type": "Feature",
                "properties": { "NM_MUN": "Campinas", "CD_MUN": "3509502" },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[-47.2, -22.9], [-47.0, -22.9], [-47.0, -22.7], [-47.2, -22.9]]]
                }
            },
            {
                "type": "Feature",
                "properties": null,
                "geometry": null
            }
        ]
    }"#;

    #[test]
    fn parses_features_and_crs() {
        let layer = parse_layer(LAYER).unwrap();
        assert_eq!(layer.crs.as_deref(), Some("urn:ogc:def:crs:EPSG::4674"));
        assert_eq!(layer.features.len(), 2);
        assert_eq!(
            layer.features[0].attributes.get("NM_MUN").and_then(|v| v.as_str()),
            Some("Campinas")
        );
        assert!(matches!(
            layer.features[0].geometry,
            Some(geo::Geometry::Polygon(_))
        ));
        assert!(layer.features[1].geometry.is_none());
        assert!(layer.features[1].attributes.is_empty());
    }

    #[test]
    fn missing_crs_member_is_none() {
        let layer = parse_layer(r#"{"type": "FeatureCollection", "features": []}"#).unwrap();
        assert!(layer.crs.is_none());
        assert!(layer.features.is_empty());
    }

    #[test]
    fn bare_geometry_is_rejected() {
        let err = parse_layer(r#"{"type": "Point", "coordinates": [0.0, 0.0]}"#).unwrap_err();
        assert!(matches!(err, GeometryError::Conversion { .. }));
    }

    #[test]
    fn invalid_json_is_a_geojson_error() {
        assert!(matches!(
            parse_layer("{not json").unwrap_err(),
            GeometryError::GeoJson(_)
        ));
    }

    #[test]
    fn absent_file_is_not_found() {
        let repo = GeoJsonFileRepository::new(Path::new("/nonexistent/caps-map-data"));
        let err = repo.fetch(StateCode::Sp).unwrap_err();
        assert!(matches!(err, GeometryError::NotFound { state: StateCode::Sp }));
        assert!(repo.path_for(StateCode::Sp).ends_with("geometry/SP.geojson"));
    }
}
