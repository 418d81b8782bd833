#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! `GeoJSON` export for the rendering collaborator.
//!
//! Municipality features carry only their geometry, display name, and rate
//! to keep the payload small. Facility points are exported as a separate
//! collection since they are plotted independently of the polygons.

use caps_map_municipality_models::{FacilityPoint, Municipality};
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, Value};
use serde_json::json;
use thiserror::Error;

/// Property holding the display name.
pub const NAME_PROPERTY: &str = "name";

/// Property holding the rate per 100,000.
pub const RATE_PROPERTY: &str = "rate";

/// Properties shown in the rendering collaborator's tooltip.
pub const TOOLTIP_FIELDS: &[&str] = &[NAME_PROPERTY, RATE_PROPERTY];

/// Errors that can occur while serializing or re-reading an export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The document is not valid `GeoJSON`.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// The document is valid `GeoJSON` but not a `FeatureCollection`.
    #[error("Expected a FeatureCollection")]
    NotACollection,
}

/// Exports municipalities as a feature collection, one feature per input
/// in input order.
#[must_use]
pub fn export_municipalities(municipalities: &[Municipality]) -> FeatureCollection {
    let features = municipalities
        .iter()
        .map(|municipality| {
            let mut properties = JsonObject::new();
            properties.insert(NAME_PROPERTY.to_string(), json!(municipality.name));
            properties.insert(RATE_PROPERTY.to_string(), json!(municipality.rate));

            Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::from(&municipality.geometry))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect::<Vec<_>>();

    log::debug!("Exported {} municipality features", features.len());

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// Exports facility points as a collection of `Point` features.
#[must_use]
pub fn export_facilities(points: &[FacilityPoint]) -> FeatureCollection {
    let features = points
        .iter()
        .map(|point| {
            let mut properties = JsonObject::new();
            properties.insert(NAME_PROPERTY.to_string(), json!(point.name));

            Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::Point(vec![
                    point.longitude,
                    point.latitude,
                ]))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// Serializes a collection to a JSON string.
///
/// # Errors
///
/// Returns [`ExportError::Json`] if serialization fails.
pub fn to_json_string(collection: &FeatureCollection) -> Result<String, ExportError> {
    Ok(serde_json::to_string(collection)?)
}

/// Parses a previously exported collection.
///
/// # Errors
///
/// Returns [`ExportError::GeoJson`] if the string is not `GeoJSON`, or
/// [`ExportError::NotACollection`] if it is not a `FeatureCollection`.
pub fn parse_feature_collection(contents: &str) -> Result<FeatureCollection, ExportError> {
    match contents.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(collection) => Ok(collection),
        GeoJson::Feature(_) | GeoJson::Geometry(_) => Err(ExportError::NotACollection),
    }
}

/// Reads the rate property of each feature, in order.
#[must_use]
pub fn feature_rates(collection: &FeatureCollection) -> Vec<Option<f64>> {
    collection
        .features
        .iter()
        .map(|feature| {
            feature
                .property(RATE_PROPERTY)
                .and_then(serde_json::Value::as_f64)
        })
        .collect()
}
