//! Coordinate reference system resolution and reprojection to EPSG:4326.
//!
//! Only the systems municipal boundary files are actually published in
//! are supported: WGS84, SIRGAS 2000 (coincident with WGS84 at map
//! precision, passed through unchanged), and Web Mercator.

use geo::{Coord, MapCoords, MultiPolygon};

use crate::GeometryError;

/// Spherical Web Mercator radius in meters.
const WEB_MERCATOR_RADIUS: f64 = 6_378_137.0;

/// A supported source coordinate reference system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crs {
    /// EPSG:4326 / OGC CRS84.
    Wgs84,
    /// EPSG:4674.
    Sirgas2000,
    /// EPSG:3857 and its legacy aliases.
    WebMercator,
}

impl Crs {
    /// Parses a CRS name such as `EPSG:4326`, `urn:ogc:def:crs:EPSG::3857`
    /// or `urn:ogc:def:crs:OGC:1.3:CRS84`.
    ///
    /// Returns `None` for unsupported systems.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let upper = name.trim().to_ascii_uppercase();
        if upper.ends_with("CRS84") {
            return Some(Self::Wgs84);
        }

        match upper.rsplit(':').next()?.trim() {
            "4326" => Some(Self::Wgs84),
            "4674" => Some(Self::Sirgas2000),
            "3857" | "3785" | "900913" | "102100" => Some(Self::WebMercator),
            _ => None,
        }
    }

    /// Resolves an optional CRS name, assuming EPSG:4326 when unset.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::UnsupportedCrs`] if the name is set but not
    /// a supported system.
    pub fn resolve(name: Option<&str>) -> Result<Self, GeometryError> {
        let Some(name) = name else {
            log::debug!("No CRS declared, assuming EPSG:4326");
            return Ok(Self::Wgs84);
        };

        Self::parse(name).ok_or_else(|| GeometryError::UnsupportedCrs {
            crs: name.to_string(),
        })
    }

    /// Whether coordinates in this system are already lon/lat degrees.
    #[must_use]
    pub const fn is_geographic(self) -> bool {
        matches!(self, Self::Wgs84 | Self::Sirgas2000)
    }

    /// Reprojects a boundary into EPSG:4326.
    #[must_use]
    pub fn to_wgs84(self, geometry: &MultiPolygon<f64>) -> MultiPolygon<f64> {
        if self.is_geographic() {
            return geometry.clone();
        }
        geometry.map_coords(web_mercator_to_lon_lat)
    }
}

/// Inverse spherical Mercator.
fn web_mercator_to_lon_lat(coord: Coord<f64>) -> Coord<f64> {
    Coord {
        x: (coord.x / WEB_MERCATOR_RADIUS).to_degrees(),
        y: (coord.y / WEB_MERCATOR_RADIUS).sinh().atan().to_degrees(),
    }
}

#[cfg(test)]
mod tests {
    use geo::{Polygon, polygon};

    use super::*;

    #[test]
    fn parses_common_spellings() {
        assert_eq!(Crs::parse("EPSG:4326"), Some(Crs::Wgs84));
        assert_eq!(Crs::parse("epsg:4674"), Some(Crs::Sirgas2000));
        assert_eq!(Crs::parse("urn:ogc:def:crs:EPSG::3857"), Some(Crs::WebMercator));
        assert_eq!(
            Crs::parse("urn:ogc:def:crs:OGC:1.3:CRS84"),
            Some(Crs::Wgs84)
        );
        assert_eq!(Crs::parse("EPSG:31983"), None);
    }

    #[test]
    fn unset_crs_assumes_wgs84() {
        assert_eq!(Crs::resolve(None).unwrap(), Crs::Wgs84);
    }

    #[test]
    fn unsupported_crs_is_an_error() {
        let err = Crs::resolve(Some("EPSG:31983")).unwrap_err();
        assert!(matches!(err, GeometryError::UnsupportedCrs { crs } if crs == "EPSG:31983"));
    }

    #[test]
    fn geographic_systems_pass_through() {
        let poly: Polygon<f64> = polygon![
            (x: -47.0, y: -22.0),
            (x: -46.9, y: -22.0),
            (x: -46.9, y: -22.1),
            (x: -47.0, y: -22.0),
        ];
        let mp = MultiPolygon(vec![poly]);
        assert_eq!(Crs::Sirgas2000.to_wgs84(&mp), mp);
    }

    #[test]
    fn inverse_mercator_recovers_degrees() {
        // Campinas, roughly: lon -47.06, lat -22.90
        let lon = -47.06_f64;
        let lat = -22.90_f64;
        let x = lon.to_radians() * WEB_MERCATOR_RADIUS;
        let y = lat.to_radians().tan().asinh() * WEB_MERCATOR_RADIUS;

        let back = web_mercator_to_lon_lat(Coord { x, y });
        assert!((back.x - lon).abs() < 1e-9);
        assert!((back.y - lat).abs() < 1e-9);
    }
}
