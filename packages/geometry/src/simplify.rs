//! Boundary simplification for transmission size.
//!
//! Each ring is reduced with Ramer-Douglas-Peucker ([`geo::Simplify`]),
//! which keeps its closing coordinate pinned. A polygon whose simplified
//! form is invalid (a ring collapsed below four coordinates, or an
//! introduced self-intersection) keeps its original rings instead.

use geo::{LineString, MultiPolygon, Polygon, Simplify, Validation};

/// Simplifies every polygon of `geometry` with the given tolerance (in
/// coordinate units).
///
/// Returns the simplified geometry and the number of polygons whose
/// simplification was rejected. A non-positive tolerance returns the
/// input unchanged.
#[must_use]
pub fn simplify_multipolygon(geometry: &MultiPolygon<f64>, tolerance: f64) -> (MultiPolygon<f64>, usize) {
    if tolerance <= 0.0 || !tolerance.is_finite() {
        return (geometry.clone(), 0);
    }

    let mut rejected = 0;
    let polygons = geometry
        .0
        .iter()
        .map(|polygon| {
            simplify_polygon(polygon, tolerance).unwrap_or_else(|| {
                rejected += 1;
                polygon.clone()
            })
        })
        .collect();

    (MultiPolygon(polygons), rejected)
}

/// Returns `None` when the simplified polygon would be invalid.
fn simplify_polygon(polygon: &Polygon<f64>, tolerance: f64) -> Option<Polygon<f64>> {
    let exterior = simplify_ring(polygon.exterior(), tolerance)?;
    let interiors = polygon
        .interiors()
        .iter()
        .map(|ring| simplify_ring(ring, tolerance))
        .collect::<Option<Vec<_>>>()?;

    let simplified = Polygon::new(exterior, interiors);

    // An already-invalid source polygon is not our regression to reject.
    if !simplified.is_valid() && polygon.is_valid() {
        return None;
    }

    Some(simplified)
}

/// Returns `None` when the ring would collapse below four coordinates.
fn simplify_ring(ring: &LineString<f64>, tolerance: f64) -> Option<LineString<f64>> {
    if ring.0.len() <= 4 {
        return Some(ring.clone());
    }

    let simplified = ring.simplify(tolerance);
    (simplified.0.len() >= 4).then_some(simplified)
}

#[cfg(test)]
mod tests {
    use geo::polygon;

    use super::*;

    fn dense_square() -> Polygon<f64> {
        // A unit square with near-collinear midpoints on every edge.
        polygon![
            (x: 0.0, y: 0.0),
            (x: 0.5, y: 0.0001),
            (x: 1.0, y: 0.0),
            (x: 0.9999, y: 0.5),
            (x: 1.0, y: 1.0),
            (x: 0.5, y: 0.9999),
            (x: 0.0, y: 1.0),
            (x: 0.0001, y: 0.5),
            (x: 0.0, y: 0.0),
        ]
    }

    #[test]
    fn zero_tolerance_is_identity() {
        let mp = MultiPolygon(vec![dense_square()]);
        let (out, rejected) = simplify_multipolygon(&mp, 0.0);
        assert_eq!(out, mp);
        assert_eq!(rejected, 0);
    }

    #[test]
    fn drops_near_collinear_vertices() {
        let mp = MultiPolygon(vec![dense_square()]);
        let (out, rejected) = simplify_multipolygon(&mp, 0.001);
        assert_eq!(rejected, 0);
        assert_eq!(out.0.len(), 1);
        assert_eq!(out.0[0].exterior().0.len(), 5);
    }

    #[test]
    fn preserves_ring_closure() {
        let mp = MultiPolygon(vec![dense_square()]);
        let (out, _) = simplify_multipolygon(&mp, 0.001);
        let ring = &out.0[0].exterior().0;
        assert_eq!(ring.first(), ring.last());
    }

    #[test]
    fn keeps_original_when_ring_would_collapse() {
        // A thin sliver: every interior vertex is within tolerance.
        let sliver: Polygon<f64> = polygon![
            (x: 0.0, y: 0.0),
            (x: 0.3, y: 0.0005),
            (x: 0.6, y: 0.0),
            (x: 1.0, y: 0.0005),
            (x: 0.5, y: 0.0008),
            (x: 0.0, y: 0.0),
        ];
        let mp = MultiPolygon(vec![sliver.clone()]);
        let (out, rejected) = simplify_multipolygon(&mp, 0.01);
        assert_eq!(rejected, 1);
        assert_eq!(out.0[0], sliver);
    }

    #[test]
    fn keeps_original_when_simplified_shell_would_cut_a_hole() {
        // The shell bulges 0.004 below y = 0 to wrap a small triangular
        // hole; at tolerance 0.01 the bulge flattens and leaves the hole
        // outside the shell.
        let notched: Polygon<f64> = Polygon::new(
            LineString::from(vec![
                (0.0, 0.0),
                (0.4, 0.0),
                (0.5, -0.004),
                (0.6, 0.0),
                (1.0, 0.0),
                (1.0, 1.0),
                (0.0, 1.0),
                (0.0, 0.0),
            ]),
            vec![LineString::from(vec![
                (0.48, -0.001),
                (0.52, -0.001),
                (0.5, -0.003),
                (0.48, -0.001),
            ])],
        );
        assert!(notched.is_valid());

        let mp = MultiPolygon(vec![notched.clone()]);
        let (out, rejected) = simplify_multipolygon(&mp, 0.01);
        assert_eq!(rejected, 1);
        assert_eq!(out.0[0], notched);
        assert!(out.is_valid());
    }
}
