use crate::core::units::DistanceUnit;
use crate::error::GeoSearchError;
use crate::util::coord::Coordinate;
use geo_types::{Coord, Polygon, Rect, coord};
use serde::{Deserialize, Serialize};

/// Rectangular latitude/longitude envelope in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn contains(&self, coord: &Coordinate) -> bool {
        (self.min_lat..=self.max_lat).contains(&coord.latitude())
            && (self.min_lon..=self.max_lon).contains(&coord.longitude())
    }

    /// True when the envelope spans every longitude.
    pub fn spans_all_longitudes(&self) -> bool {
        self.min_lon <= -180.0 && self.max_lon >= 180.0
    }

    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(
            coord! { x: self.min_lon, y: self.min_lat },
            coord! { x: self.max_lon, y: self.max_lat },
        )
    }

    pub fn from_rect(rect: &Rect<f64>) -> Self {
        Self {
            min_lat: rect.min().y,
            max_lat: rect.max().y,
            min_lon: rect.min().x,
            max_lon: rect.max().x,
        }
    }
}

/// Computes a lat/lon envelope containing every point within `radius` of `center`.
///
/// The latitude half-width is the angular radius. The longitude half-width is
/// widened for meridian convergence (`asin(sin δ / cos φ)`), so the box is a true
/// superset on a sphere. Near the poles, or when the box would cross the
/// antimeridian, it falls back to the full longitude range. The result is meant
/// as a cheap pre-filter only; exact distances still decide membership.
///
/// # Example
/// ```
/// use geo_radius::{Coordinate, DistanceUnit, bounding_box};
///
/// # fn main() -> Result<(), geo_radius::GeoSearchError> {
/// let bbox = bounding_box(&Coordinate::new(0.0, 0.0)?, 111.19, DistanceUnit::Kilometers)?;
/// assert!((bbox.max_lat - 1.0).abs() < 0.001);
/// assert!((bbox.max_lon - 1.0).abs() < 0.001);
/// # Ok(())
/// # }
/// ```
pub fn bounding_box(
    center: &Coordinate,
    radius: f64,
    unit: DistanceUnit,
) -> Result<BoundingBox, GeoSearchError> {
    if !radius.is_finite() || radius <= 0.0 {
        return Err(GeoSearchError::InvalidRadius(radius));
    }

    let angular = radius / unit.earth_radius();
    let lat = center.latitude();
    let lon = center.longitude();
    let lat_delta = angular.to_degrees();

    let min_lat = (lat - lat_delta).max(-90.0);
    let max_lat = (lat + lat_delta).min(90.0);

    let cos_lat = lat.to_radians().cos();
    let sin_angular = angular.min(std::f64::consts::FRAC_PI_2).sin();

    // Pole inside the circle or circle touching it: every longitude is reachable.
    if min_lat <= -90.0 || max_lat >= 90.0 || sin_angular >= cos_lat {
        return Ok(BoundingBox {
            min_lat,
            max_lat,
            min_lon: -180.0,
            max_lon: 180.0,
        });
    }

    let lon_delta = (sin_angular / cos_lat).asin().to_degrees();
    let (min_lon, max_lon) = if lon - lon_delta < -180.0 || lon + lon_delta > 180.0 {
        (-180.0, 180.0)
    } else {
        (lon - lon_delta, lon + lon_delta)
    };

    Ok(BoundingBox {
        min_lat,
        max_lat,
        min_lon,
        max_lon,
    })
}

/// Spherical midpoint of the great-circle segment between two points.
pub fn midpoint(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> Result<Coordinate, GeoSearchError> {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let lambda1 = lon1.to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let bx = phi2.cos() * d_lambda.cos();
    let by = phi2.cos() * d_lambda.sin();

    let phi_m = (phi1.sin() + phi2.sin()).atan2(((phi1.cos() + bx).powi(2) + by * by).sqrt());
    let lambda_m = lambda1 + by.atan2(phi1.cos() + bx);

    Coordinate::new(phi_m.to_degrees(), normalize_longitude(lambda_m.to_degrees()))
}

fn normalize_longitude(lon: f64) -> f64 {
    let wrapped = (lon + 540.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 && lon > 0.0 { 180.0 } else { wrapped }
}

/// Ray-casting point-in-polygon test using the odd-crossing rule.
///
/// `polygon` is a ring of `(lon, lat)` vertices; closing the ring is optional.
/// The polygon is assumed simple. Results for self-intersecting rings are unspecified,
/// as are points lying exactly on an edge.
///
/// # Example
/// ```
/// use geo_radius::{Coordinate, point_in_polygon};
///
/// # fn main() -> Result<(), geo_radius::GeoSearchError> {
/// let square = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
/// assert!(point_in_polygon(&Coordinate::new(0.5, 0.5)?, &square));
/// assert!(!point_in_polygon(&Coordinate::new(1.5, 0.5)?, &square));
/// # Ok(())
/// # }
/// ```
pub fn point_in_polygon(point: &Coordinate, polygon: &[(f64, f64)]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }

    let (x, y) = (point.longitude(), point.latitude());
    let mut inside = false;
    let mut j = n - 1;

    for i in 0..n {
        let (xi, yi) = polygon[i];
        let (xj, yj) = polygon[j];

        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }

    inside
}

/// Point-in-polygon against a `geo_types::Polygon`'s exterior ring, minus any holes.
pub fn point_in_geo_polygon(point: &Coordinate, polygon: &Polygon<f64>) -> bool {
    if !point_in_polygon(point, &ring_vertices(&polygon.exterior().0)) {
        return false;
    }

    !polygon
        .interiors()
        .iter()
        .any(|hole| point_in_polygon(point, &ring_vertices(&hole.0)))
}

fn ring_vertices(coords: &[Coord<f64>]) -> Vec<(f64, f64)> {
    coords.iter().map(|c| (c.x, c.y)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::distance::haversine;
    use geo::Contains;
    use geo_types::{LineString, point};

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    #[test]
    fn test_bounding_box_at_equator() -> Result<(), GeoSearchError> {
        let bbox = bounding_box(&coord(0.0, 0.0), 111.19, DistanceUnit::Kilometers)?;
        assert!((bbox.min_lat + 1.0).abs() < 0.001);
        assert!((bbox.max_lat - 1.0).abs() < 0.001);
        assert!((bbox.min_lon + 1.0).abs() < 0.001);
        assert!((bbox.max_lon - 1.0).abs() < 0.001);
        Ok(())
    }

    #[test]
    fn test_bounding_box_widens_with_latitude() -> Result<(), GeoSearchError> {
        let equator = bounding_box(&coord(0.0, 10.0), 50.0, DistanceUnit::Kilometers)?;
        let north = bounding_box(&coord(60.0, 10.0), 50.0, DistanceUnit::Kilometers)?;
        let eq_width = equator.max_lon - equator.min_lon;
        let north_width = north.max_lon - north.min_lon;
        assert!((north_width / eq_width - 2.0).abs() < 0.01);
        Ok(())
    }

    #[test]
    fn test_bounding_box_contains_circle() -> Result<(), GeoSearchError> {
        let center = coord(55.0, 37.0);
        let radius = 200.0;
        let bbox = bounding_box(&center, radius, DistanceUnit::Kilometers)?;

        // Sample points on the circle boundary by bisecting along each bearing.
        for step in 0..72 {
            let bearing = (step as f64 * 5.0).to_radians();
            let (mut lo, mut hi) = (0.0_f64, 10.0_f64);
            for _ in 0..60 {
                let mid = (lo + hi) / 2.0;
                let lat = center.latitude() + mid * bearing.cos();
                let lon = center.longitude() + mid * bearing.sin();
                let d = haversine(
                    center.latitude(),
                    center.longitude(),
                    lat,
                    lon,
                    DistanceUnit::Kilometers,
                );
                if d < radius {
                    lo = mid;
                } else {
                    hi = mid;
                }
            }
            let edge = coord(
                center.latitude() + lo * bearing.cos(),
                center.longitude() + lo * bearing.sin(),
            );
            assert!(bbox.contains(&edge), "bearing {}", step * 5);
        }
        Ok(())
    }

    #[test]
    fn test_bounding_box_near_pole_spans_all_longitudes() -> Result<(), GeoSearchError> {
        let bbox = bounding_box(&coord(89.95, 0.0), 20.0, DistanceUnit::Kilometers)?;
        assert!(bbox.spans_all_longitudes());
        assert_eq!(bbox.max_lat, 90.0);
        Ok(())
    }

    #[test]
    fn test_bounding_box_across_antimeridian() -> Result<(), GeoSearchError> {
        let bbox = bounding_box(&coord(0.0, 179.9), 50.0, DistanceUnit::Kilometers)?;
        assert!(bbox.spans_all_longitudes());
        Ok(())
    }

    #[test]
    fn test_bounding_box_rejects_bad_radius() {
        assert!(bounding_box(&coord(0.0, 0.0), 0.0, DistanceUnit::Miles).is_err());
        assert!(bounding_box(&coord(0.0, 0.0), -3.0, DistanceUnit::Miles).is_err());
        assert!(bounding_box(&coord(0.0, 0.0), f64::NAN, DistanceUnit::Miles).is_err());
    }

    #[test]
    fn test_midpoint_on_equator() -> Result<(), GeoSearchError> {
        let mid = midpoint(0.0, 0.0, 0.0, 10.0)?;
        assert!(mid.latitude().abs() < 1e-9);
        assert!((mid.longitude() - 5.0).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn test_midpoint_is_equidistant() -> Result<(), GeoSearchError> {
        let mid = midpoint(40.7128, -74.0060, 51.5074, -0.1278)?;
        let km = DistanceUnit::Kilometers;
        let a = haversine(40.7128, -74.0060, mid.latitude(), mid.longitude(), km);
        let b = haversine(51.5074, -0.1278, mid.latitude(), mid.longitude(), km);
        assert!((a - b).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn test_midpoint_across_antimeridian() -> Result<(), GeoSearchError> {
        let mid = midpoint(0.0, 170.0, 0.0, -170.0)?;
        assert!((mid.longitude().abs() - 180.0).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn test_point_in_rotated_square() {
        // A diamond: the unit square rotated by 45 degrees around (0, 0).
        let diamond = [(0.0, -1.0), (1.0, 0.0), (0.0, 1.0), (-1.0, 0.0)];
        assert!(point_in_polygon(&coord(0.2, 0.2), &diamond));
        assert!(point_in_polygon(&coord(-0.4, 0.1), &diamond));
        assert!(!point_in_polygon(&coord(0.8, 0.8), &diamond));
        assert!(!point_in_polygon(&coord(0.0, 1.5), &diamond));
    }

    #[test]
    fn test_point_in_concave_polygon_agrees_with_geo() {
        let ring = vec![
            (0.0, 0.0),
            (4.0, 0.0),
            (4.0, 4.0),
            (2.0, 1.5),
            (0.0, 4.0),
            (0.0, 0.0),
        ];
        let polygon = Polygon::new(LineString::from(ring.clone()), vec![]);

        for (lat, lon) in [(1.0, 1.0), (3.0, 2.0), (3.0, 1.0), (3.0, 3.0), (0.5, 3.5), (5.0, 2.0)] {
            let ours = point_in_polygon(&coord(lat, lon), &ring);
            let theirs = polygon.contains(&point! { x: lon, y: lat });
            assert_eq!(ours, theirs, "({lat}, {lon})");
        }
    }

    #[test]
    fn test_point_in_geo_polygon_respects_holes() {
        let outer = LineString::from(vec![
            (0.0, 0.0),
            (10.0, 0.0),
            (10.0, 10.0),
            (0.0, 10.0),
            (0.0, 0.0),
        ]);
        let hole =
            LineString::from(vec![(4.0, 4.0), (6.0, 4.0), (6.0, 6.0), (4.0, 6.0), (4.0, 4.0)]);
        let polygon = Polygon::new(outer, vec![hole]);

        assert!(point_in_geo_polygon(&coord(2.0, 2.0), &polygon));
        assert!(!point_in_geo_polygon(&coord(5.0, 5.0), &polygon));
        assert!(!point_in_geo_polygon(&coord(11.0, 5.0), &polygon));
    }

    #[test]
    fn test_degenerate_polygon_is_never_inside() {
        assert!(!point_in_polygon(&coord(0.0, 0.0), &[(0.0, 0.0), (1.0, 1.0)]));
    }
}
