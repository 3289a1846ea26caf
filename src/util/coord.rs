use crate::error::GeoSearchError;
use geo_types::Point;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A validated WGS84 latitude/longitude pair in decimal degrees.
///
/// Latitude is always within [-90, 90] and longitude within [-180, 180].
///
/// # Example
/// ```
/// use geo_radius::Coordinate;
///
/// # fn main() -> Result<(), geo_radius::GeoSearchError> {
/// let nyc = Coordinate::new(40.7128, -74.0060)?;
/// assert_eq!(nyc.latitude(), 40.7128);
/// assert!(Coordinate::new(91.0, 0.0).is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate", into = "RawCoordinate")]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

#[derive(Serialize, Deserialize)]
struct RawCoordinate {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = GeoSearchError;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Coordinate::new(raw.latitude, raw.longitude)
    }
}

impl From<Coordinate> for RawCoordinate {
    fn from(coord: Coordinate) -> Self {
        Self {
            latitude: coord.latitude,
            longitude: coord.longitude,
        }
    }
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoSearchError> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);

        if !valid {
            return Err(GeoSearchError::InvalidCoordinate {
                latitude,
                longitude,
            });
        }

        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Builds a coordinate from a `geo_types::Point` where x is longitude and y is latitude.
    pub fn from_point(point: &Point<f64>) -> Result<Self, GeoSearchError> {
        Self::new(point.y(), point.x())
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Returns the coordinate as a `geo_types::Point` (x = longitude, y = latitude).
    pub fn to_point(&self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }

    /// Latitude and longitude rounded to `places` decimals, scaled to integers.
    ///
    /// Used to build stable cache fingerprints without relying on float formatting.
    pub fn quantized(&self, places: i32) -> (i64, i64) {
        let scale = 10f64.powi(places);
        let lat = (self.latitude * scale).round() as i64;
        let lon = (self.longitude * scale).round() as i64;
        (lat, lon)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_bounds() -> Result<(), GeoSearchError> {
        Coordinate::new(90.0, 180.0)?;
        Coordinate::new(-90.0, -180.0)?;
        Coordinate::new(0.0, 0.0)?;
        Ok(())
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(Coordinate::new(90.0001, 0.0).is_err());
        assert!(Coordinate::new(0.0, -180.5).is_err());
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
        assert!(matches!(
            Coordinate::new(0.0, f64::INFINITY),
            Err(GeoSearchError::InvalidCoordinate { .. })
        ));
    }

    #[test]
    fn test_point_conversion() -> Result<(), GeoSearchError> {
        let point = Point::new(-74.0060, 40.7128);
        let coord = Coordinate::from_point(&point)?;
        assert_eq!(coord.latitude(), 40.7128);
        assert_eq!(coord.longitude(), -74.0060);
        assert_eq!(coord.to_point(), point);
        Ok(())
    }

    #[test]
    fn test_quantized_rounds_to_places() -> Result<(), GeoSearchError> {
        let a = Coordinate::new(40.71281, -74.00604)?;
        let b = Coordinate::new(40.71279, -74.00596)?;
        assert_eq!(a.quantized(4), (407128, -740060));
        assert_eq!(a.quantized(4), b.quantized(4));
        Ok(())
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Result<Coordinate, _> =
            serde_json::from_str(r#"{"latitude":51.5,"longitude":-0.12}"#);
        assert!(ok.is_ok());
        let bad: Result<Coordinate, _> =
            serde_json::from_str(r#"{"latitude":123.0,"longitude":0.0}"#);
        assert!(bad.is_err());
    }
}
