use crate::core::constants::{
    EARTH_RADIUS_FEET, EARTH_RADIUS_KM, EARTH_RADIUS_METERS, EARTH_RADIUS_MILES,
};
use crate::core::distance::{haversine, spherical_law, vincenty};
use crate::error::GeoSearchError;
use crate::util::coord::Coordinate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unit a distance or radius is expressed in.
///
/// Every unit carries its own Earth-radius constant; conversions always go
/// through those constants rather than through cross-unit factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceUnit {
    #[default]
    Kilometers,
    Miles,
    Meters,
    Feet,
}

impl DistanceUnit {
    pub const ALL: [DistanceUnit; 4] = [
        DistanceUnit::Kilometers,
        DistanceUnit::Miles,
        DistanceUnit::Meters,
        DistanceUnit::Feet,
    ];

    /// Mean Earth radius expressed in this unit.
    pub fn earth_radius(self) -> f64 {
        match self {
            DistanceUnit::Kilometers => EARTH_RADIUS_KM,
            DistanceUnit::Miles => EARTH_RADIUS_MILES,
            DistanceUnit::Meters => EARTH_RADIUS_METERS,
            DistanceUnit::Feet => EARTH_RADIUS_FEET,
        }
    }

    /// Number of meters in one of this unit, derived from the radius table.
    ///
    /// ```
    /// use geo_radius::DistanceUnit;
    ///
    /// assert_eq!(DistanceUnit::Kilometers.meters_per_unit(), 1000.0);
    /// assert!((DistanceUnit::Feet.meters_per_unit() - 0.3048).abs() < 1e-6);
    /// ```
    pub fn meters_per_unit(self) -> f64 {
        EARTH_RADIUS_METERS / self.earth_radius()
    }

    /// Converts a length in meters into this unit.
    pub fn from_meters(self, meters: f64) -> f64 {
        meters / self.meters_per_unit()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DistanceUnit::Kilometers => "kilometers",
            DistanceUnit::Miles => "miles",
            DistanceUnit::Meters => "meters",
            DistanceUnit::Feet => "feet",
        }
    }
}

impl fmt::Display for DistanceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistanceUnit {
    type Err = GeoSearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kilometers" | "km" => Ok(DistanceUnit::Kilometers),
            "miles" | "mi" => Ok(DistanceUnit::Miles),
            "meters" | "m" => Ok(DistanceUnit::Meters),
            "feet" | "ft" => Ok(DistanceUnit::Feet),
            _ => Err(GeoSearchError::UnknownUnit(s.to_string())),
        }
    }
}

/// Great-circle distance formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceAlgorithm {
    /// Spherical Earth, numerically stable at every scale.
    #[default]
    Haversine,
    /// WGS84 ellipsoid, iterative. Returns 0 when it cannot converge.
    Vincenty,
    /// Spherical law of cosines. Loses precision below roughly a meter.
    SphericalLaw,
}

impl DistanceAlgorithm {
    pub const ALL: [DistanceAlgorithm; 3] = [
        DistanceAlgorithm::Haversine,
        DistanceAlgorithm::Vincenty,
        DistanceAlgorithm::SphericalLaw,
    ];

    /// Distance between two raw lat/lon pairs.
    pub fn compute(self, lat1: f64, lon1: f64, lat2: f64, lon2: f64, unit: DistanceUnit) -> f64 {
        match self {
            DistanceAlgorithm::Haversine => haversine(lat1, lon1, lat2, lon2, unit),
            DistanceAlgorithm::Vincenty => vincenty(lat1, lon1, lat2, lon2, unit),
            DistanceAlgorithm::SphericalLaw => spherical_law(lat1, lon1, lat2, lon2, unit),
        }
    }

    /// Distance between two coordinates.
    pub fn distance(self, a: &Coordinate, b: &Coordinate, unit: DistanceUnit) -> f64 {
        self.compute(a.latitude(), a.longitude(), b.latitude(), b.longitude(), unit)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DistanceAlgorithm::Haversine => "haversine",
            DistanceAlgorithm::Vincenty => "vincenty",
            DistanceAlgorithm::SphericalLaw => "spherical_law",
        }
    }
}

impl fmt::Display for DistanceAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistanceAlgorithm {
    type Err = GeoSearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "haversine" => Ok(DistanceAlgorithm::Haversine),
            "vincenty" => Ok(DistanceAlgorithm::Vincenty),
            "spherical_law" | "spherical-law" => Ok(DistanceAlgorithm::SphericalLaw),
            _ => Err(GeoSearchError::UnknownAlgorithm(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_parsing() -> Result<(), GeoSearchError> {
        assert_eq!("kilometers".parse::<DistanceUnit>()?, DistanceUnit::Kilometers);
        assert_eq!("Miles".parse::<DistanceUnit>()?, DistanceUnit::Miles);
        assert_eq!("ft".parse::<DistanceUnit>()?, DistanceUnit::Feet);
        assert!(matches!(
            "furlongs".parse::<DistanceUnit>(),
            Err(GeoSearchError::UnknownUnit(_))
        ));
        Ok(())
    }

    #[test]
    fn test_algorithm_parsing() -> Result<(), GeoSearchError> {
        assert_eq!(
            "spherical_law".parse::<DistanceAlgorithm>()?,
            DistanceAlgorithm::SphericalLaw
        );
        assert_eq!("VINCENTY".parse::<DistanceAlgorithm>()?, DistanceAlgorithm::Vincenty);
        let err = "manhattan".parse::<DistanceAlgorithm>().unwrap_err();
        assert!(err.is_invalid_input());
        Ok(())
    }

    #[test]
    fn test_meters_per_unit_comes_from_radius_table() {
        for unit in DistanceUnit::ALL {
            let rebuilt = unit.earth_radius() * unit.meters_per_unit();
            assert!((rebuilt - EARTH_RADIUS_METERS).abs() < 1e-6);
        }
        assert_eq!(DistanceUnit::Meters.meters_per_unit(), 1.0);
    }

    #[test]
    fn test_serde_names() -> Result<(), serde_json::Error> {
        assert_eq!(serde_json::to_string(&DistanceUnit::Miles)?, "\"miles\"");
        assert_eq!(
            serde_json::to_string(&DistanceAlgorithm::SphericalLaw)?,
            "\"spherical_law\""
        );
        let unit: DistanceUnit = serde_json::from_str("\"feet\"")?;
        assert_eq!(unit, DistanceUnit::Feet);
        Ok(())
    }

    #[test]
    fn test_display_round_trips_through_from_str() -> Result<(), GeoSearchError> {
        for algorithm in DistanceAlgorithm::ALL {
            assert_eq!(algorithm.to_string().parse::<DistanceAlgorithm>()?, algorithm);
        }
        Ok(())
    }
}
