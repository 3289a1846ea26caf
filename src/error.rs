use crate::store::StoreError;
use thiserror::Error;

/// Error type for geo-radius operations.
#[derive(Debug, Error)]
pub enum GeoSearchError {
    /// Latitude outside [-90, 90], longitude outside [-180, 180], or a non-finite value.
    #[error("Invalid coordinate: latitude={latitude}, longitude={longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },
    /// Radius must be finite and strictly positive.
    #[error("Invalid radius: {0}")]
    InvalidRadius(f64),
    /// Result limits must be strictly positive.
    #[error("Invalid limit: {0}")]
    InvalidLimit(usize),
    /// Unit name not one of kilometers, miles, meters, feet.
    #[error("Unknown distance unit: {0}")]
    UnknownUnit(String),
    /// Algorithm name not one of haversine, vincenty, spherical_law.
    #[error("Unknown distance algorithm: {0}")]
    UnknownAlgorithm(String),
    /// Configuration rejected by validation or failed to parse.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// The address store failed to answer a query.
    #[error("Address store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
    /// The caller cancelled a batch before this item started.
    #[error("Operation cancelled")]
    Cancelled,
    /// Failed to parse geometry from string (GeoJSON or WKT).
    #[error("Geometry parse error: {0}")]
    GeometryParse(String),
    /// CSV parsing or reading error.
    #[error("CSV error: {0}")]
    Csv(String),
    /// Vincenty's iteration did not converge or the points were coincident.
    #[error("Vincenty precision limit: {0}")]
    PrecisionLimit(String),
}

impl GeoSearchError {
    /// True for errors raised before any store or cache access because the input was malformed.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            GeoSearchError::InvalidCoordinate { .. }
                | GeoSearchError::InvalidRadius(_)
                | GeoSearchError::InvalidLimit(_)
                | GeoSearchError::UnknownUnit(_)
                | GeoSearchError::UnknownAlgorithm(_)
                | GeoSearchError::InvalidConfig(_)
        )
    }
}

impl From<csv::Error> for GeoSearchError {
    fn from(err: csv::Error) -> Self {
        GeoSearchError::Csv(err.to_string())
    }
}
