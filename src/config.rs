use crate::core::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_CACHE_PREFIX, DEFAULT_DISTANCE_TTL_SECS, DEFAULT_LIMIT,
    DEFAULT_PARTITION_SIZE, DEFAULT_PREFILTER_MARGIN, DEFAULT_SEARCH_TTL_SECS,
};
use crate::core::units::{DistanceAlgorithm, DistanceUnit};
use crate::error::GeoSearchError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cache settings for search results and memoized distances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Namespace prepended to every key written by the search service.
    pub prefix: String,
    pub search_ttl_secs: u64,
    pub distance_ttl_secs: u64,
    /// Cell size in degrees of the grid index built by `optimize_store`.
    pub spatial_partition_size: f64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            prefix: DEFAULT_CACHE_PREFIX.to_string(),
            search_ttl_secs: DEFAULT_SEARCH_TTL_SECS,
            distance_ttl_secs: DEFAULT_DISTANCE_TTL_SECS,
            spatial_partition_size: DEFAULT_PARTITION_SIZE,
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn search_ttl(mut self, ttl: Duration) -> Self {
        self.search_ttl_secs = ttl.as_secs();
        self
    }

    pub fn distance_ttl(mut self, ttl: Duration) -> Self {
        self.distance_ttl_secs = ttl.as_secs();
        self
    }

    pub fn search_ttl_duration(&self) -> Duration {
        Duration::from_secs(self.search_ttl_secs)
    }

    pub fn distance_ttl_duration(&self) -> Duration {
        Duration::from_secs(self.distance_ttl_secs)
    }
}

/// Configuration for [`RadiusSearchService`](crate::RadiusSearchService).
///
/// # Example
/// ```
/// use geo_radius::{DistanceUnit, SearchConfig};
///
/// # fn main() -> Result<(), geo_radius::GeoSearchError> {
/// let config = SearchConfig::from_json_str(r#"{"default_unit": "miles", "batch_size": 10}"#)?;
/// assert_eq!(config.default_unit, DistanceUnit::Miles);
/// assert_eq!(config.cache.search_ttl_secs, 3600);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Unit for search calls that pass `None`.
    pub default_unit: DistanceUnit,
    pub default_algorithm: DistanceAlgorithm,
    pub default_limit: usize,
    /// Points per chunk in batch searches.
    pub batch_size: usize,
    /// Pause between batch chunks. Zero for a local store.
    pub batch_delay_ms: u64,
    /// Relative inflation of the bounding-box pre-filter.
    pub prefilter_margin: f64,
    /// Ask the store to compute, filter and sort by distance itself.
    pub distance_pushdown: bool,
    pub cache: CacheConfig,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_unit: DistanceUnit::default(),
            default_algorithm: DistanceAlgorithm::default(),
            default_limit: DEFAULT_LIMIT,
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay_ms: 0,
            prefilter_margin: DEFAULT_PREFILTER_MARGIN,
            distance_pushdown: false,
            cache: CacheConfig::default(),
        }
    }
}

impl SearchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and validates a JSON document. Missing fields take their defaults.
    pub fn from_json_str(s: &str) -> Result<Self, GeoSearchError> {
        let config: SearchConfig =
            serde_json::from_str(s).map_err(|e| GeoSearchError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn default_unit(mut self, unit: DistanceUnit) -> Self {
        self.default_unit = unit;
        self
    }

    pub fn default_algorithm(mut self, algorithm: DistanceAlgorithm) -> Self {
        self.default_algorithm = algorithm;
        self
    }

    pub fn default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit;
        self
    }

    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    pub fn batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn prefilter_margin(mut self, margin: f64) -> Self {
        self.prefilter_margin = margin;
        self
    }

    pub fn distance_pushdown(mut self, enabled: bool) -> Self {
        self.distance_pushdown = enabled;
        self
    }

    pub fn cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    pub fn batch_delay_duration(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    pub fn validate(&self) -> Result<(), GeoSearchError> {
        let invalid = |msg: String| Err(GeoSearchError::InvalidConfig(msg));

        if self.default_limit == 0 {
            return invalid("default_limit must be positive".to_string());
        }
        if self.batch_size == 0 {
            return invalid("batch_size must be positive".to_string());
        }
        if !self.prefilter_margin.is_finite() || self.prefilter_margin < 0.0 {
            return invalid(format!(
                "prefilter_margin must be a non-negative number, got {}",
                self.prefilter_margin
            ));
        }
        if self.cache.prefix.is_empty() {
            return invalid("cache prefix must not be empty".to_string());
        }
        let partition = self.cache.spatial_partition_size;
        if !partition.is_finite() || partition <= 0.0 {
            return invalid(format!(
                "spatial_partition_size must be positive, got {}",
                partition
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SearchConfig::default();
        assert_eq!(config.default_unit, DistanceUnit::Kilometers);
        assert_eq!(config.default_algorithm, DistanceAlgorithm::Haversine);
        assert_eq!(config.batch_size, 50);
        assert_eq!(config.cache.prefix, "radius_search_");
        assert_eq!(config.cache.search_ttl_duration(), Duration::from_secs(3600));
        assert_eq!(config.cache.spatial_partition_size, 0.1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_nested_cache() -> Result<(), GeoSearchError> {
        let config = SearchConfig::from_json_str(
            r#"{"default_algorithm": "vincenty", "cache": {"enabled": false, "prefix": "geo_"}}"#,
        )?;
        assert_eq!(config.default_algorithm, DistanceAlgorithm::Vincenty);
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.prefix, "geo_");
        assert_eq!(config.cache.distance_ttl_secs, 3600);
        Ok(())
    }

    #[test]
    fn test_from_json_rejects_unknown_unit() {
        let result = SearchConfig::from_json_str(r#"{"default_unit": "furlongs"}"#);
        assert!(matches!(result, Err(GeoSearchError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(SearchConfig::new().batch_size(0).validate().is_err());
        assert!(SearchConfig::new().default_limit(0).validate().is_err());
        assert!(SearchConfig::new().prefilter_margin(-0.1).validate().is_err());
        assert!(SearchConfig::new().cache(CacheConfig::new().prefix("")).validate().is_err());

        let mut config = SearchConfig::new();
        config.cache.spatial_partition_size = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_builder_setters() {
        let config = SearchConfig::new()
            .default_unit(DistanceUnit::Feet)
            .batch_delay(Duration::from_millis(250))
            .distance_pushdown(true)
            .cache(CacheConfig::new().search_ttl(Duration::from_secs(60)));
        assert_eq!(config.default_unit, DistanceUnit::Feet);
        assert_eq!(config.batch_delay_duration(), Duration::from_millis(250));
        assert!(config.distance_pushdown);
        assert_eq!(config.cache.search_ttl_secs, 60);
    }
}
