/// Mean Earth radius in kilometers
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Mean Earth radius in statute miles
pub const EARTH_RADIUS_MILES: f64 = 3959.0;

/// Mean Earth radius in meters
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Mean Earth radius in international feet
pub const EARTH_RADIUS_FEET: f64 = 20_902_231.0;

/// WGS84 semi-major axis (meters)
pub const WGS84_A: f64 = 6_378_137.0;

/// WGS84 semi-minor axis (meters)
pub const WGS84_B: f64 = 6_356_752.314245;

/// WGS84 flattening
pub const WGS84_F: f64 = 1.0 / 298.257223563;

/// Vincenty convergence threshold on successive lambda iterates (radians)
pub const VINCENTY_TOLERANCE: f64 = 1e-12;

/// Maximum Vincenty iterations before giving up
pub const VINCENTY_MAX_ITERATIONS: usize = 100;

/// Decimal places kept when canonicalising a query center for caching (~11 m)
pub const CACHE_COORDINATE_PRECISION: i32 = 4;

/// Default TTL for cached search results, in seconds
pub const DEFAULT_SEARCH_TTL_SECS: u64 = 3600;

/// Default TTL for memoized pair distances, in seconds
pub const DEFAULT_DISTANCE_TTL_SECS: u64 = 3600;

/// Default cache key namespace for search results
pub const DEFAULT_CACHE_PREFIX: &str = "radius_search_";

/// Default number of points processed per batch chunk
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Default result limit for radius searches
pub const DEFAULT_LIMIT: usize = 100;

/// Default grid partition size for the in-memory spatial index (degrees)
pub const DEFAULT_PARTITION_SIZE: f64 = 0.1;

/// Relative radius inflation applied to the bounding-box pre-filter
pub const DEFAULT_PREFILTER_MARGIN: f64 = 0.01;
