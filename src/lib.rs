//! # geo-radius
//!
//! Radius and nearest-neighbour search over stored addresses, with three
//! great-circle distance algorithms and TTL result caching.
//!
//! There are currently three main entry points.
//!
//! ### 1. Distance Engine - Pure Math
//!
//! ```
//! use geo_radius::{DistanceAlgorithm, DistanceUnit, calculate_distance, decimal_to_dms};
//!
//! let km = calculate_distance(
//!     0.0, 0.0, 0.0, 1.0,
//!     DistanceUnit::Kilometers,
//!     DistanceAlgorithm::Haversine,
//! );
//! assert!((km - 111.19).abs() < 0.01);
//!
//! let dms = decimal_to_dms(-74.006);
//! assert_eq!(dms.to_string(), "-74°0'21.60\"");
//! ```
//!
//! ### 2. `RadiusSearchService` - Cached Search
//!
//! ```
//! use geo_radius::{
//!     AddressRecord, Coordinate, DistanceUnit, InMemoryAddressStore, RadiusSearchService,
//!     SearchConfig, SearchOptions,
//! };
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), geo_radius::GeoSearchError> {
//! let store = InMemoryAddressStore::from_records([
//!     AddressRecord::new(1, "user", "1").at(Coordinate::new(40.73, -73.935)?),
//!     AddressRecord::new(2, "user", "2").at(Coordinate::new(40.9, -74.5)?),
//! ]);
//! let service = RadiusSearchService::builder()
//!     .store(Arc::new(store))
//!     .config(SearchConfig::new().default_unit(DistanceUnit::Miles))
//!     .build()?;
//!
//! let nyc = Coordinate::new(40.7128, -74.0060)?;
//! // no unit given, so distances come back in the configured miles
//! let nearest = service.find_nearest(nyc, 1, None, &SearchOptions::new())?;
//! assert_eq!(nearest.ids(), vec![1]);
//! assert_eq!(nearest.unit, DistanceUnit::Miles);
//! assert!((nearest.hits[0].distance - 3.90).abs() < 0.01);
//! # Ok(())
//! # }
//! ```
//!
//! ### 3. `load_csv_path` - CSV Into a Store
//!
//! ```no_run
//! use geo_radius::{CsvStoreConfig, load_csv_path};
//!
//! let config = CsvStoreConfig::new().coords("lat", "lng");
//! let store = load_csv_path("addresses.csv", &config).unwrap();
//! println!("{} addresses", store.len());
//! ```
//!
//! Any other backing store plugs in by implementing [`AddressStore`], and any
//! shared cache by implementing [`cache::CacheBackend`].

pub mod cache;
pub mod config;
pub mod core;
pub mod error;
pub mod geom;
pub mod index;
pub mod search;
pub mod store;
pub mod util;

pub use cache::{CacheBackend, MemoryCacheBackend, PrefixInvalidation, SearchCache};
pub use config::{CacheConfig, SearchConfig};
pub use core::{
    BoundingBox, DistanceAlgorithm, DistanceUnit, bounding_box, calculate_distance, haversine,
    midpoint, point_in_geo_polygon, point_in_polygon, spherical_law, vincenty, vincenty_inverse,
};
pub use error::GeoSearchError;
pub use geom::{parse_geometry, parse_polygon};
pub use index::{
    NearestQuery, RadiusQuery, SearchHit, SearchOptions, SearchResult, SpatialQueryPlanner,
};
pub use search::{
    BatchResults, MaintenanceOutcome, OptimizationReport, PerformanceMetrics, RadiusSearchService,
    RadiusSearchServiceBuilder, SpatialStats,
};
pub use store::{
    AddressRecord, AddressStore, CsvStoreConfig, InMemoryAddressStore, OwnerFilter, StoreError,
    StoreQuery, load_csv, load_csv_path,
};
pub use util::{Coordinate, Dms, decimal_to_dms, dms_to_decimal};

pub use geo_types;
pub use tokio_util::sync::CancellationToken;
