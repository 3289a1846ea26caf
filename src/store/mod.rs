//! Address store capability consumed by the search core.
//!
//! The store owns the records. The search core only needs range, equality and
//! presence predicates, an optional distance projection, ordering, paging,
//! counting, and a few idempotent maintenance hooks.

pub mod loader;
pub mod memory;
pub mod record;

pub use loader::{CsvStoreConfig, load_csv, load_csv_path};
pub use memory::InMemoryAddressStore;
pub use record::{AddressRecord, OwnerFilter};

use crate::core::geometry::BoundingBox;
use crate::core::units::{DistanceAlgorithm, DistanceUnit};
use crate::util::coord::Coordinate;
use thiserror::Error;

/// Errors reported by an address store.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// The store did not answer.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// The store does not implement this capability.
    #[error("operation not supported by this store: {0}")]
    Unsupported(&'static str),
    /// A maintenance operation (index creation, statistics refresh) failed.
    #[error("maintenance failed: {0}")]
    MaintenanceFailed(String),
}

/// Distance computed by the store itself for each candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceProjection {
    pub origin: Coordinate,
    pub unit: DistanceUnit,
    pub algorithm: DistanceAlgorithm,
    /// Drop rows whose projected distance exceeds this value.
    pub max_distance: Option<f64>,
}

/// Row ordering requested from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreOrder {
    /// Ascending record id.
    #[default]
    Id,
    /// Ascending projected distance, ties by id. Requires a projection.
    ProjectedDistance,
}

/// Predicates and paging for a single store query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreQuery {
    pub require_coordinates: bool,
    pub bounds: Option<BoundingBox>,
    pub owner: OwnerFilter,
    pub projection: Option<DistanceProjection>,
    pub order: StoreOrder,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl StoreQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only records whose latitude and longitude are both set.
    pub fn with_coordinates(mut self) -> Self {
        self.require_coordinates = true;
        self
    }

    pub fn within(mut self, bounds: BoundingBox) -> Self {
        self.require_coordinates = true;
        self.bounds = Some(bounds);
        self
    }

    pub fn owner(mut self, owner: OwnerFilter) -> Self {
        self.owner = owner;
        self
    }

    pub fn project_distance(mut self, projection: DistanceProjection) -> Self {
        self.require_coordinates = true;
        self.projection = Some(projection);
        self
    }

    pub fn order(mut self, order: StoreOrder) -> Self {
        self.order = order;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }
}

/// One row returned by a store query.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub record: AddressRecord,
    /// Present when the query carried a [`DistanceProjection`].
    pub projected_distance: Option<f64>,
}

/// Store-reported execution plan for a query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryPlan {
    pub uses_index: bool,
    pub detail: Vec<String>,
}

/// Backing store of address records.
///
/// Implementations must be safe to share between threads. Maintenance hooks are
/// idempotent and report [`StoreError::Unsupported`] rather than panicking when a
/// backend cannot honour them.
pub trait AddressStore: Send + Sync {
    /// Records matching every predicate in `query`.
    fn query(&self, query: &StoreQuery) -> Result<Vec<StoredRecord>, StoreError>;

    /// Number of records matching `query`, ignoring paging.
    fn count(&self, query: &StoreQuery) -> Result<usize, StoreError>;

    /// Whether a spatial index over latitude/longitude exists.
    fn spatial_index_exists(&self) -> Result<bool, StoreError>;

    /// Creates the spatial index, partitioned into `cell_size`-degree cells where
    /// the backend supports a grid. Returns `false` if an index already existed.
    fn ensure_spatial_index(&self, _cell_size: f64) -> Result<bool, StoreError> {
        Err(StoreError::Unsupported("ensure_spatial_index"))
    }

    /// Refreshes planner statistics (the ANALYZE equivalent).
    fn refresh_statistics(&self) -> Result<(), StoreError> {
        Err(StoreError::Unsupported("refresh_statistics"))
    }

    /// Explains how `query` would execute.
    fn explain(&self, _query: &StoreQuery) -> Result<QueryPlan, StoreError> {
        Err(StoreError::Unsupported("explain"))
    }
}
