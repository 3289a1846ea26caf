use crate::cache::{
    CacheBackend, Clock, DistanceMemo, MemoryCacheBackend, PrefixInvalidation, SearchCache,
    SystemClock, distance_prefix,
};
use crate::config::SearchConfig;
use crate::core::units::{DistanceAlgorithm, DistanceUnit};
use crate::error::GeoSearchError;
use crate::index::planner::{PolygonQuery, SpatialQueryPlanner};
use crate::index::query::{
    NearestQuery, RadiusQuery, SearchOptions, SearchResult, check_limit, check_radius,
};
use crate::search::report::{
    MaintenanceOutcome, OptimizationReport, PerformanceMetrics, SpatialStats,
};
use crate::store::{AddressStore, QueryPlan, StoreQuery};
use crate::util::coord::Coordinate;
use geo_types::Polygon;
use rayon::prelude::*;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Sample query explained by `optimize_store`: 10 km around New York.
const SAMPLE_CENTER: (f64, f64) = (40.7128, -74.0060);
const SAMPLE_RADIUS_KM: f64 = 10.0;

/// One result per input point, in input order.
pub type BatchResults = Vec<Result<SearchResult, GeoSearchError>>;

/// Radius and nearest-neighbour search over an [`AddressStore`], with result caching.
///
/// The service keeps no state between calls beyond what lives in the cache
/// backend and the store.
///
/// # Example
/// ```
/// use geo_radius::{
///     AddressRecord, Coordinate, DistanceUnit, InMemoryAddressStore, RadiusSearchService,
///     SearchOptions,
/// };
/// use std::sync::Arc;
///
/// # fn main() -> Result<(), geo_radius::GeoSearchError> {
/// let store = InMemoryAddressStore::from_records([
///     AddressRecord::new(1, "user", "1").at(Coordinate::new(40.73, -73.935)?),
///     AddressRecord::new(2, "user", "2").at(Coordinate::new(40.9, -74.5)?),
/// ]);
/// let service = RadiusSearchService::builder().store(Arc::new(store)).build()?;
///
/// let nyc = Coordinate::new(40.7128, -74.0060)?;
/// let options = SearchOptions::new();
/// let result = service.find_within_radius(nyc, 10.0, DistanceUnit::Kilometers, &options)?;
/// assert_eq!(result.ids(), vec![1]);
///
/// // `None` falls back to the configured default unit, kilometers here
/// let same = service.find_within_radius(nyc, 10.0, None, &options)?;
/// assert_eq!(same, result);
/// # Ok(())
/// # }
/// ```
pub struct RadiusSearchService {
    store: Arc<dyn AddressStore>,
    cache: SearchCache,
    planner: SpatialQueryPlanner,
    config: SearchConfig,
}

impl RadiusSearchService {
    pub fn builder() -> RadiusSearchServiceBuilder {
        RadiusSearchServiceBuilder::new()
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn cache(&self) -> &SearchCache {
        &self.cache
    }

    pub fn planner(&self) -> &SpatialQueryPlanner {
        &self.planner
    }

    /// Validated radius query for `center`, with option fallbacks from the configuration.
    ///
    /// `None` for `unit` means the configured `default_unit`.
    pub fn radius_query(
        &self,
        center: Coordinate,
        radius: f64,
        unit: impl Into<Option<DistanceUnit>>,
        options: &SearchOptions,
    ) -> Result<RadiusQuery, GeoSearchError> {
        RadiusQuery::new(center, radius, self.unit_or_default(unit))?
            .with_algorithm(options.algorithm.unwrap_or(self.config.default_algorithm))
            .with_owner(options.owner.clone())
            .with_offset(options.offset)
            .with_limit(options.limit.unwrap_or(self.config.default_limit))
    }

    /// Records within `radius` of `center`, nearest first. Cache-first.
    pub fn find_within_radius(
        &self,
        center: Coordinate,
        radius: f64,
        unit: impl Into<Option<DistanceUnit>>,
        options: &SearchOptions,
    ) -> Result<SearchResult, GeoSearchError> {
        let query = self.radius_query(center, radius, unit, options)?;
        let key = query.cache_key(self.cache.prefix());

        if let Some(result) = self.cache.get::<SearchResult>(&key) {
            return Ok(result);
        }

        let result = self.planner.within_radius(self.store.as_ref(), &query)?;
        self.cache.put(&key, &result, self.cache.search_ttl());
        Ok(result)
    }

    /// The `limit` records closest to `center`. Cache-first.
    ///
    /// `options.limit` and `options.offset` are ignored; `limit` is the count.
    pub fn find_nearest(
        &self,
        center: Coordinate,
        limit: usize,
        unit: impl Into<Option<DistanceUnit>>,
        options: &SearchOptions,
    ) -> Result<SearchResult, GeoSearchError> {
        let query = NearestQuery::new(center, limit, self.unit_or_default(unit))?
            .with_algorithm(options.algorithm.unwrap_or(self.config.default_algorithm))
            .with_owner(options.owner.clone());
        let key = query.cache_key(self.cache.prefix());

        if let Some(result) = self.cache.get::<SearchResult>(&key) {
            return Ok(result);
        }

        let result = self.planner.nearest(self.store.as_ref(), &query)?;
        self.cache.put(&key, &result, self.cache.search_ttl());
        Ok(result)
    }

    /// Runs [`find_within_radius`](Self::find_within_radius) for every point.
    ///
    /// Points are processed in chunks of `batch_size`, in parallel within a
    /// chunk. A failing point fails only its own slot. If `cancel` fires, every
    /// point in chunks not yet started reports [`GeoSearchError::Cancelled`].
    /// Invalid radius or options are rejected up front.
    pub fn batch_find_within_radius(
        &self,
        points: &[Coordinate],
        radius: f64,
        unit: impl Into<Option<DistanceUnit>>,
        options: &SearchOptions,
        cancel: Option<&CancellationToken>,
    ) -> Result<BatchResults, GeoSearchError> {
        let unit = self.unit_or_default(unit);
        check_radius(radius)?;
        check_limit(options.limit.unwrap_or(self.config.default_limit))?;

        let chunk_size = self.config.batch_size.max(1);
        let delay = self.config.batch_delay_duration();
        tracing::info!(
            points = points.len(),
            chunks = points.len().div_ceil(chunk_size),
            radius,
            unit = %unit,
            "Starting batch radius search"
        );

        let mut results: BatchResults = Vec::with_capacity(points.len());
        for (index, chunk) in points.chunks(chunk_size).enumerate() {
            if index > 0 && !delay.is_zero() {
                std::thread::sleep(delay);
            }
            if cancel.is_some_and(CancellationToken::is_cancelled) {
                tracing::info!(
                    completed = results.len(),
                    cancelled = points.len() - results.len(),
                    "Batch radius search cancelled"
                );
                break;
            }

            let chunk_results: BatchResults = chunk
                .par_iter()
                .map(|center| self.find_within_radius(*center, radius, unit, options))
                .collect();
            for (offset, result) in chunk_results.iter().enumerate() {
                if let Err(e) = result {
                    let point = index * chunk_size + offset;
                    tracing::warn!(point, error = %e, "Batch point failed");
                }
            }
            results.extend(chunk_results);
        }
        results.resize_with(points.len(), || Err(GeoSearchError::Cancelled));

        let failed = results.iter().filter(|r| r.is_err()).count();
        tracing::info!(points = points.len(), failed, "Finished batch radius search");
        Ok(results)
    }

    /// Records inside `polygon`, ordered by distance from its centroid. Not cached.
    pub fn find_within_polygon(
        &self,
        polygon: &Polygon<f64>,
        unit: impl Into<Option<DistanceUnit>>,
        options: &SearchOptions,
    ) -> Result<SearchResult, GeoSearchError> {
        let query = PolygonQuery {
            polygon,
            unit: self.unit_or_default(unit),
            algorithm: options.algorithm.unwrap_or(self.config.default_algorithm),
            owner: options.owner.clone(),
            limit: Some(check_limit(options.limit.unwrap_or(self.config.default_limit))?),
            offset: options.offset,
        };
        self.planner.within_polygon(self.store.as_ref(), &query)
    }

    fn unit_or_default(&self, unit: impl Into<Option<DistanceUnit>>) -> DistanceUnit {
        unit.into().unwrap_or(self.config.default_unit)
    }

    /// Distance between two points through the two-layer memo.
    pub fn distance_between(
        &self,
        a: &Coordinate,
        b: &Coordinate,
        unit: DistanceUnit,
        algorithm: DistanceAlgorithm,
    ) -> f64 {
        DistanceMemo::new(&self.cache).distance(a, b, unit, algorithm)
    }

    /// Distances from `origin` to every target, sharing one in-call memo.
    pub fn distances_from(
        &self,
        origin: &Coordinate,
        targets: &[Coordinate],
        unit: DistanceUnit,
        algorithm: DistanceAlgorithm,
    ) -> Vec<f64> {
        let mut memo = DistanceMemo::new(&self.cache);
        targets
            .iter()
            .map(|target| memo.distance(origin, target, unit, algorithm))
            .collect()
    }

    /// Drops every cached entry under the configured prefix.
    pub fn clear_cache(&self) -> PrefixInvalidation {
        let outcome = self.cache.forget_prefix(self.cache.prefix());
        if let PrefixInvalidation::Removed(removed) = outcome {
            tracing::info!(removed, prefix = self.cache.prefix(), "Cleared search cache");
        }
        outcome
    }

    /// Invalidates distance entries keyed on a record's previous coordinates.
    ///
    /// Cached radius and nearest results are keyed by query, not by the records
    /// they returned, so they stay until their TTL runs out.
    pub fn record_moved(
        &self,
        previous: Option<Coordinate>,
        current: Option<Coordinate>,
    ) -> PrefixInvalidation {
        match previous {
            Some(old) if previous != current => self
                .cache
                .forget_prefix(&distance_prefix(self.cache.prefix(), &old)),
            _ => PrefixInvalidation::Removed(0),
        }
    }

    /// Record counts, coordinate coverage and index presence.
    pub fn get_spatial_stats(&self) -> Result<SpatialStats, GeoSearchError> {
        let total_records = self.store.count(&StoreQuery::new())?;
        let records_with_coordinates = self.store.count(&StoreQuery::new().with_coordinates())?;

        let coordinate_coverage_percent = if total_records == 0 {
            0.0
        } else {
            let percent = records_with_coordinates as f64 / total_records as f64 * 100.0;
            (percent * 100.0).round() / 100.0
        };

        let spatial_index_present = self.store.spatial_index_exists().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Spatial index check failed");
            false
        });

        Ok(SpatialStats {
            total_records,
            records_with_coordinates,
            coordinate_coverage_percent,
            spatial_index_present,
            cache: self.cache.config().clone(),
        })
    }

    /// Creates the spatial index, refreshes statistics and checks index use.
    ///
    /// Failures are logged and recorded in the report; no step stops another.
    pub fn optimize_store(&self) -> OptimizationReport {
        let cell_size = self.config.cache.spatial_partition_size;
        let spatial_index = match self.store.ensure_spatial_index(cell_size) {
            Ok(true) => {
                tracing::info!(cell_size, "Spatial index created");
                MaintenanceOutcome::Applied
            }
            Ok(false) => MaintenanceOutcome::AlreadyPresent,
            Err(e) => {
                tracing::error!(error = %e, "Spatial index creation failed");
                MaintenanceOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };

        let statistics = match self.store.refresh_statistics() {
            Ok(()) => {
                tracing::info!("Store statistics refreshed");
                MaintenanceOutcome::Applied
            }
            Err(e) => {
                tracing::error!(error = %e, "Statistics refresh failed");
                MaintenanceOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };

        let (query_uses_index, query_plan, analysis_error) = match self.explain_sample_query() {
            Ok(plan) => (Some(plan.uses_index), plan.detail, None),
            Err(e) => {
                tracing::error!(error = %e, "Query plan analysis failed");
                (None, Vec::new(), Some(e.to_string()))
            }
        };

        OptimizationReport {
            spatial_index,
            statistics,
            query_uses_index,
            query_plan,
            analysis_error,
        }
    }

    fn explain_sample_query(&self) -> Result<QueryPlan, GeoSearchError> {
        let center = Coordinate::new(SAMPLE_CENTER.0, SAMPLE_CENTER.1)?;
        let query = RadiusQuery::new(center, SAMPLE_RADIUS_KM, DistanceUnit::Kilometers)?;
        let store_query = self.planner.store_query(&query)?;
        Ok(self.store.explain(&store_query)?)
    }

    pub fn performance_metrics(&self) -> Result<PerformanceMetrics, GeoSearchError> {
        Ok(PerformanceMetrics {
            algorithms: DistanceAlgorithm::ALL.to_vec(),
            cache_config: self.cache.config().clone(),
            cache_backend: self.cache.backend_name().to_string(),
            cache_footprint: self.cache.footprint(),
            spatial_stats: self.get_spatial_stats()?,
        })
    }
}

impl std::fmt::Debug for RadiusSearchService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RadiusSearchService")
            .field("cache", &self.cache)
            .field("planner", &self.planner)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Builder for [`RadiusSearchService`].
///
/// A store is required. The cache backend defaults to [`MemoryCacheBackend`]
/// and the clock to [`SystemClock`].
#[derive(Default)]
pub struct RadiusSearchServiceBuilder {
    store: Option<Arc<dyn AddressStore>>,
    cache_backend: Option<Arc<dyn CacheBackend>>,
    clock: Option<Arc<dyn Clock>>,
    config: SearchConfig,
}

impl RadiusSearchServiceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(mut self, store: Arc<dyn AddressStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn cache_backend(mut self, backend: Arc<dyn CacheBackend>) -> Self {
        self.cache_backend = Some(backend);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<RadiusSearchService, GeoSearchError> {
        self.config.validate()?;
        let store = self.store.ok_or_else(|| {
            GeoSearchError::InvalidConfig("an address store is required".to_string())
        })?;
        let backend = self
            .cache_backend
            .unwrap_or_else(|| Arc::new(MemoryCacheBackend::new()));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        let planner = SpatialQueryPlanner::new()
            .prefilter_margin(self.config.prefilter_margin)
            .distance_pushdown(self.config.distance_pushdown);
        let cache = SearchCache::new(backend, clock, self.config.cache.clone());

        Ok(RadiusSearchService {
            store,
            cache,
            planner,
            config: self.config,
        })
    }
}
