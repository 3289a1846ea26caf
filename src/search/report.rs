use crate::cache::CacheFootprint;
use crate::config::CacheConfig;
use crate::core::units::DistanceAlgorithm;
use serde::Serialize;

/// Read-only snapshot of store coverage and cache settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpatialStats {
    pub total_records: usize,
    pub records_with_coordinates: usize,
    /// Share of records with coordinates, 0-100, two decimals.
    pub coordinate_coverage_percent: f64,
    pub spatial_index_present: bool,
    pub cache: CacheConfig,
}

/// Result of one maintenance step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MaintenanceOutcome {
    Applied,
    AlreadyPresent,
    Failed { reason: String },
}

impl MaintenanceOutcome {
    pub fn succeeded(&self) -> bool {
        !matches!(self, MaintenanceOutcome::Failed { .. })
    }
}

/// What `optimize_store` managed to do. Every step runs regardless of the others.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationReport {
    pub spatial_index: MaintenanceOutcome,
    pub statistics: MaintenanceOutcome,
    /// Whether the store plans to use its index for a sample radius query.
    /// `None` when the plan could not be obtained.
    pub query_uses_index: Option<bool>,
    pub query_plan: Vec<String>,
    pub analysis_error: Option<String>,
}

impl OptimizationReport {
    pub fn index_created(&self) -> bool {
        self.spatial_index == MaintenanceOutcome::Applied
    }

    pub fn stats_updated(&self) -> bool {
        self.statistics == MaintenanceOutcome::Applied
    }
}

/// Operational overview of the service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceMetrics {
    pub algorithms: Vec<DistanceAlgorithm>,
    pub cache_config: CacheConfig,
    pub cache_backend: String,
    /// Size of the cache backend's contents, when it reports one.
    pub cache_footprint: Option<CacheFootprint>,
    pub spatial_stats: SpatialStats,
}
