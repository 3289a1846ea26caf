mod report;
mod service;

pub use report::{MaintenanceOutcome, OptimizationReport, PerformanceMetrics, SpatialStats};
pub use service::{BatchResults, RadiusSearchService, RadiusSearchServiceBuilder};
