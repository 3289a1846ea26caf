pub mod grid;
pub mod planner;
pub mod query;

pub use grid::{GridIndex, point_to_row_col};
pub use planner::{PolygonQuery, SpatialQueryPlanner};
pub use query::{NearestQuery, RadiusQuery, SearchHit, SearchOptions, SearchResult};
