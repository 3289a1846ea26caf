pub mod constants;
pub mod distance;
pub mod geometry;
pub mod units;

pub use constants::{
    EARTH_RADIUS_FEET, EARTH_RADIUS_KM, EARTH_RADIUS_METERS, EARTH_RADIUS_MILES, WGS84_A, WGS84_B,
    WGS84_F,
};
pub use distance::{calculate_distance, haversine, spherical_law, vincenty, vincenty_inverse};
pub use geometry::{
    BoundingBox, bounding_box, midpoint, point_in_geo_polygon, point_in_polygon,
};
pub use units::{DistanceAlgorithm, DistanceUnit};
