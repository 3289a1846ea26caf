pub mod coord;
pub mod dms;

pub use coord::Coordinate;
pub use dms::{Dms, decimal_to_dms, dms_to_decimal};
