use crate::core::geometry::BoundingBox;
use crate::error::GeoSearchError;
use crate::util::coord::Coordinate;
use std::collections::{BTreeSet, HashMap};

/// Beyond this many cells a bounding-box lookup is cheaper as a full scan.
const MAX_CELLS_PER_LOOKUP: usize = 4096;

/// Converts a coordinate to grid row/column indices.
///
/// Rows count up from the south pole and columns from the antimeridian, each
/// `cell_size` degrees wide.
pub fn point_to_row_col(coord: &Coordinate, cell_size: f64) -> (i64, i64) {
    let row = ((coord.latitude() + 90.0) / cell_size).floor() as i64;
    let col = ((coord.longitude() + 180.0) / cell_size).floor() as i64;
    (row, col)
}

/// A uniform lat/lon partition mapping grid cells to record ids.
///
/// Used by stores as a spatial index for bounding-box pre-filtering.
#[derive(Debug, Clone)]
pub struct GridIndex {
    cell_size: f64,
    cells: HashMap<(i64, i64), BTreeSet<u64>>,
}

impl GridIndex {
    pub fn new(cell_size: f64) -> Result<Self, GeoSearchError> {
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(GeoSearchError::InvalidConfig(format!(
                "grid cell size must be positive, got {}",
                cell_size
            )));
        }
        Ok(Self {
            cell_size,
            cells: HashMap::new(),
        })
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn len(&self) -> usize {
        self.cells.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn insert(&mut self, id: u64, coord: &Coordinate) {
        let cell = point_to_row_col(coord, self.cell_size);
        self.cells.entry(cell).or_default().insert(id);
    }

    pub fn remove(&mut self, id: u64, coord: &Coordinate) {
        let cell = point_to_row_col(coord, self.cell_size);
        if let Some(ids) = self.cells.get_mut(&cell) {
            ids.remove(&id);
            if ids.is_empty() {
                self.cells.remove(&cell);
            }
        }
    }

    /// Ids in every cell overlapping `bbox`, in ascending order.
    ///
    /// Returns `None` when the box covers too many cells for the lookup to pay off.
    pub fn candidates(&self, bbox: &BoundingBox) -> Option<BTreeSet<u64>> {
        let (min_row, min_col) = self.clamped_row_col(bbox.min_lat, bbox.min_lon);
        let (max_row, max_col) = self.clamped_row_col(bbox.max_lat, bbox.max_lon);

        let rows = (max_row - min_row + 1) as usize;
        let cols = (max_col - min_col + 1) as usize;
        if rows.saturating_mul(cols) > MAX_CELLS_PER_LOOKUP {
            return None;
        }

        let mut ids = BTreeSet::new();
        for row in min_row..=max_row {
            for col in min_col..=max_col {
                if let Some(cell) = self.cells.get(&(row, col)) {
                    ids.extend(cell.iter().copied());
                }
            }
        }
        Some(ids)
    }

    fn clamped_row_col(&self, lat: f64, lon: f64) -> (i64, i64) {
        let row = ((lat.clamp(-90.0, 90.0) + 90.0) / self.cell_size).floor() as i64;
        let col = ((lon.clamp(-180.0, 180.0) + 180.0) / self.cell_size).floor() as i64;
        (row, col)
    }
}
