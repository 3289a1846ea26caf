use crate::index::grid::GridIndex;
use crate::store::{
    AddressRecord, AddressStore, OwnerFilter, QueryPlan, StoreError, StoreOrder, StoreQuery,
    StoredRecord,
};
use crate::util::coord::Coordinate;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, Copy, Default)]
struct TableStats {
    total: usize,
    with_coordinates: usize,
}

/// Thread-safe in-memory address store.
///
/// Supports every capability the search core asks for. `ensure_spatial_index`
/// builds a [`GridIndex`] used to answer bounding-box queries; without it
/// every query is a scan in id order.
#[derive(Debug)]
pub struct InMemoryAddressStore {
    records: RwLock<BTreeMap<u64, AddressRecord>>,
    index: RwLock<Option<GridIndex>>,
    stats: RwLock<Option<TableStats>>,
    query_calls: AtomicUsize,
}

impl Default for InMemoryAddressStore {
    fn default() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            index: RwLock::new(None),
            stats: RwLock::new(None),
            query_calls: AtomicUsize::new(0),
        }
    }
}

impl InMemoryAddressStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = AddressRecord>) -> Self {
        let store = Self::new();
        for record in records {
            store.insert(record);
        }
        store
    }

    /// Inserts or replaces a record, keeping the spatial index in step.
    pub fn insert(&self, record: AddressRecord) {
        let mut records = self.records.write();
        let mut index = self.index.write();

        if let (Some(grid), Some(previous)) = (index.as_mut(), records.get(&record.id)) {
            if let Some(coord) = previous.coordinate {
                grid.remove(previous.id, &coord);
            }
        }
        if let (Some(grid), Some(coord)) = (index.as_mut(), record.coordinate) {
            grid.insert(record.id, &coord);
        }

        records.insert(record.id, record);
        *self.stats.write() = None;
    }

    /// Moves a record. Returns the previous coordinate, or `None` if the record is unknown.
    pub fn update_coordinates(
        &self,
        id: u64,
        coordinate: Option<Coordinate>,
    ) -> Option<Option<Coordinate>> {
        let mut records = self.records.write();
        let record = records.get_mut(&id)?;
        let previous = std::mem::replace(&mut record.coordinate, coordinate);

        if previous != coordinate {
            if let Some(grid) = self.index.write().as_mut() {
                if let Some(old) = previous {
                    grid.remove(id, &old);
                }
                if let Some(new) = coordinate {
                    grid.insert(id, &new);
                }
            }
            *self.stats.write() = None;
        }
        Some(previous)
    }

    pub fn remove(&self, id: u64) -> Option<AddressRecord> {
        let mut records = self.records.write();
        let removed = records.remove(&id)?;
        if let (Some(grid), Some(coord)) = (self.index.write().as_mut(), removed.coordinate) {
            grid.remove(id, &coord);
        }
        *self.stats.write() = None;
        Some(removed)
    }

    pub fn get(&self, id: u64) -> Option<AddressRecord> {
        self.records.read().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Number of `query` calls served so far.
    pub fn query_calls(&self) -> usize {
        self.query_calls.load(Ordering::Relaxed)
    }

    fn select(&self, query: &StoreQuery) -> Vec<StoredRecord> {
        let records = self.records.read();
        let index = self.index.read();

        let indexed_ids = match (&query.bounds, index.as_ref()) {
            (Some(bounds), Some(grid)) => grid.candidates(bounds),
            _ => None,
        };

        let candidates: Box<dyn Iterator<Item = &AddressRecord> + '_> = match indexed_ids {
            Some(ids) => Box::new(ids.into_iter().filter_map(|id| records.get(&id))),
            None => Box::new(records.values()),
        };

        let mut rows: Vec<StoredRecord> = candidates
            .filter(|record| matches_predicates(query, record))
            .filter_map(|record| {
                let projected_distance = match (&query.projection, record.coordinate) {
                    (Some(projection), Some(coord)) => {
                        let distance = projection.algorithm.distance(
                            &projection.origin,
                            &coord,
                            projection.unit,
                        );
                        if projection.max_distance.is_some_and(|max| distance > max) {
                            return None;
                        }
                        Some(distance)
                    }
                    _ => None,
                };
                Some(StoredRecord {
                    record: record.clone(),
                    projected_distance,
                })
            })
            .collect();

        if query.order == StoreOrder::ProjectedDistance {
            rows.sort_by(|a, b| {
                let da = a.projected_distance.unwrap_or(f64::INFINITY);
                let db = b.projected_distance.unwrap_or(f64::INFINITY);
                da.total_cmp(&db).then(a.record.id.cmp(&b.record.id))
            });
        }

        let limit = query.limit.unwrap_or(usize::MAX);
        rows.into_iter().skip(query.offset).take(limit).collect()
    }

}

fn matches_predicates(query: &StoreQuery, record: &AddressRecord) -> bool {
    if query.require_coordinates && record.coordinate.is_none() {
        return false;
    }
    if let Some(bounds) = &query.bounds {
        match &record.coordinate {
            Some(coord) if bounds.contains(coord) => {}
            _ => return false,
        }
    }
    query.owner.matches(record)
}

impl AddressStore for InMemoryAddressStore {
    fn query(&self, query: &StoreQuery) -> Result<Vec<StoredRecord>, StoreError> {
        self.query_calls.fetch_add(1, Ordering::Relaxed);
        Ok(self.select(query))
    }

    fn count(&self, query: &StoreQuery) -> Result<usize, StoreError> {
        let unfiltered = query.bounds.is_none()
            && query.projection.is_none()
            && query.owner == OwnerFilter::any();
        if unfiltered {
            if let Some(stats) = *self.stats.read() {
                return Ok(if query.require_coordinates {
                    stats.with_coordinates
                } else {
                    stats.total
                });
            }
        }

        let unpaged = StoreQuery {
            limit: None,
            offset: 0,
            ..query.clone()
        };
        Ok(self.select(&unpaged).len())
    }

    fn spatial_index_exists(&self) -> Result<bool, StoreError> {
        Ok(self.index.read().is_some())
    }

    fn ensure_spatial_index(&self, cell_size: f64) -> Result<bool, StoreError> {
        let records = self.records.read();
        let mut index = self.index.write();
        if index.is_some() {
            return Ok(false);
        }

        let mut grid =
            GridIndex::new(cell_size).map_err(|e| StoreError::MaintenanceFailed(e.to_string()))?;
        for record in records.values() {
            if let Some(coord) = &record.coordinate {
                grid.insert(record.id, coord);
            }
        }
        tracing::debug!(entries = grid.len(), cell_size, "Built grid index");
        *index = Some(grid);
        Ok(true)
    }

    fn refresh_statistics(&self) -> Result<(), StoreError> {
        // records lock spans the stats write so inserts are ordered with it
        let records = self.records.read();
        let stats = TableStats {
            total: records.len(),
            with_coordinates: records.values().filter(|r| r.has_coordinates()).count(),
        };
        *self.stats.write() = Some(stats);
        Ok(())
    }

    fn explain(&self, query: &StoreQuery) -> Result<QueryPlan, StoreError> {
        let index = self.index.read();
        let mut detail = Vec::new();

        let uses_index = match (&query.bounds, index.as_ref()) {
            (Some(bounds), Some(grid)) => {
                let hit = grid.candidates(bounds).is_some();
                detail.push(if hit {
                    format!("grid lookup, cell size {}", grid.cell_size())
                } else {
                    "bounding box too large for grid, full scan".to_string()
                });
                hit
            }
            (Some(_), None) => {
                detail.push("no spatial index, full scan with range filter".to_string());
                false
            }
            (None, _) => {
                detail.push("full scan".to_string());
                false
            }
        };

        if query.order == StoreOrder::ProjectedDistance {
            detail.push("sort by projected distance".to_string());
        }

        Ok(QueryPlan { uses_index, detail })
    }
}
