//! Two-phase radius search against an [`AddressStore`].
//!
//! Phase one asks the store for candidates inside a bounding box; phase two
//! computes the exact distance of every candidate and drops those outside the
//! radius. The box is only ever a superset, so phase two always runs.

use crate::core::constants::DEFAULT_PREFILTER_MARGIN;
use crate::core::geometry::{BoundingBox, bounding_box, point_in_geo_polygon};
use crate::core::units::{DistanceAlgorithm, DistanceUnit};
use crate::error::GeoSearchError;
use crate::index::query::{NearestQuery, RadiusQuery, SearchHit, SearchResult, sort_hits};
use crate::store::record::OwnerFilter;
use crate::store::{AddressStore, DistanceProjection, StoreOrder, StoreQuery, StoredRecord};
use crate::util::coord::Coordinate;
use geo::{BoundingRect, Centroid};
use geo_types::Polygon;

/// Paging and filters for a polygon search.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonQuery<'a> {
    pub polygon: &'a Polygon<f64>,
    pub unit: DistanceUnit,
    pub algorithm: DistanceAlgorithm,
    pub owner: OwnerFilter,
    pub limit: Option<usize>,
    pub offset: usize,
}

/// Stateless translator from search queries to store queries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialQueryPlanner {
    prefilter_margin: f64,
    distance_pushdown: bool,
}

impl Default for SpatialQueryPlanner {
    fn default() -> Self {
        Self {
            prefilter_margin: DEFAULT_PREFILTER_MARGIN,
            distance_pushdown: false,
        }
    }
}

impl SpatialQueryPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Relative inflation of the bounding-box radius (0.01 = 1%).
    ///
    /// Keeps ellipsoidal distances covered by the spherical envelope.
    pub fn prefilter_margin(mut self, margin: f64) -> Self {
        self.prefilter_margin = margin.max(0.0);
        self
    }

    /// Let the store compute distances, filter on them and sort by them.
    pub fn distance_pushdown(mut self, enabled: bool) -> Self {
        self.distance_pushdown = enabled;
        self
    }

    /// The bounding box used to pre-filter `query`.
    pub fn envelope(&self, query: &RadiusQuery) -> Result<BoundingBox, GeoSearchError> {
        let inflated = query.radius() * (1.0 + self.prefilter_margin);
        bounding_box(query.center(), inflated, query.unit())
    }

    /// The store query issued for `query`.
    pub fn store_query(&self, query: &RadiusQuery) -> Result<StoreQuery, GeoSearchError> {
        let mut store_query = StoreQuery::new()
            .within(self.envelope(query)?)
            .owner(query.owner().clone());

        if self.distance_pushdown {
            store_query = store_query
                .project_distance(DistanceProjection {
                    origin: *query.center(),
                    unit: query.unit(),
                    algorithm: query.algorithm(),
                    max_distance: Some(query.radius()),
                })
                .order(StoreOrder::ProjectedDistance);
        }
        Ok(store_query)
    }

    /// Records within the query radius, nearest first.
    pub fn within_radius(
        &self,
        store: &dyn AddressStore,
        query: &RadiusQuery,
    ) -> Result<SearchResult, GeoSearchError> {
        let candidates = store.query(&self.store_query(query)?)?;
        let candidate_count = candidates.len();

        let mut hits = refine(
            candidates,
            query.center(),
            query.unit(),
            query.algorithm(),
            |_, distance| distance <= query.radius(),
        );
        sort_hits(&mut hits);

        tracing::debug!(
            center = %query.center(),
            radius = query.radius(),
            unit = %query.unit(),
            candidates = candidate_count,
            accepted = hits.len(),
            "Radius query refined"
        );

        Ok(SearchResult::new(
            query.unit(),
            page(hits, query.offset(), query.limit()),
        ))
    }

    /// The `limit` closest records having coordinates.
    ///
    /// Without a radius there is no envelope, so this scans the whole
    /// coordinate-bearing subset: O(n log n).
    pub fn nearest(
        &self,
        store: &dyn AddressStore,
        query: &NearestQuery,
    ) -> Result<SearchResult, GeoSearchError> {
        let mut store_query = StoreQuery::new()
            .with_coordinates()
            .owner(query.owner().clone());

        if self.distance_pushdown {
            store_query = store_query
                .project_distance(DistanceProjection {
                    origin: *query.center(),
                    unit: query.unit(),
                    algorithm: query.algorithm(),
                    max_distance: None,
                })
                .order(StoreOrder::ProjectedDistance)
                .limit(query.limit());
        }

        let candidates = store.query(&store_query)?;
        let candidate_count = candidates.len();

        let mut hits = refine(
            candidates,
            query.center(),
            query.unit(),
            query.algorithm(),
            |_, _| true,
        );
        sort_hits(&mut hits);
        hits.truncate(query.limit());

        tracing::debug!(
            center = %query.center(),
            k = query.limit(),
            candidates = candidate_count,
            returned = hits.len(),
            "Nearest query ranked"
        );

        Ok(SearchResult::new(query.unit(), hits))
    }

    /// Records inside `polygon`, ordered by distance from its centroid.
    pub fn within_polygon(
        &self,
        store: &dyn AddressStore,
        query: &PolygonQuery<'_>,
    ) -> Result<SearchResult, GeoSearchError> {
        let (Some(rect), Some(centroid)) = (query.polygon.bounding_rect(), query.polygon.centroid())
        else {
            return Ok(SearchResult::new(query.unit, Vec::new()));
        };
        let origin = Coordinate::from_point(&centroid)?;

        let store_query = StoreQuery::new()
            .within(BoundingBox::from_rect(&rect))
            .owner(query.owner.clone());
        let candidates = store.query(&store_query)?;
        let candidate_count = candidates.len();

        let mut hits = refine(candidates, &origin, query.unit, query.algorithm, |coord, _| {
            point_in_geo_polygon(coord, query.polygon)
        });
        sort_hits(&mut hits);

        tracing::debug!(
            candidates = candidate_count,
            accepted = hits.len(),
            "Polygon query refined"
        );

        Ok(SearchResult::new(query.unit, page(hits, query.offset, query.limit)))
    }
}

/// Exact distance for every candidate, keeping those `accept` approves.
fn refine(
    candidates: Vec<StoredRecord>,
    origin: &Coordinate,
    unit: DistanceUnit,
    algorithm: DistanceAlgorithm,
    accept: impl Fn(&Coordinate, f64) -> bool,
) -> Vec<SearchHit> {
    candidates
        .into_iter()
        .filter_map(|row| {
            let coord = row.record.coordinate?;
            let distance = algorithm.distance(origin, &coord, unit);
            accept(&coord, distance).then_some(SearchHit {
                record: row.record,
                distance,
            })
        })
        .collect()
}

fn page(hits: Vec<SearchHit>, offset: usize, limit: Option<usize>) -> Vec<SearchHit> {
    hits.into_iter()
        .skip(offset)
        .take(limit.unwrap_or(usize::MAX))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::parse_polygon;
    use crate::store::{InMemoryAddressStore, StoreError};
    use crate::store::record::AddressRecord;

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    fn nyc() -> Coordinate {
        coord(40.7128, -74.0060)
    }

    fn nyc_store() -> InMemoryAddressStore {
        InMemoryAddressStore::from_records([
            AddressRecord::new(1, "user", "1").at(coord(40.73, -73.935)),
            AddressRecord::new(2, "user", "2").at(coord(40.9, -74.5)),
            AddressRecord::new(3, "company", "1"),
        ])
    }

    /// Records due east of the equator origin at the given distances in km.
    fn ring_store(distances_km: &[f64]) -> InMemoryAddressStore {
        InMemoryAddressStore::from_records(distances_km.iter().enumerate().map(|(i, km)| {
            let lon = (km / DistanceUnit::Kilometers.earth_radius()).to_degrees();
            AddressRecord::new(i as u64 + 1, "user", "1").at(coord(0.0, lon))
        }))
    }

    struct DownStore;

    impl AddressStore for DownStore {
        fn query(&self, _query: &StoreQuery) -> Result<Vec<StoredRecord>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        fn count(&self, _query: &StoreQuery) -> Result<usize, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        fn spatial_index_exists(&self) -> Result<bool, StoreError> {
            Ok(false)
        }
    }

    #[test]
    fn test_new_york_radius() -> Result<(), GeoSearchError> {
        let store = nyc_store();
        let query = RadiusQuery::new(nyc(), 10.0, DistanceUnit::Kilometers)?;
        let result = SpatialQueryPlanner::new().within_radius(&store, &query)?;

        assert_eq!(result.ids(), vec![1]);
        let distance = result.first().map(|h| h.distance).unwrap_or_default();
        assert!((distance - 6.28).abs() < 0.05, "got {}", distance);
        Ok(())
    }

    #[test]
    fn test_refinement_drops_box_corners() -> Result<(), GeoSearchError> {
        // 9 km north and 9 km east: inside a 10 km box, ~12.7 km away
        let north = (9.0 / DistanceUnit::Kilometers.earth_radius()).to_degrees();
        let store = InMemoryAddressStore::from_records([
            AddressRecord::new(1, "user", "1").at(coord(north, north)),
            AddressRecord::new(2, "user", "1").at(coord(north, 0.0)),
        ]);
        let query = RadiusQuery::new(coord(0.0, 0.0), 10.0, DistanceUnit::Kilometers)?;
        let planner = SpatialQueryPlanner::new();

        let envelope = planner.envelope(&query)?;
        assert!(envelope.contains(&coord(north, north)));

        let result = planner.within_radius(&store, &query)?;
        assert_eq!(result.ids(), vec![2]);
        Ok(())
    }

    #[test]
    fn test_results_sorted_and_bounded_for_every_algorithm() -> Result<(), GeoSearchError> {
        let store = ring_store(&[7.0, 1.0, 12.0, 4.0, 9.99]);
        for algorithm in DistanceAlgorithm::ALL {
            let query = RadiusQuery::new(coord(0.0, 0.0), 10.0, DistanceUnit::Kilometers)?
                .with_algorithm(algorithm);
            let result = SpatialQueryPlanner::new().within_radius(&store, &query)?;

            assert!(result.iter().all(|hit| hit.distance <= 10.0));
            assert!(result.hits.windows(2).all(|w| w[0].distance <= w[1].distance));
            assert!(!result.ids().contains(&3));
        }
        Ok(())
    }

    #[test]
    fn test_limit_and_offset_apply_after_refinement() -> Result<(), GeoSearchError> {
        let store = ring_store(&[1.0, 2.0, 3.0, 4.0, 50.0]);
        let query = RadiusQuery::new(coord(0.0, 0.0), 10.0, DistanceUnit::Kilometers)?
            .with_offset(1)
            .with_limit(2)?;
        let result = SpatialQueryPlanner::new().within_radius(&store, &query)?;
        assert_eq!(result.ids(), vec![2, 3]);
        Ok(())
    }

    #[test]
    fn test_pushdown_matches_local_refinement() -> Result<(), GeoSearchError> {
        let store = ring_store(&[3.0, 8.0, 1.0, 15.0]);
        let query = RadiusQuery::new(coord(0.0, 0.0), 10.0, DistanceUnit::Kilometers)?;

        let local = SpatialQueryPlanner::new().within_radius(&store, &query)?;
        let pushed = SpatialQueryPlanner::new()
            .distance_pushdown(true)
            .within_radius(&store, &query)?;
        assert_eq!(local, pushed);
        assert_eq!(local.ids(), vec![3, 1, 2]);
        Ok(())
    }

    #[test]
    fn test_nearest_takes_first_k() -> Result<(), GeoSearchError> {
        let store = ring_store(&[10.0, 1.0, 5.0]);
        let query = NearestQuery::new(coord(0.0, 0.0), 2, DistanceUnit::Kilometers)?;
        let result = SpatialQueryPlanner::new().nearest(&store, &query)?;

        assert_eq!(result.ids(), vec![2, 3]);
        assert!((result.hits[0].distance - 1.0).abs() < 1e-6);
        assert!((result.hits[1].distance - 5.0).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn test_nearest_returns_all_when_fewer_candidates() -> Result<(), GeoSearchError> {
        let store = nyc_store();
        let query = NearestQuery::new(nyc(), 10, DistanceUnit::Miles)?;
        let result = SpatialQueryPlanner::new().nearest(&store, &query)?;
        assert_eq!(result.ids(), vec![1, 2]);
        assert_eq!(result.unit, DistanceUnit::Miles);
        Ok(())
    }

    #[test]
    fn test_nearest_owner_filter() -> Result<(), GeoSearchError> {
        let store = nyc_store();
        let query = NearestQuery::new(nyc(), 5, DistanceUnit::Kilometers)?
            .with_owner(OwnerFilter::owner("user", "2"));
        let result = SpatialQueryPlanner::new().nearest(&store, &query)?;
        assert_eq!(result.ids(), vec![2]);
        Ok(())
    }

    #[test]
    fn test_store_error_propagates() -> Result<(), GeoSearchError> {
        let query = RadiusQuery::new(nyc(), 10.0, DistanceUnit::Kilometers)?;
        let result = SpatialQueryPlanner::new().within_radius(&DownStore, &query);
        assert!(matches!(result, Err(GeoSearchError::StoreUnavailable(_))));
        Ok(())
    }

    #[test]
    fn test_within_polygon() -> Result<(), GeoSearchError> {
        let store = nyc_store();
        let polygon =
            parse_polygon("POLYGON((-74.1 40.6, -73.9 40.6, -73.9 40.8, -74.1 40.8, -74.1 40.6))")?;
        let query = PolygonQuery {
            polygon: &polygon,
            unit: DistanceUnit::Kilometers,
            algorithm: DistanceAlgorithm::Haversine,
            owner: OwnerFilter::any(),
            limit: None,
            offset: 0,
        };
        let result = SpatialQueryPlanner::new().within_polygon(&store, &query)?;
        assert_eq!(result.ids(), vec![1]);
        Ok(())
    }
}
