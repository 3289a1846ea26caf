use crate::core::constants::CACHE_COORDINATE_PRECISION;
use crate::core::units::{DistanceAlgorithm, DistanceUnit};
use crate::error::GeoSearchError;
use crate::store::record::{AddressRecord, OwnerFilter};
use crate::util::coord::Coordinate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Per-call search options. Unset fields fall back to the service configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOptions {
    pub algorithm: Option<DistanceAlgorithm>,
    pub limit: Option<usize>,
    pub offset: usize,
    pub owner: OwnerFilter,
}

impl SearchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn algorithm(mut self, algorithm: DistanceAlgorithm) -> Self {
        self.algorithm = Some(algorithm);
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

    pub fn owner(mut self, owner: OwnerFilter) -> Self {
        self.owner = owner;
        self
    }
}

pub(crate) fn check_radius(radius: f64) -> Result<f64, GeoSearchError> {
    if !radius.is_finite() || radius <= 0.0 {
        return Err(GeoSearchError::InvalidRadius(radius));
    }
    Ok(radius)
}

pub(crate) fn check_limit(limit: usize) -> Result<usize, GeoSearchError> {
    if limit == 0 {
        return Err(GeoSearchError::InvalidLimit(limit));
    }
    Ok(limit)
}

/// Canonical form of a query used for cache fingerprints.
///
/// The center is quantized so centers closer than the rounding step share a key.
#[derive(Serialize)]
struct Fingerprint<'a> {
    kind: &'static str,
    lat: i64,
    lon: i64,
    radius: Option<f64>,
    unit: DistanceUnit,
    algorithm: DistanceAlgorithm,
    owner: &'a OwnerFilter,
    limit: Option<usize>,
    offset: usize,
}

impl Fingerprint<'_> {
    fn key(&self, prefix: &str) -> String {
        // serializing a plain struct of numbers and strings cannot fail
        let canonical = serde_json::to_vec(self).unwrap_or_default();
        let digest = Sha256::digest(&canonical);
        format!("{}{}:{:x}", prefix, self.kind, digest)
    }
}

/// A validated "everything within `radius` of `center`" query.
///
/// # Example
/// ```
/// use geo_radius::{Coordinate, DistanceUnit, RadiusQuery};
///
/// # fn main() -> Result<(), geo_radius::GeoSearchError> {
/// let a = RadiusQuery::new(Coordinate::new(40.71280, -74.0060)?, 10.0, DistanceUnit::Kilometers)?;
/// let b = RadiusQuery::new(Coordinate::new(40.71283, -74.0060)?, 10.0, DistanceUnit::Kilometers)?;
/// assert_eq!(a.cache_key("radius_search_"), b.cache_key("radius_search_"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RadiusQuery {
    center: Coordinate,
    radius: f64,
    unit: DistanceUnit,
    algorithm: DistanceAlgorithm,
    owner: OwnerFilter,
    limit: Option<usize>,
    offset: usize,
}

impl RadiusQuery {
    pub fn new(
        center: Coordinate,
        radius: f64,
        unit: DistanceUnit,
    ) -> Result<Self, GeoSearchError> {
        Ok(Self {
            center,
            radius: check_radius(radius)?,
            unit,
            algorithm: DistanceAlgorithm::default(),
            owner: OwnerFilter::any(),
            limit: None,
            offset: 0,
        })
    }

    pub fn with_algorithm(mut self, algorithm: DistanceAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_owner(mut self, owner: OwnerFilter) -> Self {
        self.owner = owner;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Result<Self, GeoSearchError> {
        self.limit = Some(check_limit(limit)?);
        Ok(self)
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn center(&self) -> &Coordinate {
        &self.center
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn unit(&self) -> DistanceUnit {
        self.unit
    }

    pub fn algorithm(&self) -> DistanceAlgorithm {
        self.algorithm
    }

    pub fn owner(&self) -> &OwnerFilter {
        &self.owner
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Fixed-length cache key under `prefix`. Centers are rounded to 4 decimal places.
    pub fn cache_key(&self, prefix: &str) -> String {
        let (lat, lon) = self.center.quantized(CACHE_COORDINATE_PRECISION);
        Fingerprint {
            kind: "within",
            lat,
            lon,
            radius: Some(self.radius),
            unit: self.unit,
            algorithm: self.algorithm,
            owner: &self.owner,
            limit: self.limit,
            offset: self.offset,
        }
        .key(prefix)
    }
}

/// A validated k-nearest query.
#[derive(Debug, Clone, PartialEq)]
pub struct NearestQuery {
    center: Coordinate,
    limit: usize,
    unit: DistanceUnit,
    algorithm: DistanceAlgorithm,
    owner: OwnerFilter,
}

impl NearestQuery {
    pub fn new(
        center: Coordinate,
        limit: usize,
        unit: DistanceUnit,
    ) -> Result<Self, GeoSearchError> {
        Ok(Self {
            center,
            limit: check_limit(limit)?,
            unit,
            algorithm: DistanceAlgorithm::default(),
            owner: OwnerFilter::any(),
        })
    }

    pub fn with_algorithm(mut self, algorithm: DistanceAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_owner(mut self, owner: OwnerFilter) -> Self {
        self.owner = owner;
        self
    }

    pub fn center(&self) -> &Coordinate {
        &self.center
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn unit(&self) -> DistanceUnit {
        self.unit
    }

    pub fn algorithm(&self) -> DistanceAlgorithm {
        self.algorithm
    }

    pub fn owner(&self) -> &OwnerFilter {
        &self.owner
    }

    /// Cache key under `prefix`; includes the requested count.
    pub fn cache_key(&self, prefix: &str) -> String {
        let (lat, lon) = self.center.quantized(CACHE_COORDINATE_PRECISION);
        Fingerprint {
            kind: "nearest",
            lat,
            lon,
            radius: None,
            unit: self.unit,
            algorithm: self.algorithm,
            owner: &self.owner,
            limit: Some(self.limit),
            offset: 0,
        }
        .key(prefix)
    }
}

/// One matched record and its exact distance from the query center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub record: AddressRecord,
    pub distance: f64,
}

/// Hits ordered by ascending distance, ties by record id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub unit: DistanceUnit,
    pub hits: Vec<SearchHit>,
}

impl SearchResult {
    pub fn new(unit: DistanceUnit, hits: Vec<SearchHit>) -> Self {
        Self { unit, hits }
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SearchHit> {
        self.hits.iter()
    }

    pub fn ids(&self) -> Vec<u64> {
        self.hits.iter().map(|hit| hit.record.id).collect()
    }

    pub fn first(&self) -> Option<&SearchHit> {
        self.hits.first()
    }
}

impl IntoIterator for SearchResult {
    type Item = SearchHit;
    type IntoIter = std::vec::IntoIter<SearchHit>;

    fn into_iter(self) -> Self::IntoIter {
        self.hits.into_iter()
    }
}

impl<'a> IntoIterator for &'a SearchResult {
    type Item = &'a SearchHit;
    type IntoIter = std::slice::Iter<'a, SearchHit>;

    fn into_iter(self) -> Self::IntoIter {
        self.hits.iter()
    }
}

/// Sorts hits by distance, breaking ties on record id.
pub(crate) fn sort_hits(hits: &mut [SearchHit]) {
    hits.sort_by(|a, b| {
        a.distance
            .total_cmp(&b.distance)
            .then(a.record.id.cmp(&b.record.id))
    });
}
