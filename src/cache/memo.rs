use crate::cache::SearchCache;
use crate::core::units::{DistanceAlgorithm, DistanceUnit};
use crate::util::coord::Coordinate;
use std::collections::HashMap;

fn coordinate_segment(coord: &Coordinate) -> String {
    // adding 0.0 folds -0.0 into 0.0
    format!("{:.7},{:.7}", coord.latitude() + 0.0, coord.longitude() + 0.0)
}

/// Prefix shared by every distance entry keyed on `from` as its first point.
pub fn distance_prefix(prefix: &str, from: &Coordinate) -> String {
    format!("{}distance:{}:", prefix, coordinate_segment(from))
}

/// Cache key for the distance from `a` to `b`.
pub fn distance_key(
    prefix: &str,
    a: &Coordinate,
    b: &Coordinate,
    unit: DistanceUnit,
    algorithm: DistanceAlgorithm,
) -> String {
    format!(
        "{}{}:{}:{}",
        distance_prefix(prefix, a),
        coordinate_segment(b),
        unit,
        algorithm
    )
}

/// Two-layer memo for pair distances: a map scoped to one call, backed by the TTL cache.
///
/// Each computed distance is written to the cache under both orientations, so a
/// prefix delete on one coordinate drops an entry for every pair touching it.
/// The mirrored entries left behind still hold correct values and expire by TTL.
pub struct DistanceMemo<'a> {
    cache: &'a SearchCache,
    local: HashMap<String, f64>,
    computed: usize,
}

impl<'a> DistanceMemo<'a> {
    pub fn new(cache: &'a SearchCache) -> Self {
        Self {
            cache,
            local: HashMap::new(),
            computed: 0,
        }
    }

    pub fn distance(
        &mut self,
        a: &Coordinate,
        b: &Coordinate,
        unit: DistanceUnit,
        algorithm: DistanceAlgorithm,
    ) -> f64 {
        let prefix = self.cache.prefix();
        let key = distance_key(prefix, a, b, unit, algorithm);
        if let Some(distance) = self.local.get(&key) {
            return *distance;
        }

        let distance = match self.cache.get::<f64>(&key) {
            Some(distance) => distance,
            None => {
                let distance = algorithm.distance(a, b, unit);
                self.computed += 1;
                let ttl = self.cache.distance_ttl();
                self.cache.put(&key, &distance, ttl);
                let reverse = distance_key(prefix, b, a, unit, algorithm);
                if reverse != key {
                    self.cache.put(&reverse, &distance, ttl);
                }
                distance
            }
        };

        self.local.insert(key, distance);
        distance
    }

    /// Distances computed from scratch by this memo.
    pub fn computed(&self) -> usize {
        self.computed
    }
}
