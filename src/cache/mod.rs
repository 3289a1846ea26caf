//! Result and distance caching.
//!
//! [`CacheBackend`] is the key-value capability a host application provides.
//! [`SearchCache`] layers TTL expiry, typed values and failure bypass on top of
//! it, and [`DistanceMemo`] combines an in-call map with the TTL cache for pair
//! distances.

mod clock;
mod layer;
mod memo;
mod memory;

pub use clock::{Clock, ManualClock, SystemClock};
pub use layer::{PrefixInvalidation, SearchCache};
pub use memo::{DistanceMemo, distance_key, distance_prefix};
pub use memory::MemoryCacheBackend;

use serde::Serialize;
use std::time::Instant;
use thiserror::Error;

/// Errors reported by a cache backend.
///
/// These never reach search callers: the cache layer logs them and bypasses the cache.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("cache value could not be (de)serialized: {0}")]
    Serialization(String),
    #[error("cache backend does not support prefix deletion")]
    PrefixDeleteUnsupported,
}

/// A cached value and the instant it stops being valid.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: String,
    /// JSON-encoded value.
    pub value: String,
    pub expires_at: Instant,
}

impl CacheEntry {
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Approximate size of a backend's contents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheFootprint {
    pub entries: usize,
    pub approx_bytes: usize,
}

/// Key-value store with per-entry expiry, shared between threads.
///
/// Backends keep whatever they are given; the caller decides when an entry has
/// expired. Prefix deletion is optional and capability-checked.
pub trait CacheBackend: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError>;

    fn put(&self, entry: CacheEntry) -> Result<(), CacheError>;

    /// Removes `key`. Returns whether it was present.
    fn delete(&self, key: &str) -> Result<bool, CacheError>;

    fn supports_prefix_delete(&self) -> bool {
        false
    }

    /// Removes every key starting with `prefix`, returning how many were removed.
    fn delete_prefix(&self, _prefix: &str) -> Result<usize, CacheError> {
        Err(CacheError::PrefixDeleteUnsupported)
    }

    /// Current size, when the backend can tell.
    fn footprint(&self) -> Option<CacheFootprint> {
        None
    }

    /// Short backend name for diagnostics.
    fn name(&self) -> &str;
}
