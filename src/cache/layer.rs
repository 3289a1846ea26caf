use crate::cache::{CacheBackend, CacheEntry, CacheError, CacheFootprint, Clock};
use crate::config::CacheConfig;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

/// Outcome of a prefix invalidation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum PrefixInvalidation {
    /// This many entries were removed.
    Removed(usize),
    /// The backend cannot delete by prefix; nothing was removed.
    Unsupported,
    /// The backend failed while deleting.
    Failed(String),
}

/// TTL cache over a [`CacheBackend`].
///
/// Values are stored as JSON. Any backend failure is logged at `warn` and
/// treated as a miss (reads) or ignored (writes), so callers always fall back to
/// computing the value themselves.
pub struct SearchCache {
    backend: Arc<dyn CacheBackend>,
    clock: Arc<dyn Clock>,
    config: CacheConfig,
}

impl SearchCache {
    pub fn new(backend: Arc<dyn CacheBackend>, clock: Arc<dyn Clock>, config: CacheConfig) -> Self {
        Self {
            backend,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn prefix(&self) -> &str {
        &self.config.prefix
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn search_ttl(&self) -> Duration {
        self.config.search_ttl_duration()
    }

    pub fn distance_ttl(&self) -> Duration {
        self.config.distance_ttl_duration()
    }

    /// The live value under `key`, if any.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if !self.config.enabled {
            return None;
        }

        let entry = match self.backend.get(key) {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                tracing::debug!(key, "Cache miss");
                return None;
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "Cache read failed, bypassing cache");
                return None;
            }
        };

        if entry.is_expired(self.clock.now()) {
            tracing::debug!(key, "Cache entry expired");
            self.forget(key);
            return None;
        }

        match serde_json::from_str(&entry.value) {
            Ok(value) => {
                tracing::debug!(key, "Cache hit");
                Some(value)
            }
            Err(e) => {
                let error = CacheError::Serialization(e.to_string());
                tracing::warn!(key, error = %error, "Discarding unreadable cache entry");
                self.forget(key);
                None
            }
        }
    }

    /// Stores `value` under `key` for `ttl`.
    pub fn put<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) {
        if !self.config.enabled {
            return;
        }

        let encoded = match serde_json::to_string(value) {
            Ok(encoded) => encoded,
            Err(e) => {
                let error = CacheError::Serialization(e.to_string());
                tracing::warn!(key, error = %error, "Value not cached");
                return;
            }
        };

        let entry = CacheEntry {
            key: key.to_string(),
            value: encoded,
            expires_at: self.clock.now() + ttl,
        };
        if let Err(e) = self.backend.put(entry) {
            tracing::warn!(key, error = %e, "Cache write failed, continuing uncached");
        }
    }

    /// Removes `key`. Returns whether an entry was removed.
    pub fn forget(&self, key: &str) -> bool {
        self.backend.delete(key).unwrap_or_else(|e| {
            tracing::warn!(key, error = %e, "Cache delete failed");
            false
        })
    }

    /// Removes every key starting with `prefix`, when the backend supports it.
    pub fn forget_prefix(&self, prefix: &str) -> PrefixInvalidation {
        if !self.backend.supports_prefix_delete() {
            tracing::warn!(
                prefix,
                backend = self.backend.name(),
                "Cache backend cannot delete by prefix; entries expire by TTL"
            );
            return PrefixInvalidation::Unsupported;
        }

        match self.backend.delete_prefix(prefix) {
            Ok(removed) => PrefixInvalidation::Removed(removed),
            Err(CacheError::PrefixDeleteUnsupported) => {
                tracing::warn!(prefix, "Cache backend rejected prefix delete");
                PrefixInvalidation::Unsupported
            }
            Err(e) => {
                tracing::warn!(prefix, error = %e, "Cache prefix delete failed");
                PrefixInvalidation::Failed(e.to_string())
            }
        }
    }

    pub fn footprint(&self) -> Option<CacheFootprint> {
        self.backend.footprint()
    }
}

impl std::fmt::Debug for SearchCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchCache")
            .field("backend", &self.backend.name())
            .field("config", &self.config)
            .finish()
    }
}
