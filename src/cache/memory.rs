use crate::cache::{CacheBackend, CacheEntry, CacheError, CacheFootprint};
use dashmap::DashMap;
use std::mem::size_of;

/// Process-local cache backend on a concurrent hash map.
///
/// Supports prefix deletion and reports its footprint.
#[derive(Debug, Default)]
pub struct MemoryCacheBackend {
    entries: DashMap<String, CacheEntry>,
}

impl MemoryCacheBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CacheBackend for MemoryCacheBackend {
    fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    fn put(&self, entry: CacheEntry) -> Result<(), CacheError> {
        self.entries.insert(entry.key.clone(), entry);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.entries.remove(key).is_some())
    }

    fn supports_prefix_delete(&self) -> bool {
        true
    }

    fn delete_prefix(&self, prefix: &str) -> Result<usize, CacheError> {
        let keys: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| entry.key().clone())
            .collect();

        Ok(keys
            .iter()
            .filter(|key| self.entries.remove(key.as_str()).is_some())
            .count())
    }

    fn footprint(&self) -> Option<CacheFootprint> {
        let approx_bytes = self
            .entries
            .iter()
            .map(|entry| {
                let value = entry.value();
                entry.key().len() + value.key.len() + value.value.len() + size_of::<CacheEntry>()
            })
            .sum();
        Some(CacheFootprint {
            entries: self.entries.len(),
            approx_bytes,
        })
    }

    fn name(&self) -> &str {
        "memory"
    }
}
