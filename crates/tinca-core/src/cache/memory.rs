//! In-process cache layer backed by moka

use crate::cache::CacheLayer;
use crate::error::CoreResult;
use moka::sync::Cache;
use std::sync::Arc;

/// Only a handful of keys ever live here
const MAX_ENTRIES: u64 = 64;

/// In-memory cache layer; never fails
#[derive(Clone)]
pub struct MemoryCache {
    entries: Cache<String, Arc<Vec<u8>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self {
            entries: Cache::builder().max_capacity(MAX_ENTRIES).build(),
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheLayer for MemoryCache {
    fn get(&self, key: &str) -> CoreResult<Option<Vec<u8>>> {
        Ok(self.entries.get(key).map(|value| value.as_ref().clone()))
    }

    fn put(&self, key: &str, value: &[u8]) -> CoreResult<()> {
        self.entries.insert(key.to_string(), Arc::new(value.to_vec()));
        Ok(())
    }

    fn delete(&self, key: &str) -> CoreResult<()> {
        self.entries.invalidate(key);
        Ok(())
    }
}
