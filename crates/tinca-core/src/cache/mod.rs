//! Key/value cache layer consumed by the leaderboard cache manager
//!
//! Keys and values are opaque bytes; the manager owns (de)serialization.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryCache;
pub use sqlite::SqliteCache;

use crate::error::CoreResult;

/// get/put/delete by key
pub trait CacheLayer: Send + Sync {
    fn get(&self, key: &str) -> CoreResult<Option<Vec<u8>>>;

    fn put(&self, key: &str, value: &[u8]) -> CoreResult<()>;

    fn delete(&self, key: &str) -> CoreResult<()>;
}
