//! SQLite key/value cache layer
//!
//! Persists cache entries across restarts in `cache_entries`
//! (key -> value blob + last write time). The value format version lives in
//! `PRAGMA user_version`; a database written with another version is emptied
//! on open.

use crate::cache::CacheLayer;
use crate::error::{CoreError, CoreResult};
use anyhow::{Context, Result};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Bump when the encoding of cached values changes
const CACHE_VERSION: i32 = 1;

/// SQLite-backed cache layer (thread-safe)
pub struct SqliteCache {
    conn: Mutex<Connection>,
    cache_path: PathBuf,
}

impl SqliteCache {
    /// Create or open `cache.db` inside `cache_dir`
    pub fn new(cache_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(cache_dir).with_context(|| {
            format!("Failed to create cache directory: {}", cache_dir.display())
        })?;

        let cache_path = cache_dir.join("cache.db");
        let conn = Connection::open(&cache_path)
            .with_context(|| format!("Failed to open cache database: {}", cache_path.display()))?;

        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))
            .context("Failed to enable WAL mode")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS cache_entries (
                key TEXT PRIMARY KEY,
                value BLOB NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            [],
        )
        .context("Failed to create schema")?;

        // 0 means a database this build has never stamped
        let stored: i32 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .context("Failed to read cache version")?;
        if stored != CACHE_VERSION {
            if stored != 0 {
                warn!(stored, current = CACHE_VERSION, "Cache format changed, dropping entries");
            }
            conn.execute("DELETE FROM cache_entries", [])
                .context("Failed to clear stale cache")?;
            conn.pragma_update(None, "user_version", CACHE_VERSION)
                .context("Failed to stamp cache version")?;
        }

        debug!(path = %cache_path.display(), "SQLite cache initialized");

        Ok(Self {
            conn: Mutex::new(conn),
            cache_path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.cache_path
    }

    /// Number of stored entries
    pub fn entry_count(&self) -> CoreResult<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM cache_entries", [], |row| row.get(0))
            .map_err(|e| CoreError::cache("count", e))?;
        Ok(count as usize)
    }

    /// Remove every entry
    pub fn clear(&self) -> CoreResult<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM cache_entries", [])
            .map_err(|e| CoreError::cache("clear", e))?;
        debug!("Cache cleared");
        Ok(())
    }
}

impl CacheLayer for SqliteCache {
    fn get(&self, key: &str) -> CoreResult<Option<Vec<u8>>> {
        let conn = self.conn.lock();
        let value: Option<Vec<u8>> = conn
            .query_row(
                "SELECT value FROM cache_entries WHERE key = ?",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| CoreError::cache("get", e))?;

        debug!(key, hit = value.is_some(), "Cache lookup");
        Ok(value)
    }

    fn put(&self, key: &str, value: &[u8]) -> CoreResult<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR REPLACE INTO cache_entries (key, value, updated_at) VALUES (?, ?, ?)",
            params![key, value, chrono::Utc::now().timestamp_millis()],
        )
        .map_err(|e| CoreError::cache("put", e))?;

        debug!(key, bytes = value.len(), "Cache entry written");
        Ok(())
    }

    fn delete(&self, key: &str) -> CoreResult<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM cache_entries WHERE key = ?", params![key])
            .map_err(|e| CoreError::cache("delete", e))?;

        debug!(key, "Cache entry deleted");
        Ok(())
    }
}

impl Drop for SqliteCache {
    fn drop(&mut self) {
        let conn = self.conn.lock();
        if let Err(e) = conn.pragma_update(None, "wal_checkpoint", "TRUNCATE") {
            warn!("Failed to checkpoint WAL on SqliteCache drop: {}", e);
        }
    }
}
