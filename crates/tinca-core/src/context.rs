//! Wiring of store, cache layer, leaderboard cache and services

use crate::cache::{CacheLayer, MemoryCache, SqliteCache};
use crate::clock::{Clock, SystemClock};
use crate::config::{AppConfig, CacheBackend};
use crate::leaderboard::LeaderboardCache;
use crate::service::{ScoreService, UserService};
use crate::store::{ScoreStore, SqliteStore};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

/// Everything a front end (HTTP, CLI) needs, shared behind `Arc`s
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn ScoreStore>,
    pub leaderboard: Arc<LeaderboardCache>,
    pub scores: Arc<ScoreService>,
    pub users: Arc<UserService>,
}

impl AppContext {
    /// Open the on-disk store and the configured cache backend
    pub fn open(config: AppConfig) -> Result<Self> {
        let db_path = config.db_path();
        let store = SqliteStore::open(&db_path)
            .with_context(|| format!("Failed to open score store at {}", db_path.display()))?;

        let cache: Arc<dyn CacheLayer> = match config.cache_backend {
            CacheBackend::Memory => Arc::new(MemoryCache::new()),
            CacheBackend::Sqlite => Arc::new(
                SqliteCache::new(&config.data_dir).context("Failed to open leaderboard cache")?,
            ),
        };

        info!(
            data_dir = %config.data_dir.display(),
            cache_backend = ?config.cache_backend,
            "Application context ready"
        );

        Ok(Self::assemble(config, Arc::new(store), cache, Arc::new(SystemClock)))
    }

    /// In-memory store and cache (tests, dry runs)
    pub fn in_memory(config: AppConfig) -> Result<Self> {
        let store = SqliteStore::in_memory().context("Failed to open in-memory store")?;
        Ok(Self::assemble(
            config,
            Arc::new(store),
            Arc::new(MemoryCache::new()),
            Arc::new(SystemClock),
        ))
    }

    /// Build from explicit collaborators
    pub fn assemble(
        config: AppConfig,
        store: Arc<dyn ScoreStore>,
        cache: Arc<dyn CacheLayer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let leaderboard = Arc::new(LeaderboardCache::new(store.clone(), cache, clock.clone()));
        let scores = Arc::new(ScoreService::new(
            store.clone(),
            leaderboard.clone(),
            clock.clone(),
            config.default_country.clone(),
        ));
        let users = Arc::new(UserService::new(store.clone(), clock));

        Self {
            config: Arc::new(config),
            store,
            leaderboard,
            scores,
            users,
        }
    }
}
