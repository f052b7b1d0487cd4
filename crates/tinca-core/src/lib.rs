//! tinca-core - Core library for tinca
//!
//! Provides the score store, cache layers, the leaderboard read-through
//! cache with score-driven invalidation, and the score/user services.

pub mod cache;
pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod leaderboard;
pub mod models;
pub mod service;
pub mod store;

pub use cache::{CacheLayer, MemoryCache, SqliteCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AppConfig, CacheBackend};
pub use context::AppContext;
pub use error::{CoreError, CoreResult};
pub use leaderboard::{LeaderboardCache, SnapshotState};
pub use service::{ScoreService, UserService};
pub use store::{ScoreStore, SqliteStore};
