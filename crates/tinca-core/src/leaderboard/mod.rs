//! Global leaderboard: level mapping, cached snapshot, cache manager

pub mod level;
pub mod manager;
pub mod snapshot;

pub use level::Level;
pub use manager::LeaderboardCache;
pub use snapshot::{CachedLeaderboard, SnapshotState, LEADERBOARD_SIZE, SNAPSHOT_KEY, SNAPSHOT_TTL};
