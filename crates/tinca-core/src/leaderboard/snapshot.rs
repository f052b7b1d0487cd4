//! Cached leaderboard snapshot and its freshness states
//!
//! absent --populate--> fresh --expire (lazy, on read)--> stale
//! fresh/stale --invalidate--> absent, stale --populate--> fresh

use crate::error::{CoreError, CoreResult};
use crate::models::LeaderboardEntry;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cache key of the singleton snapshot
pub const SNAPSHOT_KEY: &str = "leaderboard:top100";

/// Freshness window of the snapshot
pub const SNAPSHOT_TTL: Duration = Duration::from_secs(5 * 60);

/// Number of ranked entries kept on the board
pub const LEADERBOARD_SIZE: usize = 100;

/// Ranked top-N copy with its capture time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedLeaderboard {
    pub entries: Vec<LeaderboardEntry>,
    /// Unix milliseconds
    pub cached_at: i64,
}

impl CachedLeaderboard {
    pub fn new(entries: Vec<LeaderboardEntry>, cached_at: i64) -> Self {
        Self { entries, cached_at }
    }

    pub fn encode(&self) -> CoreResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| CoreError::Serialization {
            what: "leaderboard snapshot",
            message: e.to_string(),
        })
    }

    pub fn decode(bytes: &[u8]) -> CoreResult<Self> {
        bincode::deserialize(bytes).map_err(|e| CoreError::Serialization {
            what: "leaderboard snapshot",
            message: e.to_string(),
        })
    }

    pub fn is_fresh(&self, now_millis: i64) -> bool {
        now_millis - self.cached_at <= SNAPSHOT_TTL.as_millis() as i64
    }

    /// Lowest score on the board, None when empty
    pub fn floor(&self) -> Option<i64> {
        self.entries.iter().map(|e| e.highest_score).min()
    }
}

/// Lifecycle state of the singleton snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotState {
    Absent,
    Fresh(CachedLeaderboard),
    Stale(CachedLeaderboard),
}

impl SnapshotState {
    pub fn classify(snapshot: Option<CachedLeaderboard>, now_millis: i64) -> Self {
        match snapshot {
            None => SnapshotState::Absent,
            Some(s) if s.is_fresh(now_millis) => SnapshotState::Fresh(s),
            Some(s) => SnapshotState::Stale(s),
        }
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self, SnapshotState::Fresh(_))
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, SnapshotState::Absent)
    }

    /// Floor of a fresh, non-empty snapshot
    pub fn fresh_floor(&self) -> Option<i64> {
        match self {
            SnapshotState::Fresh(s) => s.floor(),
            _ => None,
        }
    }
}
