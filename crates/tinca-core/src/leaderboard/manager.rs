//! Leaderboard read-through cache with score-driven invalidation
//!
//! Reads serve the singleton snapshot while it is fresh and recompute it
//! from the store otherwise. Writes ask whether the new score beats the
//! current floor; only those clear the snapshot, and the clear runs as a
//! detached task so the write path never waits on the cache layer.
//!
//! Cache layer failures never reach callers: a failed read is a miss, a
//! failed write or delete is logged.

use crate::cache::CacheLayer;
use crate::clock::Clock;
use crate::error::CoreResult;
use crate::leaderboard::snapshot::{
    CachedLeaderboard, SnapshotState, LEADERBOARD_SIZE, SNAPSHOT_KEY,
};
use crate::models::{LeaderboardEntry, UNKNOWN_USERNAME};
use crate::store::ScoreStore;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Owner of the singleton leaderboard snapshot
///
/// Sole writer and sole invalidator of the snapshot key.
pub struct LeaderboardCache {
    store: Arc<dyn ScoreStore>,
    cache: Arc<dyn CacheLayer>,
    clock: Arc<dyn Clock>,

    /// Detached invalidations not yet awaited
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl LeaderboardCache {
    pub fn new(
        store: Arc<dyn ScoreStore>,
        cache: Arc<dyn CacheLayer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            cache,
            clock,
            pending: Mutex::new(Vec::new()),
        }
    }

    // ===================
    // Reads
    // ===================

    /// Top entries, highest score first
    pub fn get_leaderboard(&self) -> CoreResult<Vec<LeaderboardEntry>> {
        let now = self.clock.now_millis();

        let stale = match self.read_snapshot(now) {
            SnapshotState::Fresh(snapshot) => {
                debug!(entries = snapshot.entries.len(), "Leaderboard served from snapshot");
                return Ok(snapshot.entries);
            }
            SnapshotState::Stale(snapshot) => Some(snapshot),
            SnapshotState::Absent => None,
        };

        let entries = match self.fetch_and_rank() {
            Ok(entries) => entries,
            Err(e) => match stale {
                Some(snapshot) => {
                    warn!(
                        error = %e,
                        age_ms = now - snapshot.cached_at,
                        "Store unavailable, serving stale leaderboard snapshot"
                    );
                    return Ok(snapshot.entries);
                }
                None => return Err(e),
            },
        };

        self.write_snapshot(&CachedLeaderboard::new(entries.clone(), now));
        info!(entries = entries.len(), "Leaderboard recomputed");
        Ok(entries)
    }

    /// Current state of the snapshot, as a reader would see it now
    pub fn snapshot_state(&self) -> SnapshotState {
        self.read_snapshot(self.clock.now_millis())
    }

    /// Recompute the ranked top entries straight from the store
    pub fn fetch_and_rank(&self) -> CoreResult<Vec<LeaderboardEntry>> {
        let rows = self.store.top_scores(LEADERBOARD_SIZE)?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut seen = HashSet::new();
        let user_ids: Vec<i64> = rows
            .iter()
            .map(|row| row.user_id)
            .filter(|id| seen.insert(*id))
            .collect();

        let usernames: HashMap<i64, String> = self
            .store
            .find_users_by_ids(&user_ids)?
            .into_iter()
            .map(|user| (user.id, user.username))
            .collect();

        let mut entries: Vec<LeaderboardEntry> = rows
            .into_iter()
            .map(|row| {
                let username = usernames
                    .get(&row.user_id)
                    .cloned()
                    .unwrap_or_else(|| UNKNOWN_USERNAME.to_string());
                LeaderboardEntry::from_score(row, username)
            })
            .collect();

        // Stable: equal scores keep store order
        entries.sort_by(|a, b| b.highest_score.cmp(&a.highest_score));
        entries.truncate(LEADERBOARD_SIZE);

        Ok(entries)
    }

    // ===================
    // Invalidation
    // ===================

    /// Lowest score still on the board
    ///
    /// Taken from a fresh non-empty snapshot when there is one, otherwise
    /// from the row at rank 100 in the store. Fewer than 100 rows, or any
    /// lookup failure, yields 0.
    pub fn current_floor(&self) -> i64 {
        if let Some(floor) = self.read_snapshot(self.clock.now_millis()).fresh_floor() {
            return floor;
        }

        match self.store.score_at_rank(LEADERBOARD_SIZE - 1) {
            Ok(Some(row)) => row.score,
            Ok(None) => 0,
            Err(e) => {
                warn!(error = %e, "Floor lookup failed, assuming floor 0");
                0
            }
        }
    }

    /// Decide whether a persisted score changes the board and clear the
    /// snapshot if so. Returns true when an invalidation was issued.
    ///
    /// For a batch, pass the highest of the newly inserted scores.
    pub fn record_score_written(&self, new_score: i64) -> bool {
        let floor = self.current_floor();

        if new_score <= floor {
            debug!(new_score, floor, "Score below leaderboard floor, snapshot kept");
            return false;
        }

        info!(new_score, floor, "Score enters leaderboard, invalidating snapshot");
        self.invalidate_detached();
        true
    }

    /// Wait for every detached invalidation issued so far
    pub async fn settle(&self) {
        let handles = std::mem::take(&mut *self.pending.lock());
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "Snapshot invalidation task panicked");
            }
        }
    }

    fn invalidate_detached(&self) {
        let cache = Arc::clone(&self.cache);
        let delete = move || match cache.delete(SNAPSHOT_KEY) {
            Ok(()) => debug!("Leaderboard snapshot invalidated"),
            Err(e) => warn!(error = %e, "Failed to invalidate leaderboard snapshot"),
        };

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let handle = runtime.spawn_blocking(delete);
                let mut pending = self.pending.lock();
                pending.retain(|h| !h.is_finished());
                pending.push(handle);
            }
            // Outside a runtime (CLI one-shots) there is no write latency to protect
            Err(_) => delete(),
        }
    }

    // ===================
    // Cache layer access
    // ===================

    fn read_snapshot(&self, now: i64) -> SnapshotState {
        let bytes = match self.cache.get(SNAPSHOT_KEY) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return SnapshotState::Absent,
            Err(e) => {
                warn!(error = %e, "Cache read failed, treating as miss");
                return SnapshotState::Absent;
            }
        };

        match CachedLeaderboard::decode(&bytes) {
            Ok(snapshot) => SnapshotState::classify(Some(snapshot), now),
            Err(e) => {
                warn!(error = %e, "Undecodable leaderboard snapshot, treating as miss");
                SnapshotState::Absent
            }
        }
    }

    fn write_snapshot(&self, snapshot: &CachedLeaderboard) {
        let bytes = match snapshot.encode() {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "Failed to encode leaderboard snapshot");
                return;
            }
        };

        if let Err(e) = self.cache.put(SNAPSHOT_KEY, &bytes) {
            warn!(error = %e, "Failed to write leaderboard snapshot");
        }
    }
}
