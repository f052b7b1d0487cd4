//! Score uploads and reads
//!
//! Every successful insert goes through `LeaderboardCache::record_score_written`
//! before the call returns, so the leaderboard never misses a score that
//! beats the floor.

use crate::clock::Clock;
use crate::error::{CoreError, CoreResult};
use crate::leaderboard::LeaderboardCache;
use crate::models::{NewScore, Score, TopScores, UploadScore, UserScores};
use crate::store::ScoreStore;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct ScoreService {
    store: Arc<dyn ScoreStore>,
    leaderboard: Arc<LeaderboardCache>,
    clock: Arc<dyn Clock>,
    default_country: String,
}

impl ScoreService {
    pub fn new(
        store: Arc<dyn ScoreStore>,
        leaderboard: Arc<LeaderboardCache>,
        clock: Arc<dyn Clock>,
        default_country: impl Into<String>,
    ) -> Self {
        Self {
            store,
            leaderboard,
            clock,
            default_country: default_country.into(),
        }
    }

    /// Scores of one user, newest first
    pub fn get_user_scores(&self, user_id: i64) -> CoreResult<UserScores> {
        let scores = self.store.find_scores_by_user(user_id)?;
        Ok(UserScores { user_id, scores })
    }

    /// Store one score; a second score for the same game is rejected
    pub fn upload_score(
        &self,
        user_id: i64,
        data: &UploadScore,
        country: Option<&str>,
    ) -> CoreResult<Score> {
        if self.store.find_score(user_id, &data.game_id)?.is_some() {
            return Err(CoreError::Duplicate {
                user_id,
                game_id: data.game_id.clone(),
            });
        }

        let row = NewScore::from_upload(user_id, data, self.country(country), self.clock.now_millis());
        let id = self.store.insert_score(&row)?;

        // The row is persisted from here on, whatever the read-back does
        self.leaderboard.record_score_written(row.score);

        let created = self.fetch_created(id)?;
        info!(user_id, game_id = %created.game_id, score = created.score, "Score uploaded");
        Ok(created)
    }

    /// Store a batch, skipping games the user already has a score for
    ///
    /// Returns exactly the rows that were created.
    pub fn upload_multiple_scores(
        &self,
        user_id: i64,
        rows: &[UploadScore],
        country: Option<&str>,
    ) -> CoreResult<Vec<Score>> {
        let mut known: HashSet<String> = self
            .store
            .find_scores_by_user(user_id)?
            .into_iter()
            .map(|s| s.game_id)
            .collect();

        let country = self.country(country);
        let now = self.clock.now_millis();
        let mut created = Vec::new();
        let mut best: Option<i64> = None;
        let mut failure = None;

        for data in rows {
            if !known.insert(data.game_id.clone()) {
                debug!(user_id, game_id = %data.game_id, "Skipping existing game in batch");
                continue;
            }

            let row = NewScore::from_upload(user_id, data, country, now);
            let id = match self.store.insert_score(&row) {
                Ok(id) => id,
                Err(CoreError::Duplicate { .. }) => {
                    debug!(user_id, game_id = %data.game_id, "Concurrent duplicate skipped");
                    continue;
                }
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            };
            best = best.max(Some(row.score));

            match self.fetch_created(id) {
                Ok(score) => created.push(score),
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }

        if let Some(best) = best {
            self.leaderboard.record_score_written(best);
        }

        if let Some(e) = failure {
            warn!(user_id, inserted = created.len(), error = %e, "Batch upload aborted");
            return Err(e);
        }

        info!(user_id, submitted = rows.len(), inserted = created.len(), "Batch uploaded");
        Ok(created)
    }

    pub fn get_leaderboard(&self) -> CoreResult<TopScores> {
        Ok(TopScores {
            top_scores: self.leaderboard.get_leaderboard()?,
        })
    }

    fn country<'a>(&'a self, country: Option<&'a str>) -> &'a str {
        match country {
            Some(c) if !c.trim().is_empty() => c,
            _ => &self.default_country,
        }
    }

    fn fetch_created(&self, id: i64) -> CoreResult<Score> {
        self.store.get_score(id)?.ok_or_else(|| CoreError::StoreUnavailable {
            operation: "fetch created score",
            source: rusqlite::Error::QueryReturnedNoRows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::clock::ManualClock;
    use crate::models::{NewUser, User};
    use crate::store::SqliteStore;

    /// SQLite store that can hide created rows and fail inserts for one game
    struct FaultyStore {
        inner: SqliteStore,
        hide_created: bool,
        fail_game: Option<&'static str>,
    }

    impl FaultyStore {
        fn new(hide_created: bool, fail_game: Option<&'static str>) -> Self {
            Self {
                inner: SqliteStore::in_memory().unwrap(),
                hide_created,
                fail_game,
            }
        }
    }

    impl ScoreStore for FaultyStore {
        fn insert_score(&self, score: &NewScore) -> CoreResult<i64> {
            if self.fail_game == Some(score.game_id.as_str()) {
                return Err(CoreError::store("insert score", rusqlite::Error::InvalidQuery));
            }
            self.inner.insert_score(score)
        }

        fn get_score(&self, id: i64) -> CoreResult<Option<Score>> {
            if self.hide_created {
                return Ok(None);
            }
            self.inner.get_score(id)
        }

        fn find_score(&self, user_id: i64, game_id: &str) -> CoreResult<Option<Score>> {
            self.inner.find_score(user_id, game_id)
        }

        fn find_scores_by_user(&self, user_id: i64) -> CoreResult<Vec<Score>> {
            self.inner.find_scores_by_user(user_id)
        }

        fn top_scores(&self, limit: usize) -> CoreResult<Vec<Score>> {
            self.inner.top_scores(limit)
        }

        fn score_at_rank(&self, offset: usize) -> CoreResult<Option<Score>> {
            self.inner.score_at_rank(offset)
        }

        fn score_count(&self) -> CoreResult<usize> {
            self.inner.score_count()
        }

        fn find_users_by_ids(&self, ids: &[i64]) -> CoreResult<Vec<User>> {
            self.inner.find_users_by_ids(ids)
        }

        fn insert_user(&self, user: &NewUser) -> CoreResult<i64> {
            self.inner.insert_user(user)
        }

        fn find_user_by_username(&self, username: &str) -> CoreResult<Option<User>> {
            self.inner.find_user_by_username(username)
        }

        fn find_user_by_id(&self, id: i64) -> CoreResult<Option<User>> {
            self.inner.find_user_by_id(id)
        }
    }

    /// Service over a faulty store whose board already holds a fresh [100]
    fn faulty_service(store: FaultyStore) -> (ScoreService, Arc<LeaderboardCache>, Arc<FaultyStore>) {
        let store = Arc::new(store);
        store
            .inner
            .insert_score(&NewScore::from_upload(99, &upload("seed", 100), "CN", 0))
            .unwrap();

        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(1_000));
        let board = Arc::new(LeaderboardCache::new(
            store.clone(),
            Arc::new(MemoryCache::new()),
            clock.clone(),
        ));
        board.get_leaderboard().unwrap();
        assert!(board.snapshot_state().is_fresh());

        (
            ScoreService::new(store.clone(), board.clone(), clock, "CN"),
            board,
            store,
        )
    }

    fn board_scores(board: &LeaderboardCache) -> Vec<i64> {
        board
            .get_leaderboard()
            .unwrap()
            .iter()
            .map(|e| e.highest_score)
            .collect()
    }

    fn upload(game_id: &str, score: i64) -> UploadScore {
        UploadScore {
            game_id: game_id.to_string(),
            score,
            timestamp: 1_700_000_000,
            date: "2024-06-01".to_string(),
        }
    }

    fn service() -> ScoreService {
        let store: Arc<dyn ScoreStore> = Arc::new(SqliteStore::in_memory().unwrap());
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(1_000));
        let board = Arc::new(LeaderboardCache::new(
            store.clone(),
            Arc::new(MemoryCache::new()),
            clock.clone(),
        ));
        ScoreService::new(store, board, clock, "CN")
    }

    #[test]
    fn test_upload_uses_default_country() {
        let scores = service();
        let row = scores.upload_score(1, &upload("g1", 300), None).unwrap();
        assert_eq!(row.country.as_deref(), Some("CN"));
        assert_eq!(row.created_at, 1_000);

        let row = scores.upload_score(1, &upload("g2", 300), Some("FR")).unwrap();
        assert_eq!(row.country.as_deref(), Some("FR"));

        let row = scores.upload_score(1, &upload("g3", 300), Some("")).unwrap();
        assert_eq!(row.country.as_deref(), Some("CN"));
    }

    #[test]
    fn test_duplicate_upload_keeps_first() {
        let scores = service();
        scores.upload_score(1, &upload("g1", 100), None).unwrap();

        let err = scores.upload_score(1, &upload("g1", 9_000), None).unwrap_err();
        assert!(matches!(err, CoreError::Duplicate { .. }));

        let mine = scores.get_user_scores(1).unwrap();
        assert_eq!(mine.scores.len(), 1);
        assert_eq!(mine.scores[0].score, 100);
    }

    #[test]
    fn test_batch_skips_existing_and_repeats() {
        let scores = service();
        scores.upload_score(1, &upload("g1", 100), None).unwrap();

        let created = scores
            .upload_multiple_scores(
                1,
                &[upload("g1", 500), upload("g2", 200), upload("g2", 900), upload("g3", 50)],
                None,
            )
            .unwrap();

        let games: Vec<_> = created.iter().map(|s| s.game_id.as_str()).collect();
        assert_eq!(games, vec!["g2", "g3"]);
        assert_eq!(created[0].score, 200);
        assert_eq!(scores.get_user_scores(1).unwrap().scores.len(), 3);
    }

    #[test]
    fn test_empty_batch() {
        let scores = service();
        assert!(scores.upload_multiple_scores(1, &[], None).unwrap().is_empty());
    }

    #[test]
    fn test_upload_refreshes_leaderboard() {
        let scores = service();
        scores.upload_score(1, &upload("g1", 400), None).unwrap();
        assert_eq!(scores.get_leaderboard().unwrap().top_scores.len(), 1);

        // Beats the floor of the fresh snapshot; no runtime so the clear is inline
        scores.upload_score(2, &upload("g1", 800), None).unwrap();
        let board = scores.get_leaderboard().unwrap().top_scores;
        assert_eq!(board.len(), 2);
        assert_eq!(board[0].highest_score, 800);
    }

    #[test]
    fn test_persisted_score_invalidates_even_if_read_back_fails() {
        let (scores, board, store) = faulty_service(FaultyStore::new(true, None));

        let err = scores.upload_score(1, &upload("g1", 5_000), None).unwrap_err();
        assert!(matches!(err, CoreError::StoreUnavailable { .. }));
        assert_eq!(store.inner.find_score(1, "g1").unwrap().unwrap().score, 5_000);

        assert!(board.snapshot_state().is_absent());
        assert_eq!(board_scores(&board), vec![5_000, 100]);
    }

    #[test]
    fn test_batch_read_back_failure_still_invalidates() {
        let (scores, board, _store) = faulty_service(FaultyStore::new(true, None));

        assert!(scores
            .upload_multiple_scores(1, &[upload("g1", 5_000)], None)
            .is_err());
        assert_eq!(board_scores(&board), vec![5_000, 100]);
    }

    #[test]
    fn test_batch_store_error_invalidates_rows_already_inserted() {
        let (scores, board, store) = faulty_service(FaultyStore::new(false, Some("boom")));

        let err = scores
            .upload_multiple_scores(
                1,
                &[upload("x", 800), upload("boom", 900), upload("y", 950)],
                None,
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::StoreUnavailable { .. }));

        let stored: Vec<_> = store
            .find_scores_by_user(1)
            .unwrap()
            .into_iter()
            .map(|s| s.game_id)
            .collect();
        assert_eq!(stored, vec!["x"]);
        assert_eq!(board_scores(&board), vec![800, 100]);
    }

    #[test]
    fn test_batch_of_skipped_rows_keeps_snapshot() {
        let (scores, board, _store) = faulty_service(FaultyStore::new(false, None));
        scores.upload_score(1, &upload("g1", 50), None).unwrap();
        assert!(board.snapshot_state().is_fresh());

        // Only the already-stored game carries a high score
        let created = scores
            .upload_multiple_scores(1, &[upload("g1", 9_000), upload("g2", 60)], None)
            .unwrap();
        assert_eq!(created.len(), 1);
        assert!(board.snapshot_state().is_fresh());

        let created = scores
            .upload_multiple_scores(1, &[upload("g1", 9_000), upload("g2", 9_000)], None)
            .unwrap();
        assert!(created.is_empty());
        assert!(board.snapshot_state().is_fresh());
        assert_eq!(board_scores(&board), vec![100]);
    }
}
