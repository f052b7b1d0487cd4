//! Persistent score and user storage
//!
//! The leaderboard cache manager only relies on the `ScoreStore` query
//! contract; `SqliteStore` is the shipped implementation.

pub mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::CoreResult;
use crate::models::{NewScore, NewUser, Score, User};

/// Query contract of the relational score store
pub trait ScoreStore: Send + Sync {
    /// Insert a score row. Fails with `Duplicate` if (user, game) exists.
    fn insert_score(&self, score: &NewScore) -> CoreResult<i64>;

    fn get_score(&self, id: i64) -> CoreResult<Option<Score>>;

    fn find_score(&self, user_id: i64, game_id: &str) -> CoreResult<Option<Score>>;

    /// Scores of one user, newest first
    fn find_scores_by_user(&self, user_id: i64) -> CoreResult<Vec<Score>>;

    /// Highest scores first; rows with equal scores keep store order
    fn top_scores(&self, limit: usize) -> CoreResult<Vec<Score>>;

    /// Row at zero-based rank `offset` in descending score order
    fn score_at_rank(&self, offset: usize) -> CoreResult<Option<Score>>;

    /// Number of score rows
    fn score_count(&self) -> CoreResult<usize>;

    fn find_users_by_ids(&self, ids: &[i64]) -> CoreResult<Vec<User>>;

    /// Insert a user row. Fails with `DuplicateUser` if the name is taken.
    fn insert_user(&self, user: &NewUser) -> CoreResult<i64>;

    fn find_user_by_username(&self, username: &str) -> CoreResult<Option<User>>;

    fn find_user_by_id(&self, id: i64) -> CoreResult<Option<User>>;
}
