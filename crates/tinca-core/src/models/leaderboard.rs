//! Leaderboard entries derived from score rows

use crate::models::Score;
use serde::{Deserialize, Serialize};

pub use crate::leaderboard::level::Level;

/// Username shown when a score's user row no longer exists
pub const UNKNOWN_USERNAME: &str = "Unknown User";

/// One ranked row of the global leaderboard
///
/// Serialized into the cached snapshot with bincode, so no field may be
/// conditionally skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub user_id: i64,
    pub username: String,
    pub highest_score: i64,
    pub game_id: String,
    pub timestamp: i64,
    pub date: String,
    pub country: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    pub level: Level,
}

impl LeaderboardEntry {
    pub fn from_score(score: Score, username: String) -> Self {
        Self {
            user_id: score.user_id,
            username,
            highest_score: score.score,
            level: Level::for_score(score.score),
            game_id: score.game_id,
            timestamp: score.timestamp,
            date: score.date,
            country: score.country,
            created_at: score.created_at,
            updated_at: score.updated_at,
        }
    }
}

/// Leaderboard response body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopScores {
    pub top_scores: Vec<LeaderboardEntry>,
}
