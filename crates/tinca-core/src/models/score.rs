//! Score rows and upload payloads

use serde::{Deserialize, Serialize};

/// A persisted score row, one per (user, game)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    pub id: i64,
    pub user_id: i64,
    pub game_id: String,
    pub score: i64,
    /// Client-side timestamp of the game
    pub timestamp: i64,
    pub date: String,
    pub country: Option<String>,
    /// Unix milliseconds
    pub created_at: i64,
    /// Unix milliseconds
    pub updated_at: i64,
}

/// Score submission as received from a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadScore {
    pub game_id: String,
    pub score: i64,
    pub timestamp: i64,
    pub date: String,
}

/// Row ready for insertion into the store
#[derive(Debug, Clone)]
pub struct NewScore {
    pub user_id: i64,
    pub game_id: String,
    pub score: i64,
    pub timestamp: i64,
    pub date: String,
    pub country: String,
    pub created_at: i64,
}

impl NewScore {
    pub fn from_upload(user_id: i64, upload: &UploadScore, country: &str, now: i64) -> Self {
        Self {
            user_id,
            game_id: upload.game_id.clone(),
            score: upload.score,
            timestamp: upload.timestamp,
            date: upload.date.clone(),
            country: country.to_string(),
            created_at: now,
        }
    }
}

/// All scores of one user, newest first
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserScores {
    pub user_id: i64,
    pub scores: Vec<Score>,
}
