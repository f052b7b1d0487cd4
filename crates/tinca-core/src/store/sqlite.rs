//! SQLite score store
//!
//! Schema:
//! - users: unique username, Argon2 password hash
//! - scores: UNIQUE(user_id, game_id), indexed by score for ranking queries
//!
//! Rows with equal scores are returned in insertion order (`id ASC`).

use crate::error::{is_constraint_violation, CoreError, CoreResult};
use crate::models::{NewScore, NewUser, Score, User};
use crate::store::ScoreStore;
use parking_lot::Mutex;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        password TEXT NOT NULL,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS scores (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        game_id TEXT NOT NULL,
        score INTEGER NOT NULL,
        timestamp INTEGER NOT NULL,
        date TEXT NOT NULL,
        country TEXT,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL,
        UNIQUE(user_id, game_id)
    );

    CREATE INDEX IF NOT EXISTS idx_scores_score ON scores(score DESC);
    CREATE INDEX IF NOT EXISTS idx_scores_user ON scores(user_id);
"#;

const SCORE_COLUMNS: &str =
    "id, user_id, game_id, score, timestamp, date, country, created_at, updated_at";

const USER_COLUMNS: &str = "id, username, password, created_at, updated_at";

/// SQLite-backed store (thread-safe)
pub struct SqliteStore {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

impl SqliteStore {
    /// Create or open the database at `db_path`
    pub fn open(db_path: &Path) -> CoreResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| CoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(db_path).map_err(|e| CoreError::store("open", e))?;

        // WAL lets the leaderboard reads run next to score inserts
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))
            .map_err(|e| CoreError::store("enable WAL", e))?;

        let store = Self::with_connection(conn, Some(db_path.to_path_buf()))?;
        debug!(path = %db_path.display(), "Score store opened");
        Ok(store)
    }

    /// Private in-memory database (tests, benchmarks, dry runs)
    pub fn in_memory() -> CoreResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| CoreError::store("open", e))?;
        Self::with_connection(conn, None)
    }

    fn with_connection(conn: Connection, db_path: Option<PathBuf>) -> CoreResult<Self> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| CoreError::store("create schema", e))?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
        })
    }
}

fn score_from_row(row: &Row<'_>) -> rusqlite::Result<Score> {
    Ok(Score {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        game_id: row.get("game_id")?,
        score: row.get("score")?,
        timestamp: row.get("timestamp")?,
        date: row.get("date")?,
        country: row.get("country")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        username: row.get("username")?,
        password_hash: row.get("password")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

impl ScoreStore for SqliteStore {
    fn insert_score(&self, score: &NewScore) -> CoreResult<i64> {
        let conn = self.conn.lock();
        let result = conn.execute(
            r#"
            INSERT INTO scores
            (user_id, game_id, score, timestamp, date, country, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                score.user_id,
                score.game_id,
                score.score,
                score.timestamp,
                score.date,
                score.country,
                score.created_at,
                score.created_at,
            ],
        );

        match result {
            Ok(_) => {
                let id = conn.last_insert_rowid();
                debug!(id, user_id = score.user_id, game_id = %score.game_id, "Score inserted");
                Ok(id)
            }
            Err(e) if is_constraint_violation(&e) => Err(CoreError::Duplicate {
                user_id: score.user_id,
                game_id: score.game_id.clone(),
            }),
            Err(e) => Err(CoreError::store("insert score", e)),
        }
    }

    fn get_score(&self, id: i64) -> CoreResult<Option<Score>> {
        let conn = self.conn.lock();
        conn.query_row(
            &format!("SELECT {SCORE_COLUMNS} FROM scores WHERE id = ?"),
            params![id],
            score_from_row,
        )
        .optional()
        .map_err(|e| CoreError::store("get score", e))
    }

    fn find_score(&self, user_id: i64, game_id: &str) -> CoreResult<Option<Score>> {
        let conn = self.conn.lock();
        conn.query_row(
            &format!("SELECT {SCORE_COLUMNS} FROM scores WHERE user_id = ? AND game_id = ?"),
            params![user_id, game_id],
            score_from_row,
        )
        .optional()
        .map_err(|e| CoreError::store("find score", e))
    }

    fn find_scores_by_user(&self, user_id: i64) -> CoreResult<Vec<Score>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {SCORE_COLUMNS} FROM scores WHERE user_id = ? ORDER BY created_at DESC, id DESC"
            ))
            .map_err(|e| CoreError::store("find scores by user", e))?;

        let rows = stmt
            .query_map(params![user_id], score_from_row)
            .map_err(|e| CoreError::store("find scores by user", e))?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| CoreError::store("find scores by user", e))
    }

    fn top_scores(&self, limit: usize) -> CoreResult<Vec<Score>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {SCORE_COLUMNS} FROM scores ORDER BY score DESC, id ASC LIMIT ?"
            ))
            .map_err(|e| CoreError::store("top scores", e))?;

        let rows = stmt
            .query_map(params![limit as i64], score_from_row)
            .map_err(|e| CoreError::store("top scores", e))?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| CoreError::store("top scores", e))
    }

    fn score_at_rank(&self, offset: usize) -> CoreResult<Option<Score>> {
        let conn = self.conn.lock();
        conn.query_row(
            &format!(
                "SELECT {SCORE_COLUMNS} FROM scores ORDER BY score DESC, id ASC LIMIT 1 OFFSET ?"
            ),
            params![offset as i64],
            score_from_row,
        )
        .optional()
        .map_err(|e| CoreError::store("score at rank", e))
    }

    fn score_count(&self) -> CoreResult<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM scores", [], |row| row.get(0))
            .map_err(|e| CoreError::store("count scores", e))?;
        Ok(count as usize)
    }

    fn find_users_by_ids(&self, ids: &[i64]) -> CoreResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(",");
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {USER_COLUMNS} FROM users WHERE id IN ({placeholders})"
            ))
            .map_err(|e| CoreError::store("find users by ids", e))?;

        let rows = stmt
            .query_map(params_from_iter(ids.iter()), user_from_row)
            .map_err(|e| CoreError::store("find users by ids", e))?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| CoreError::store("find users by ids", e))
    }

    fn insert_user(&self, user: &NewUser) -> CoreResult<i64> {
        let conn = self.conn.lock();
        let result = conn.execute(
            "INSERT INTO users (username, password, created_at, updated_at) VALUES (?, ?, ?, ?)",
            params![
                user.username,
                user.password_hash,
                user.created_at,
                user.created_at
            ],
        );

        match result {
            Ok(_) => Ok(conn.last_insert_rowid()),
            Err(e) if is_constraint_violation(&e) => Err(CoreError::DuplicateUser {
                username: user.username.clone(),
            }),
            Err(e) => Err(CoreError::store("insert user", e)),
        }
    }

    fn find_user_by_username(&self, username: &str) -> CoreResult<Option<User>> {
        let conn = self.conn.lock();
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?"),
            params![username],
            user_from_row,
        )
        .optional()
        .map_err(|e| CoreError::store("find user by username", e))
    }

    fn find_user_by_id(&self, id: i64) -> CoreResult<Option<User>> {
        let conn = self.conn.lock();
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"),
            params![id],
            user_from_row,
        )
        .optional()
        .map_err(|e| CoreError::store("find user by id", e))
    }
}

impl Drop for SqliteStore {
    fn drop(&mut self) {
        // Fold the WAL back into the main file so it does not grow across restarts
        if let Some(path) = &self.db_path {
            let conn = self.conn.lock();
            if let Err(e) = conn.pragma_update(None, "wal_checkpoint", "TRUNCATE") {
                warn!(path = %path.display(), "Failed to checkpoint WAL on store drop: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn new_score(user_id: i64, game_id: &str, score: i64) -> NewScore {
        NewScore {
            user_id,
            game_id: game_id.to_string(),
            score,
            timestamp: 1,
            date: "2024-01-01".to_string(),
            country: "CN".to_string(),
            created_at: 1_000,
        }
    }

    #[test]
    fn test_insert_and_get() {
        let store = SqliteStore::in_memory().unwrap();
        let id = store.insert_score(&new_score(1, "g1", 420)).unwrap();

        let row = store.get_score(id).unwrap().unwrap();
        assert_eq!(row.game_id, "g1");
        assert_eq!(row.score, 420);
        assert_eq!(row.country.as_deref(), Some("CN"));
        assert_eq!(row.created_at, row.updated_at);
    }

    #[test]
    fn test_duplicate_score_rejected() {
        let store = SqliteStore::in_memory().unwrap();
        store.insert_score(&new_score(1, "g1", 100)).unwrap();

        let err = store.insert_score(&new_score(1, "g1", 900)).unwrap_err();
        assert!(matches!(err, CoreError::Duplicate { user_id: 1, .. }));

        // Same game for another user is fine
        store.insert_score(&new_score(2, "g1", 900)).unwrap();
        assert_eq!(store.score_count().unwrap(), 2);
        assert_eq!(store.find_score(1, "g1").unwrap().unwrap().score, 100);
    }

    #[test]
    fn test_top_scores_order_and_ties() {
        let store = SqliteStore::in_memory().unwrap();
        store.insert_score(&new_score(1, "a", 500)).unwrap();
        store.insert_score(&new_score(2, "b", 900)).unwrap();
        store.insert_score(&new_score(3, "c", 500)).unwrap();
        store.insert_score(&new_score(4, "d", 100)).unwrap();

        let top = store.top_scores(3).unwrap();
        let users: Vec<_> = top.iter().map(|s| s.user_id).collect();
        assert_eq!(users, vec![2, 1, 3]);
    }

    #[test]
    fn test_score_at_rank() {
        let store = SqliteStore::in_memory().unwrap();
        for i in 0..5 {
            store.insert_score(&new_score(i, "g", i * 10)).unwrap();
        }

        assert_eq!(store.score_at_rank(0).unwrap().unwrap().score, 40);
        assert_eq!(store.score_at_rank(4).unwrap().unwrap().score, 0);
        assert!(store.score_at_rank(5).unwrap().is_none());
    }

    #[test]
    fn test_find_users_by_ids() {
        let store = SqliteStore::in_memory().unwrap();
        let alice = store
            .insert_user(&NewUser {
                username: "alice".into(),
                password_hash: "h".into(),
                created_at: 1,
            })
            .unwrap();
        let bob = store
            .insert_user(&NewUser {
                username: "bob".into(),
                password_hash: "h".into(),
                created_at: 1,
            })
            .unwrap();

        let users = store.find_users_by_ids(&[alice, bob, 999]).unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(store.find_user_by_id(bob).unwrap().unwrap().username, "bob");
        assert!(store.find_user_by_id(999).unwrap().is_none());
        assert!(store.find_users_by_ids(&[]).unwrap().is_empty());

        let err = store
            .insert_user(&NewUser {
                username: "alice".into(),
                password_hash: "x".into(),
                created_at: 2,
            })
            .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateUser { .. }));
    }

    #[test]
    fn test_file_store_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("tinca.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.insert_score(&new_score(1, "g1", 77)).unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        let scores = store.find_scores_by_user(1).unwrap();
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].score, 77);
    }
}
