//! Error types for tinca-core
//!
//! Store and cache failures are kept apart: store failures reach the caller,
//! cache failures are absorbed by the leaderboard cache manager.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used across tinca-core
pub type CoreResult<T> = Result<T, CoreError>;

/// Core error type for tinca operations
#[derive(Error, Debug)]
pub enum CoreError {
    // ===================
    // Write conflicts
    // ===================
    #[error("Score already exists for user {user_id} and game {game_id}")]
    Duplicate { user_id: i64, game_id: String },

    #[error("Username already taken: {username}")]
    DuplicateUser { username: String },

    // ===================
    // Collaborators
    // ===================
    #[error("Score store unavailable during {operation}")]
    StoreUnavailable {
        operation: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Cache layer unavailable during {operation}: {message}")]
    CacheUnavailable {
        operation: &'static str,
        message: String,
    },

    #[error("Failed to (de)serialize {what}: {message}")]
    Serialization { what: &'static str, message: String },

    // ===================
    // Users
    // ===================
    #[error("Invalid password")]
    InvalidCredentials,

    #[error("Password hashing failed: {message}")]
    PasswordHash { message: String },

    // ===================
    // Config / IO
    // ===================
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Failed to access {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CoreError {
    /// Wrap a rusqlite error raised while talking to the score store
    pub fn store(operation: &'static str, source: rusqlite::Error) -> Self {
        CoreError::StoreUnavailable { operation, source }
    }

    /// Build a cache error from anything printable
    pub fn cache(operation: &'static str, message: impl ToString) -> Self {
        CoreError::CacheUnavailable {
            operation,
            message: message.to_string(),
        }
    }

    /// True for conflicts the caller caused (not worth logging as failures)
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            CoreError::Duplicate { .. } | CoreError::DuplicateUser { .. }
        )
    }
}

/// True when a rusqlite error is a UNIQUE/constraint violation
pub(crate) fn is_constraint_violation(error: &rusqlite::Error) -> bool {
    matches!(
        error,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}
