//! Request body validation

use crate::response::ApiError;
use serde::Deserialize;
use tinca_core::models::{LoginRequest, UploadScore};

const MAX_GAME_ID: usize = 512;
const MAX_DATE: usize = 50;
const MAX_CREDENTIAL: usize = 512;

/// Body of `POST /score/multiple`
#[derive(Debug, Clone, Deserialize)]
pub struct MultipleScoresRequest {
    pub scores: Vec<UploadScore>,
}

pub trait Validate {
    /// Push `path: message` for every violated rule
    fn collect_errors(&self, path: &str, errors: &mut Vec<String>);

    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = Vec::new();
        self.collect_errors("", &mut errors);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::BadRequest(format!(
                "Validation failed: {}",
                errors.join(", ")
            )))
        }
    }
}

fn field(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}.{name}")
    }
}

fn check_len(
    value: &str,
    max: usize,
    path: String,
    empty_msg: &str,
    long_msg: &str,
    errors: &mut Vec<String>,
) {
    let len = value.chars().count();
    if len == 0 {
        errors.push(format!("{path}: {empty_msg}"));
    } else if len > max {
        errors.push(format!("{path}: {long_msg}"));
    }
}

impl Validate for UploadScore {
    fn collect_errors(&self, path: &str, errors: &mut Vec<String>) {
        check_len(
            &self.game_id,
            MAX_GAME_ID,
            field(path, "gameId"),
            "Game ID cannot be empty",
            "Game ID cannot exceed 512 characters",
            errors,
        );
        if self.score <= 0 {
            errors.push(format!("{}: Score must be a positive number", field(path, "score")));
        }
        if self.timestamp <= 0 {
            errors.push(format!(
                "{}: Timestamp must be a positive number",
                field(path, "timestamp")
            ));
        }
        check_len(
            &self.date,
            MAX_DATE,
            field(path, "date"),
            "Date cannot be empty",
            "Date cannot exceed 50 characters",
            errors,
        );
    }
}

impl Validate for MultipleScoresRequest {
    fn collect_errors(&self, path: &str, errors: &mut Vec<String>) {
        let scores = field(path, "scores");
        for (i, row) in self.scores.iter().enumerate() {
            row.collect_errors(&format!("{scores}.{i}"), errors);
        }
    }
}

impl Validate for LoginRequest {
    fn collect_errors(&self, path: &str, errors: &mut Vec<String>) {
        check_len(
            &self.username,
            MAX_CREDENTIAL,
            field(path, "username"),
            "Username cannot be empty",
            "Username cannot exceed 512 characters",
            errors,
        );
        check_len(
            &self.password,
            MAX_CREDENTIAL,
            field(path, "password"),
            "Password cannot be empty",
            "Password cannot exceed 512 characters",
            errors,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(game_id: &str, score: i64, date: &str) -> UploadScore {
        UploadScore {
            game_id: game_id.to_string(),
            score,
            timestamp: 1,
            date: date.to_string(),
        }
    }

    #[test]
    fn test_valid_upload() {
        assert!(upload("g", 1, "2024-01-01").validate().is_ok());
        assert!(upload(&"g".repeat(512), 1, &"d".repeat(50)).validate().is_ok());
    }

    #[test]
    fn test_upload_errors_listed() {
        let err = upload("", 0, &"d".repeat(51)).validate().unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("Validation failed: "));
        assert!(message.contains("gameId: Game ID cannot be empty"));
        assert!(message.contains("score: Score must be a positive number"));
        assert!(message.contains("date: Date cannot exceed 50 characters"));
    }

    #[test]
    fn test_batch_paths() {
        let batch = MultipleScoresRequest {
            scores: vec![upload("ok", 5, "d"), upload("g", -1, "d")],
        };
        let message = batch.validate().unwrap_err().to_string();
        assert_eq!(
            message,
            "Validation failed: scores.1.score: Score must be a positive number"
        );

        let empty = MultipleScoresRequest { scores: vec![] };
        assert!(empty.validate().is_ok());
    }

    #[test]
    fn test_login_lengths() {
        let login = LoginRequest {
            username: "a".repeat(513),
            password: String::new(),
        };
        let message = login.validate().unwrap_err().to_string();
        assert!(message.contains("username: Username cannot exceed 512 characters"));
        assert!(message.contains("password: Password cannot be empty"));
    }
}
