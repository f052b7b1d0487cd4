//! Application configuration
//!
//! Read from an optional TOML file; every field has a default so an empty
//! file (or none at all) is a valid configuration. The binary layers CLI
//! flags and environment variables on top.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where the leaderboard snapshot lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// In-process, lost on restart
    #[default]
    Memory,
    /// `cache.db` under the data directory, survives restarts
    Sqlite,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Holds `tinca.db` and, for the sqlite backend, `cache.db`
    pub data_dir: PathBuf,
    pub cache_backend: CacheBackend,
    /// HS256 signing secret for bearer tokens
    pub jwt_secret: String,
    pub token_ttl_secs: u64,
    /// Stored when a submission carries no country
    pub default_country: String,
    /// Request header the country is read from
    pub country_header: String,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            cache_backend: CacheBackend::default(),
            jwt_secret: "tinca-dev-secret".to_string(),
            token_ttl_secs: 7 * 24 * 3600,
            default_country: "CN".to_string(),
            country_header: "CF-IPCountry".to_string(),
            port: 3000,
        }
    }
}

impl AppConfig {
    /// Load from `path`, or defaults when no path is given
    pub fn load(path: Option<&Path>) -> CoreResult<Self> {
        let config = match path {
            None => Self::default(),
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|source| CoreError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml(&content)?
            }
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> CoreResult<Self> {
        toml::from_str(content).map_err(|e| CoreError::InvalidConfig {
            message: e.to_string(),
        })
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.jwt_secret.is_empty() {
            return Err(CoreError::InvalidConfig {
                message: "jwt_secret must not be empty".to_string(),
            });
        }
        if self.token_ttl_secs == 0 {
            return Err(CoreError::InvalidConfig {
                message: "token_ttl_secs must be positive".to_string(),
            });
        }
        if self.country_header.trim().is_empty() {
            return Err(CoreError::InvalidConfig {
                message: "country_header must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("tinca.db")
    }
}

/// `<platform data dir>/tinca`, falling back to `./.tinca`
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("tinca"))
        .unwrap_or_else(|| PathBuf::from(".tinca"))
}
