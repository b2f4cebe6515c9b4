//! Environment-driven configuration for core entry points.
//!
//! # Responsibility
//! - Resolve database, blob and logging locations from `STUDYHUB_*` vars.
//! - Reject malformed values up front instead of failing mid-request.
//!
//! # Invariants
//! - Blank variables behave as unset.
//! - `public_base_url`, when present, is an http(s) origin without a
//!   trailing slash.

use crate::logging::{default_log_level, normalize_level};
use crate::service::dashboard_service::DEFAULT_RECENT_LIMIT;
use crate::storage::blob_store::FsBlobStore;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "STUDYHUB_DB_PATH";
pub const ENV_BLOB_DIR: &str = "STUDYHUB_BLOB_DIR";
pub const ENV_PUBLIC_BASE_URL: &str = "STUDYHUB_PUBLIC_BASE_URL";
pub const ENV_LOG_LEVEL: &str = "STUDYHUB_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "STUDYHUB_LOG_DIR";
pub const ENV_RECENT_LIMIT: &str = "STUDYHUB_RECENT_LIMIT";

const DEFAULT_DB_FILE_NAME: &str = "studyhub.sqlite3";
const DEFAULT_BLOB_DIR_NAME: &str = "studyhub_blobs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value, reason } => {
                write!(f, "invalid {key} `{value}`: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

/// Resolved runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub blob_dir: PathBuf,
    pub public_base_url: Option<String>,
    pub log_level: &'static str,
    /// Logging stays off when unset.
    pub log_dir: Option<PathBuf>,
    pub recent_limit: usize,
}

impl CoreConfig {
    /// Reads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`CoreConfig::from_env`] over an injectable variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let db_path = read(ENV_DB_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME));
        let blob_dir = read(ENV_BLOB_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_BLOB_DIR_NAME));

        let public_base_url = match read(ENV_PUBLIC_BASE_URL) {
            Some(url) if url.starts_with("http://") || url.starts_with("https://") => {
                Some(url.trim_end_matches('/').to_string())
            }
            Some(url) => {
                return Err(invalid(ENV_PUBLIC_BASE_URL, url, "must start with http:// or https://"))
            }
            None => None,
        };

        let log_level = match read(ENV_LOG_LEVEL) {
            Some(level) => normalize_level(&level).map_err(|reason| ConfigError::InvalidValue {
                key: ENV_LOG_LEVEL,
                value: level.clone(),
                reason,
            })?,
            None => default_log_level(),
        };

        let log_dir = match read(ENV_LOG_DIR).map(PathBuf::from) {
            Some(dir) if !dir.is_absolute() => {
                return Err(invalid(
                    ENV_LOG_DIR,
                    dir.display().to_string(),
                    "must be an absolute path",
                ))
            }
            other => other,
        };

        let recent_limit = match read(ENV_RECENT_LIMIT) {
            Some(raw) => match raw.parse::<usize>() {
                Ok(limit) if limit >= 1 => limit,
                _ => return Err(invalid(ENV_RECENT_LIMIT, raw, "must be a positive integer")),
            },
            None => DEFAULT_RECENT_LIMIT,
        };

        Ok(Self {
            db_path,
            blob_dir,
            public_base_url,
            log_level,
            log_dir,
            recent_limit,
        })
    }

    /// Filesystem blob store rooted at `blob_dir`.
    pub fn blob_store(&self) -> FsBlobStore {
        FsBlobStore::new(self.blob_dir.clone(), self.public_base_url.clone())
    }
}

fn invalid(key: &'static str, value: String, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value,
        reason: reason.to_string(),
    }
}
