//! Centralized configuration for the todos CLI.
//!
//! All environment variables are loaded and validated at startup to fail fast
//! on misconfiguration rather than halfway through a command.

use std::env;
use std::fmt;
use std::path::PathBuf;

/// Storage backend provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageProvider {
    /// Session-backed storage, persisted to a JSON session file
    Memory,
    /// SQLite file-based storage
    Sqlite,
}

impl StorageProvider {
    fn from_str(s: &str) -> Self {
        if s.eq_ignore_ascii_case("memory") {
            Self::Memory
        } else {
            Self::Sqlite
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn from_str(s: &str) -> Self {
        if s.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// Configuration error.
#[derive(Debug)]
pub struct ConfigError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Configuration error for {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// CLI configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Storage provider (default: sqlite)
    pub storage_provider: StorageProvider,
    /// SQLite database path
    pub db_path: PathBuf,
    /// Session file used by the memory provider
    pub session_path: PathBuf,
    /// Log format
    pub log_format: LogFormat,
    /// bcrypt cost for provisioning users
    pub bcrypt_cost: u32,
}

impl Config {
    /// Load and validate configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let storage_provider =
            StorageProvider::from_str(&lookup("STORAGE_PROVIDER").unwrap_or_else(|| "sqlite".into()));

        let db_path = lookup("DB_PATH")
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data/todos.db"));

        let session_path = lookup("SESSION_PATH")
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data/session.json"));

        let log_format =
            LogFormat::from_str(&lookup("LOG_FORMAT").unwrap_or_else(|| "pretty".into()));

        let bcrypt_cost = match lookup("BCRYPT_COST") {
            None => bcrypt::DEFAULT_COST,
            Some(raw) => {
                let cost: u32 = raw.parse().map_err(|e| ConfigError {
                    field: "BCRYPT_COST",
                    message: format!("Invalid number '{}': {}", raw, e),
                })?;
                if !(4..=31).contains(&cost) {
                    return Err(ConfigError {
                        field: "BCRYPT_COST",
                        message: format!("Must be between 4 and 31, got {}", cost),
                    });
                }
                cost
            }
        };

        Ok(Self {
            storage_provider,
            db_path,
            session_path,
            log_format,
            bcrypt_cost,
        })
    }

    /// Warn when data only lives in the session file.
    pub fn warn_if_ephemeral(&self) {
        if self.storage_provider == StorageProvider::Memory {
            tracing::warn!(
                session = %self.session_path.display(),
                "STORAGE_PROVIDER=memory: data lives in the session file only and \
                 authentication is unavailable."
            );
        }
    }
}
