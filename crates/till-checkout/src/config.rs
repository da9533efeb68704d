//! Runtime configuration.
//!
//! Loaded from environment variables with fallback to defaults, then handed
//! down explicitly: [`DbConfig`] to the pool and [`CheckoutConfig`] to the
//! engine.
//!
//! | Variable                    | Default     |
//! |-----------------------------|-------------|
//! | `TILL_DATABASE_PATH`        | `./till.db` |
//! | `TILL_MAX_CONNECTIONS`      | `5`         |
//! | `TILL_ACQUIRE_TIMEOUT_SECS` | `30`        |
//! | `TILL_COMMIT_TIMEOUT_MS`    | `5000`      |

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use till_db::DbConfig;

/// Settings the checkout engine itself needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutConfig {
    /// Upper bound on one unit of work, from begin to commit.
    pub commit_timeout: Duration,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        CheckoutConfig {
            commit_timeout: Duration::from_millis(5000),
        }
    }
}

/// Till configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TillConfig {
    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size
    pub max_connections: u32,

    /// How long to wait for a pooled connection
    pub acquire_timeout: Duration,

    /// Upper bound on one checkout's unit of work
    pub commit_timeout: Duration,
}

impl TillConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        TillConfig::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = TillConfig {
            database_path: lookup("TILL_DATABASE_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./till.db")),

            max_connections: parse_or(&lookup, "TILL_MAX_CONNECTIONS", 5)?,

            acquire_timeout: Duration::from_secs(parse_or(
                &lookup,
                "TILL_ACQUIRE_TIMEOUT_SECS",
                30,
            )?),

            commit_timeout: Duration::from_millis(parse_or(
                &lookup,
                "TILL_COMMIT_TIMEOUT_MS",
                5000,
            )?),
        };

        if config.max_connections == 0 {
            return Err(ConfigError::InvalidValue("TILL_MAX_CONNECTIONS".to_string()));
        }
        if config.commit_timeout.is_zero() {
            return Err(ConfigError::InvalidValue("TILL_COMMIT_TIMEOUT_MS".to_string()));
        }

        Ok(config)
    }

    /// Pool settings derived from this configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database_path.clone())
            .max_connections(self.max_connections)
            .min_connections(1)
            .acquire_timeout(self.acquire_timeout)
    }

    pub fn checkout_config(&self) -> CheckoutConfig {
        CheckoutConfig {
            commit_timeout: self.commit_timeout,
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
