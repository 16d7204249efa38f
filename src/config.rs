//! Process configuration resolved from environment variables
//!
//! | Variable | Field | Default |
//! |----------|-------|---------|
//! | `PORT` | `port` | `3000` |
//! | `NODE_ENV` | `env` | `development` |
//! | `LOG_LEVEL` | `log_level` | `info` |
//! | `APP_VERSION` | `version` | `1.0.0` |
//! | `DATABASE_URL` | `database_url` | absent |
//! | `API_KEY` | `api_key` | absent |
//!
//! An empty variable counts as unset. Missing secrets are not an error: the
//! service runs in a degraded "demo mode" and reports it on
//! `/api/health/secrets`.

use std::fmt;
use std::num::ParseIntError;
use thiserror::Error;

/// Application name reported on `/`
pub const APP_NAME: &str = "sample-app";

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_ENV: &str = "development";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_VERSION: &str = "1.0.0";

/// Errors that prevent the configuration from resolving
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid PORT value {value:?}: {source}")]
    InvalidPort {
        value: String,
        #[source]
        source: ParseIntError,
    },
}

/// Immutable service configuration, resolved once at process start
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub env: String,
    pub log_level: String,
    pub app_name: String,
    pub version: String,
    pub database_url: Option<String>,
    pub api_key: Option<String>,
}

impl Config {
    /// Resolve configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve configuration from an arbitrary variable lookup
    ///
    /// `lookup` returns the raw value of a variable, or `None` when unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let port = match var("PORT") {
            Some(value) => value
                .trim()
                .parse::<u16>()
                .map_err(|source| ConfigError::InvalidPort { value, source })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            port,
            env: var("NODE_ENV").unwrap_or_else(|| DEFAULT_ENV.to_string()),
            log_level: var("LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            app_name: APP_NAME.to_string(),
            version: var("APP_VERSION").unwrap_or_else(|| DEFAULT_VERSION.to_string()),
            database_url: var("DATABASE_URL"),
            api_key: var("API_KEY"),
        })
    }

    /// Whether `DATABASE_URL` was provided
    pub fn has_database_url(&self) -> bool {
        self.database_url.is_some()
    }

    /// Whether `API_KEY` was provided
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Both external secrets are present
    pub fn has_secrets(&self) -> bool {
        self.has_database_url() && self.has_api_key()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            env: DEFAULT_ENV.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            app_name: APP_NAME.to_string(),
            version: DEFAULT_VERSION.to_string(),
            database_url: None,
            api_key: None,
        }
    }
}

// Secrets are reported by presence only so a stray `{:?}` can't leak them.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("app_name", &self.app_name)
            .field("version", &self.version)
            .field("database_url", &self.has_database_url())
            .field("api_key", &self.has_api_key())
            .finish()
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
