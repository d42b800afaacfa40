//! Runtime configuration for the booking store.
//!
//! # Responsibility
//! - Describe database, pool, deadline and logging settings.
//! - Load them from `BOOKING_*` environment variables or a JSON document.
//!
//! # Invariants
//! - Every field has a default; an empty environment yields a usable config.
//! - Loaded configs are validated before being returned.

use crate::db::PoolConfig;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DB_PATH: &str = "BOOKING_DB_PATH";
pub const ENV_POOL_SIZE: &str = "BOOKING_POOL_SIZE";
pub const ENV_CALL_TIMEOUT_MS: &str = "BOOKING_CALL_TIMEOUT_MS";
pub const ENV_LOG_LEVEL: &str = "BOOKING_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "BOOKING_LOG_DIR";

const DEFAULT_POOL_SIZE: u32 = 8;
const DEFAULT_CALL_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug)]
pub enum ConfigError {
    InvalidValue { key: &'static str, value: String },
    Parse(serde_json::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value } => write!(f, "invalid value `{value}` for {key}"),
            Self::Parse(err) => write!(f, "failed to parse config document: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidValue { .. } => None,
            Self::Parse(err) => Some(err),
        }
    }
}

/// Booking store settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingConfig {
    /// SQLite file path. `None` selects an in-memory database.
    pub db_path: Option<PathBuf>,
    pub pool_size: u32,
    /// Per-call deadline for pool checkout and lock waits, in milliseconds.
    pub call_timeout_ms: u64,
    pub log_level: String,
    /// Absolute directory for rolling log files. `None` disables file logging.
    pub log_dir: Option<PathBuf>,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            pool_size: DEFAULT_POOL_SIZE,
            call_timeout_ms: DEFAULT_CALL_TIMEOUT_MS,
            log_level: crate::logging::default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl BookingConfig {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        if let Some(path) = read(ENV_DB_PATH) {
            config.db_path = Some(PathBuf::from(path));
        }
        if let Some(value) = read(ENV_POOL_SIZE) {
            config.pool_size = parse_number(ENV_POOL_SIZE, &value)?;
        }
        if let Some(value) = read(ENV_CALL_TIMEOUT_MS) {
            config.call_timeout_ms = parse_number(ENV_CALL_TIMEOUT_MS, &value)?;
        }
        if let Some(level) = read(ENV_LOG_LEVEL) {
            config.log_level = level;
        }
        if let Some(dir) = read(ENV_LOG_DIR) {
            config.log_dir = Some(PathBuf::from(dir));
        }

        config.validate()?;
        Ok(config)
    }

    /// Parses a JSON document; missing fields keep their defaults.
    pub fn from_json_str(document: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(document).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pool_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: ENV_POOL_SIZE,
                value: self.pool_size.to_string(),
            });
        }
        if self.call_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: ENV_CALL_TIMEOUT_MS,
                value: self.call_timeout_ms.to_string(),
            });
        }
        Ok(())
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    /// Pool settings derived from this config.
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            pool_size: self.pool_size,
            call_timeout: self.call_timeout(),
        }
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::{BookingConfig, ConfigError, ENV_CALL_TIMEOUT_MS, ENV_DB_PATH, ENV_POOL_SIZE};
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::time::Duration;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = BookingConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, BookingConfig::default());
        assert_eq!(config.call_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn environment_values_override_defaults() {
        let config = BookingConfig::from_lookup(lookup(&[
            (ENV_DB_PATH, "/var/lib/booking.db"),
            (ENV_POOL_SIZE, "3"),
            (ENV_CALL_TIMEOUT_MS, " 250 "),
        ]))
        .unwrap();
        assert_eq!(config.db_path, Some(PathBuf::from("/var/lib/booking.db")));
        assert_eq!(config.pool_config().pool_size, 3);
        assert_eq!(config.pool_config().call_timeout, Duration::from_millis(250));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = BookingConfig::from_lookup(lookup(&[(ENV_CALL_TIMEOUT_MS, "0")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: ENV_CALL_TIMEOUT_MS,
                ..
            }
        ));
    }

    #[test]
    fn non_numeric_pool_size_is_rejected() {
        let err = BookingConfig::from_lookup(lookup(&[(ENV_POOL_SIZE, "many")])).unwrap_err();
        assert!(err.to_string().contains(ENV_POOL_SIZE));
    }

    #[test]
    fn json_document_keeps_defaults_for_missing_fields() {
        let config = BookingConfig::from_json_str(r#"{"pool_size": 2}"#).unwrap();
        assert_eq!(config.pool_size, 2);
        assert_eq!(config.call_timeout_ms, 5_000);
        assert!(config.db_path.is_none());
    }
}
