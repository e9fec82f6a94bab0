//! Runtime configuration read from `BLOCKFALL_*` environment variables.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::Level;

use crate::types::TICK_MS;

pub const ENV_SEED: &str = "BLOCKFALL_SEED";
pub const ENV_TICK_MS: &str = "BLOCKFALL_TICK_MS";
pub const ENV_LOG_PATH: &str = "BLOCKFALL_LOG_PATH";
pub const ENV_LOG_LEVEL: &str = "BLOCKFALL_LOG_LEVEL";

/// Accepted frame tick range in milliseconds
pub const TICK_MS_RANGE: std::ops::RangeInclusive<u32> = 1..=1000;

#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("{var} must be an unsigned 32-bit integer, got {value:?}")]
    NotANumber { var: &'static str, value: String },
    #[error("BLOCKFALL_TICK_MS must be between 1 and 1000, got {0}")]
    TickOutOfRange(u32),
    #[error("BLOCKFALL_LOG_LEVEL must be one of error, warn, info, debug, trace; got {0:?}")]
    UnknownLogLevel(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Seed for the piece generator
    pub seed: u32,
    /// Frontend frame tick (render and input poll cadence)
    pub tick_ms: u32,
    /// Log file; logging is off when unset
    pub log_path: Option<PathBuf>,
    pub log_level: Level,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: clock_seed(),
            tick_ms: TICK_MS,
            log_path: None,
            log_level: Level::INFO,
        }
    }
}

impl Config {
    /// Create from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Unset or blank variables fall
    /// back to their defaults; malformed ones are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };

        let seed = match get(ENV_SEED) {
            Some(s) => parse_u32(ENV_SEED, &s)?,
            None => clock_seed(),
        };

        let tick_ms = match get(ENV_TICK_MS) {
            Some(s) => parse_u32(ENV_TICK_MS, &s)?,
            None => TICK_MS,
        };
        if !TICK_MS_RANGE.contains(&tick_ms) {
            return Err(ConfigError::TickOutOfRange(tick_ms));
        }

        let log_path = get(ENV_LOG_PATH).map(PathBuf::from);

        let log_level = match get(ENV_LOG_LEVEL) {
            Some(s) => Level::from_str(&s).map_err(|_| ConfigError::UnknownLogLevel(s))?,
            None => Level::INFO,
        };

        Ok(Self {
            seed,
            tick_ms,
            log_path,
            log_level,
        })
    }
}

fn parse_u32(var: &'static str, value: &str) -> Result<u32, ConfigError> {
    value.parse().map_err(|_| ConfigError::NotANumber {
        var,
        value: value.to_string(),
    })
}

/// Seed derived from the wall clock, never zero.
fn clock_seed() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() ^ d.as_secs() as u32)
        .unwrap_or(1)
        .max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_ne!(config.seed, 0);
        assert_eq!(config.tick_ms, 16);
        assert_eq!(config.log_path, None);
        assert_eq!(config.log_level, Level::INFO);
    }

    #[test]
    fn test_reads_all_variables() {
        let config = Config::from_lookup(lookup(&[
            (ENV_SEED, "42"),
            (ENV_TICK_MS, " 33 "),
            (ENV_LOG_PATH, "/tmp/blockfall.log"),
            (ENV_LOG_LEVEL, "debug"),
        ]))
        .unwrap();

        assert_eq!(config.seed, 42);
        assert_eq!(config.tick_ms, 33);
        assert_eq!(config.log_path, Some(PathBuf::from("/tmp/blockfall.log")));
        assert_eq!(config.log_level, Level::DEBUG);
    }

    #[test]
    fn test_blank_values_use_defaults() {
        let config =
            Config::from_lookup(lookup(&[(ENV_LOG_PATH, "  "), (ENV_TICK_MS, "")])).unwrap();
        assert_eq!(config.log_path, None);
        assert_eq!(config.tick_ms, 16);
    }

    #[test]
    fn test_bad_seed_is_an_error() {
        let err = Config::from_lookup(lookup(&[(ENV_SEED, "-3")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::NotANumber {
                var: ENV_SEED,
                value: "-3".to_string()
            }
        );
        assert!(err.to_string().contains("BLOCKFALL_SEED"));
    }

    #[test]
    fn test_tick_range() {
        assert_eq!(
            Config::from_lookup(lookup(&[(ENV_TICK_MS, "0")])).unwrap_err(),
            ConfigError::TickOutOfRange(0)
        );
        assert_eq!(
            Config::from_lookup(lookup(&[(ENV_TICK_MS, "1001")])).unwrap_err(),
            ConfigError::TickOutOfRange(1001)
        );
        assert!(Config::from_lookup(lookup(&[(ENV_TICK_MS, "1000")])).is_ok());
    }

    #[test]
    fn test_unknown_log_level() {
        let err = Config::from_lookup(lookup(&[(ENV_LOG_LEVEL, "chatty")])).unwrap_err();
        assert_eq!(err, ConfigError::UnknownLogLevel("chatty".to_string()));
    }
}
