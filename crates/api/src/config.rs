//! Application configuration loaded from environment variables.

use domain::MemberIdRange;
use saga::{CoordinatorConfig, DEFAULT_FIRST_MESSAGE};
use thiserror::Error;

/// Configuration values that cannot be used.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("MEMBER_ID_MIN ({min}) is greater than MEMBER_ID_MAX ({max})")]
    InvalidMemberRange { min: i64, max: i64 },
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `RELATION_LANES`: affinity lanes (default: available parallelism)
/// - `MEMBER_ID_MIN` / `MEMBER_ID_MAX`: valid member ids (default: `1` / `i64::MAX`)
/// - `FRIEND_FIRST_MESSAGE`: first chat message between new friends
/// - `DATABASE_URL`: PostgreSQL connection string; in-memory storage if unset
///
/// Unparsable numbers fall back to their defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub lanes: usize,
    pub member_ids: MemberIdRange,
    pub first_message: String,
    pub database_url: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let parsed = |name: &str| lookup(name).and_then(|v| v.trim().parse::<i64>().ok());

        let min = parsed("MEMBER_ID_MIN").unwrap_or(defaults.member_ids.min);
        let max = parsed("MEMBER_ID_MAX").unwrap_or(defaults.member_ids.max);
        if min > max {
            return Err(ConfigError::InvalidMemberRange { min, max });
        }

        Ok(Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            lanes: lookup("RELATION_LANES")
                .and_then(|n| n.parse::<usize>().ok())
                .unwrap_or(defaults.lanes)
                .max(1),
            member_ids: MemberIdRange::new(min, max),
            first_message: lookup("FRIEND_FIRST_MESSAGE").unwrap_or(defaults.first_message),
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
        })
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Settings handed to the relation coordinator.
    pub fn coordinator(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            member_ids: self.member_ids,
            first_message: self.first_message.clone(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            lanes: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            member_ids: MemberIdRange::default(),
            first_message: DEFAULT_FIRST_MESSAGE.to_string(),
            database_url: None,
        }
    }
}
