//! Application configuration loaded from environment variables.

use std::str::FromStr;

use identity::{MAX_TTL_HOURS, MIN_TTL_HOURS};
use secrecy::SecretString;
use thiserror::Error;

/// Errors raised while reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("expected \"text\" or \"json\", got {other:?}")),
        }
    }
}

/// Server configuration.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `8080`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `text` or `json` (default: `text`)
/// - `DATABASE_URL`: PostgreSQL URL; the in-memory store is used when unset
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: `10`)
/// - `JWT_SECRET`: token signing secret (required)
/// - `JWT_TTL_HOURS`: token lifetime, 24 to 72 (default: `72`)
/// - `ADMIN_EMAILS`: comma-separated emails registered as admins
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<SecretString>,
    pub database_max_connections: u32,
    pub jwt_secret: SecretString,
    pub jwt_ttl_hours: i64,
    pub admin_emails: Vec<String>,
}

impl Config {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let jwt_secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let jwt_ttl_hours = parse_or(&get, "JWT_TTL_HOURS", 72_i64)?;
        if !(MIN_TTL_HOURS..=MAX_TTL_HOURS).contains(&jwt_ttl_hours) {
            return Err(ConfigError::Invalid {
                var: "JWT_TTL_HOURS",
                value: jwt_ttl_hours.to_string(),
                reason: format!("must be between {MIN_TTL_HOURS} and {MAX_TTL_HOURS}"),
            });
        }

        let admin_emails = get("ADMIN_EMAILS")
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|email| !email.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&get, "PORT", 8080_u16)?,
            log_level: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            log_format: parse_or(&get, "LOG_FORMAT", LogFormat::Text)?,
            database_url: get("DATABASE_URL").map(SecretString::from),
            database_max_connections: parse_or(&get, "DATABASE_MAX_CONNECTIONS", 10_u32)?,
            jwt_secret: SecretString::from(jwt_secret),
            jwt_ttl_hours,
            admin_emails,
        })
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T, G>(get: &G, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(var) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}
