//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `SHOPFRONT_BIND_ADDR` - Listen address (default: `0.0.0.0:$PORT`)
//! - `PORT` - Listen port when no bind address is given (default: 3001)
//! - `DATABASE_URL` - Postgres connection string; the in-memory store is used when unset
//! - `SHOPFRONT_DB_MAX_CONNECTIONS` - Pool size (default: 10)
//! - `SHOPFRONT_STORE_TIMEOUT_MS` - Upper bound for one store call (default: 5000)
//! - `SHOPFRONT_ID_MAX_ATTEMPTS` - Insert attempts per product id (default: 5, at least 1)

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use crate::services::ServiceSettings;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub store_timeout: Duration,
    pub id_max_attempts: u32,
}

// The database URL usually carries a password.
impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("database_url", &self.database_url.as_ref().map(|_| "[REDACTED]"))
            .field("db_max_connections", &self.db_max_connections)
            .field("store_timeout", &self.store_timeout)
            .field("id_max_attempts", &self.id_max_attempts)
            .finish()
    }
}

impl AppConfig {
    pub const DEFAULT_PORT: u16 = 3001;

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr = match get("SHOPFRONT_BIND_ADDR") {
            Some(raw) => parse("SHOPFRONT_BIND_ADDR", &raw)?,
            None => {
                let port = get("PORT")
                    .map(|raw| parse::<u16>("PORT", &raw))
                    .transpose()?
                    .unwrap_or(Self::DEFAULT_PORT);
                SocketAddr::from(([0, 0, 0, 0], port))
            }
        };

        let db_max_connections = get("SHOPFRONT_DB_MAX_CONNECTIONS")
            .map(|raw| parse::<u32>("SHOPFRONT_DB_MAX_CONNECTIONS", &raw))
            .transpose()?
            .unwrap_or(10);
        if db_max_connections == 0 {
            return Err(invalid("SHOPFRONT_DB_MAX_CONNECTIONS", "must be at least 1"));
        }

        let timeout_ms = get("SHOPFRONT_STORE_TIMEOUT_MS")
            .map(|raw| parse::<u64>("SHOPFRONT_STORE_TIMEOUT_MS", &raw))
            .transpose()?
            .unwrap_or(5_000);
        if timeout_ms == 0 {
            return Err(invalid("SHOPFRONT_STORE_TIMEOUT_MS", "must be at least 1"));
        }

        let id_max_attempts = get("SHOPFRONT_ID_MAX_ATTEMPTS")
            .map(|raw| parse::<u32>("SHOPFRONT_ID_MAX_ATTEMPTS", &raw))
            .transpose()?
            .unwrap_or(5);
        if id_max_attempts == 0 {
            return Err(invalid("SHOPFRONT_ID_MAX_ATTEMPTS", "must be at least 1"));
        }

        Ok(Self {
            bind_addr,
            database_url: get("DATABASE_URL"),
            db_max_connections,
            store_timeout: Duration::from_millis(timeout_ms),
            id_max_attempts,
        })
    }

    pub fn service_settings(&self) -> ServiceSettings {
        ServiceSettings {
            op_timeout: self.store_timeout,
            id_max_attempts: self.id_max_attempts,
        }
    }
}

fn parse<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| invalid(key, e.to_string()))
}

fn invalid(key: &str, msg: impl Into<String>) -> ConfigError {
    ConfigError::InvalidEnvVar(key.to_string(), msg.into())
}
