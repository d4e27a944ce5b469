//! Typed configuration from environment variables.
//!
//! Loads once at startup, fails fast if required vars are missing or
//! malformed. Sensitive values wrapped in secrecy::SecretString to prevent
//! log leaks.

pub mod secrets;

use crate::error::{Error, Result};
use crate::worker::WorkerConfig;
use secrets::SecretString;
use std::str::FromStr;
use std::time::Duration;

/// Which item store the worker writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// The `todo` table in Postgres.
    Postgres,
    /// Process-local; lost on restart.
    Memory,
}

impl FromStr for StoreBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(Error::Config(format!(
                "STORE_BACKEND must be 'postgres' or 'memory', got '{other}'"
            ))),
        }
    }
}

pub const DEFAULT_QUEUE_NAME: &str = "incoming";

#[derive(Debug)]
pub struct Config {
    pub database_url: SecretString,
    pub store_backend: StoreBackend,
    /// pgmq queue the worker consumes and `queue send` writes to.
    pub queue_name: String,
    pub worker: WorkerConfig,
    pub otel_endpoint: Option<String>,
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self> {
        let defaults = WorkerConfig::default();

        let queue_name =
            std::env::var("QUEUE_NAME").unwrap_or_else(|_| DEFAULT_QUEUE_NAME.to_string());
        validate_queue_name(&queue_name)?;

        let max_messages: usize = parsed_var("MAX_MESSAGES", defaults.max_messages)?;
        if max_messages == 0 {
            return Err(Error::Config("MAX_MESSAGES must be at least 1".to_string()));
        }

        let lease_seconds: u64 = parsed_var("LEASE_SECONDS", defaults.lease.as_secs())?;
        if lease_seconds == 0 {
            return Err(Error::Config("LEASE_SECONDS must be at least 1".to_string()));
        }

        let poll_interval_ms: u64 = parsed_var(
            "POLL_INTERVAL_MS",
            defaults.poll_interval.as_millis() as u64,
        )?;

        Ok(Self {
            database_url: SecretString::from(required_var("DATABASE_URL")?),
            store_backend: parsed_var("STORE_BACKEND", StoreBackend::Postgres)?,
            queue_name,
            worker: WorkerConfig {
                poll_interval: Duration::from_millis(poll_interval_ms),
                lease: Duration::from_secs(lease_seconds),
                max_messages,
                poison_threshold: parsed_var("POISON_THRESHOLD", defaults.poison_threshold)?,
            },
            otel_endpoint: std::env::var("OTEL_ENDPOINT").ok(),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// pgmq queue names become table names: lowercase identifiers, 47 chars max.
pub fn validate_queue_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name.len() <= 47
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "invalid queue name '{name}': use lowercase letters, digits and '_' (max 47)"
        )))
    }
}

fn required_var(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| Error::Config(format!("required environment variable {name} is not set")))
}

fn parsed_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("{name}={raw:?} is invalid: {e}"))),
        Err(_) => Ok(default),
    }
}
