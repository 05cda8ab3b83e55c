//! Configuration module for the registration backend.

use serde::Deserialize;
use std::env;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Address to bind the HTTP server to.
    pub bind_address: String,
    /// Default `tracing-subscriber` env-filter directive when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Bounded capacity of each event-bus subscriber's outbound queue.
    pub event_channel_capacity: usize,
    /// CORS origin allowed for the (out-of-scope) browser UI; "*" if unset.
    pub cors_origin: String,
}

impl AppConfig {
    /// Load configuration from environment variables, falling back to an
    /// optional `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            bind_address: env_var_or("BIND_ADDRESS", "0.0.0.0:8080"),
            log_filter: env_var_or("LOG_FILTER", "info"),
            event_channel_capacity: env_var_parsed_or("EVENT_CHANNEL_CAPACITY", 64)?,
            cors_origin: env_var_or("CORS_ORIGIN", "*"),
        })
    }
}

fn env_var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_var_parsed_or(name: &str, default: usize) -> Result<usize, ConfigError> {
    match env::var(name) {
        Ok(val) => val
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name.to_string(), val)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_var_or_uses_default() {
        let val = env_var_or("NON_EXISTENT_VAR_REGISTRATION", "default_value");
        assert_eq!(val, "default_value");
    }

    #[test]
    fn env_var_parsed_or_rejects_unparseable_values() {
        // SAFETY: test-only, single-threaded access to this specific var.
        unsafe {
            env::set_var("REGISTRATION_TEST_BAD_NUMBER", "not-a-number");
        }
        let result = env_var_parsed_or("REGISTRATION_TEST_BAD_NUMBER", 1);
        assert!(result.is_err());
        unsafe {
            env::remove_var("REGISTRATION_TEST_BAD_NUMBER");
        }
    }
}
