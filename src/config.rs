// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.

use std::env;

/// Minimum length of the session signing key in bytes (HS256).
const MIN_SIGNING_KEY_LEN: usize = 32;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Interface to listen on
    pub bind_address: String,
    /// Server port
    pub port: u16,
    /// SQLite connection URL
    pub database_url: String,
    /// Maximum number of pooled database connections
    pub db_max_connections: u32,
    /// Signing key for session cookies (raw bytes)
    pub session_signing_key: Vec<u8>,
    /// Session lifetime in hours
    pub session_ttl_hours: i64,
    /// Mark the session cookie `Secure` (HTTPS deployments)
    pub cookie_secure: bool,
    /// PBKDF2 iteration count for new password hashes
    pub password_hash_iterations: u32,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is honored for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let session_signing_key = env::var("SESSION_SIGNING_KEY")
            .map_err(|_| ConfigError::Missing("SESSION_SIGNING_KEY"))?
            .into_bytes();
        if session_signing_key.len() < MIN_SIGNING_KEY_LEN {
            return Err(ConfigError::Invalid(
                "SESSION_SIGNING_KEY",
                format!("must be at least {MIN_SIGNING_KEY_LEN} bytes"),
            ));
        }

        Ok(Self {
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_var("PORT", 5000)?,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://fitness.db".to_string()),
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", 5)?,
            session_signing_key,
            session_ttl_hours: parse_var("SESSION_TTL_HOURS", 24 * 7)?,
            cookie_secure: parse_var("COOKIE_SECURE", false)?,
            password_hash_iterations: parse_var("PASSWORD_HASH_ITERATIONS", 600_000)?,
        })
    }

    /// Config for tests: in-memory database and a cheap password hash.
    pub fn test_default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 5000,
            database_url: "sqlite::memory:".to_string(),
            db_max_connections: 1,
            session_signing_key: b"test_session_key_32_bytes_minimum!!".to_vec(),
            session_ttl_hours: 1,
            cookie_secure: false,
            password_hash_iterations: 1_000,
        }
    }

    /// Socket address string to bind the listener to.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

/// Read an optional variable, falling back to `default` when unset.
fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, format!("cannot parse {raw:?}"))),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
