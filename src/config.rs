//! Configuration Module
//!
//! Handles loading the store configuration from environment variables.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::error::CacheError;

// == Backend ==
/// Store backend selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// Process-local store, mostly for tests and single-node hosts
    #[default]
    Memory,
    /// Remote Redis server
    Redis,
}

impl FromStr for Backend {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-memory" => Ok(Backend::Memory),
            "redis" => Ok(Backend::Redis),
            other => Err(CacheError::InvalidConfig(format!(
                "Unknown cache backend '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Memory => write!(f, "memory"),
            Backend::Redis => write!(f, "redis"),
        }
    }
}

/// Store configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Which store backend to connect
    pub backend: Backend,
    /// Redis connection URL
    pub redis_url: String,
    /// Namespace prefix prepended to every key as `prefix:key`
    pub key_prefix: Option<String>,
    /// Timeout for establishing the store connection
    pub connect_timeout: Duration,
    /// Timeout for a single store command
    pub response_timeout: Duration,
    /// In-memory sweeper interval in seconds
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_BACKEND` - `memory` or `redis` (default: memory)
    /// - `REDIS_URL` - Redis URL (default: redis://127.0.0.1:6379)
    /// - `CACHE_KEY_PREFIX` - Key namespace (default: none)
    /// - `CACHE_CONNECT_TIMEOUT` - Connect timeout in seconds (default: 5)
    /// - `CACHE_RESPONSE_TIMEOUT` - Command timeout in seconds (default: 2)
    /// - `CACHE_CLEANUP_INTERVAL` - Sweep frequency in seconds (default: 1)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let backend = match env::var("CACHE_BACKEND") {
            Ok(raw) => raw.parse().unwrap_or_else(|err| {
                warn!("{}, falling back to {}", err, defaults.backend);
                defaults.backend
            }),
            Err(_) => defaults.backend,
        };

        Self {
            backend,
            redis_url: env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            key_prefix: env::var("CACHE_KEY_PREFIX")
                .ok()
                .filter(|prefix| !prefix.is_empty()),
            connect_timeout: env::var("CACHE_CONNECT_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.connect_timeout),
            response_timeout: env::var("CACHE_RESPONSE_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.response_timeout),
            cleanup_interval: env::var("CACHE_CLEANUP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cleanup_interval),
        }
    }

    /// Sets the key prefix
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Selects the backend
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: Backend::Memory,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: None,
            connect_timeout: Duration::from_secs(5),
            response_timeout: Duration::from_secs(2),
            cleanup_interval: 1,
        }
    }
}
