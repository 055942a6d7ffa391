//! Configuration Module
//!
//! Loads service configuration from environment variables. Values are fixed
//! once constructed; nothing re-reads the environment at runtime.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::readiness::GateConfig;

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Deployment profile (`local`, `dev`, `prod`), selects the log level
    pub env: String,
    /// HTTP server port
    pub server_port: u16,
    /// Postgres connection string; `None` selects the in-memory store
    pub postgres_dsn: Option<String>,
    /// Maximum Postgres pool connections
    pub postgres_max_connections: u32,
    /// Redis URL; `None` selects the in-memory cache
    pub redis_url: Option<String>,
    /// Maximum Redis pool connections
    pub redis_pool_size: usize,
    /// TTL in seconds for cached user and app snapshots
    pub cache_ttl: u64,
    /// Budget in milliseconds for a single cache call inside a lookup
    pub cache_op_timeout_ms: u64,
    /// Per-request lookup deadline in milliseconds
    pub request_timeout_ms: u64,
    /// Readiness probe attempts per dependency
    pub probe_attempts: u32,
    /// Linear backoff base in milliseconds
    pub probe_base_delay_ms: u64,
    /// Timeout in milliseconds for a single ping
    pub probe_attempt_timeout_ms: u64,
    /// Overall bootstrap deadline in milliseconds
    pub bootstrap_timeout_ms: u64,
    /// In-memory cache purge interval in seconds
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `APP_ENV` - Deployment profile (default: local)
    /// - `SERVER_PORT` - HTTP server port (default: 8080)
    /// - `POSTGRES_DSN` - Postgres connection string (default: unset)
    /// - `POSTGRES_MAX_CONNECTIONS` - Pool size (default: 20)
    /// - `REDIS_URL` - Redis URL (default: unset)
    /// - `REDIS_POOL_SIZE` - Pool size (default: 16)
    /// - `CACHE_TTL_SECS` - Cached record TTL (default: 120)
    /// - `CACHE_OP_TIMEOUT_MS` - Single cache call budget (default: 250)
    /// - `REQUEST_TIMEOUT_MS` - Lookup deadline (default: 3000)
    /// - `PROBE_ATTEMPTS` - Readiness attempts (default: 5)
    /// - `PROBE_BASE_DELAY_MS` - Readiness backoff base (default: 500)
    /// - `PROBE_ATTEMPT_TIMEOUT_MS` - Single ping timeout (default: 1000)
    /// - `BOOTSTRAP_TIMEOUT_MS` - Overall readiness deadline (default: 5000)
    /// - `CLEANUP_INTERVAL_SECS` - Purge frequency (default: 1)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            env: env::var("APP_ENV").unwrap_or(defaults.env),
            server_port: parse_var("SERVER_PORT", defaults.server_port),
            postgres_dsn: non_empty_var("POSTGRES_DSN"),
            postgres_max_connections: parse_var(
                "POSTGRES_MAX_CONNECTIONS",
                defaults.postgres_max_connections,
            ),
            redis_url: non_empty_var("REDIS_URL"),
            redis_pool_size: parse_var("REDIS_POOL_SIZE", defaults.redis_pool_size),
            cache_ttl: parse_var("CACHE_TTL_SECS", defaults.cache_ttl),
            cache_op_timeout_ms: parse_var("CACHE_OP_TIMEOUT_MS", defaults.cache_op_timeout_ms),
            request_timeout_ms: parse_var("REQUEST_TIMEOUT_MS", defaults.request_timeout_ms),
            probe_attempts: parse_var("PROBE_ATTEMPTS", defaults.probe_attempts),
            probe_base_delay_ms: parse_var("PROBE_BASE_DELAY_MS", defaults.probe_base_delay_ms),
            probe_attempt_timeout_ms: parse_var(
                "PROBE_ATTEMPT_TIMEOUT_MS",
                defaults.probe_attempt_timeout_ms,
            ),
            bootstrap_timeout_ms: parse_var("BOOTSTRAP_TIMEOUT_MS", defaults.bootstrap_timeout_ms),
            cleanup_interval: parse_var("CLEANUP_INTERVAL_SECS", defaults.cleanup_interval),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    pub fn cache_op_timeout(&self) -> Duration {
        Duration::from_millis(self.cache_op_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Readiness gate parameters derived from this configuration.
    pub fn gate_config(&self) -> GateConfig {
        GateConfig {
            attempts: self.probe_attempts,
            base_delay: Duration::from_millis(self.probe_base_delay_ms),
            attempt_timeout: Duration::from_millis(self.probe_attempt_timeout_ms),
            overall_timeout: Duration::from_millis(self.bootstrap_timeout_ms),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            env: "local".to_string(),
            server_port: 8080,
            postgres_dsn: None,
            postgres_max_connections: 20,
            redis_url: None,
            redis_pool_size: 16,
            cache_ttl: 120,
            cache_op_timeout_ms: 250,
            request_timeout_ms: 3000,
            probe_attempts: 5,
            probe_base_delay_ms: 500,
            probe_attempt_timeout_ms: 1000,
            bootstrap_timeout_ms: 5000,
            cleanup_interval: 1,
        }
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
