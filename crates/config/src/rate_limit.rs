//! Rate limiting configuration structures.

use duration_str::{deserialize_duration, deserialize_option_duration};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Requests allowed per window when nothing else is configured.
pub const DEFAULT_MAX_REQUESTS: u32 = 100;

/// Window length when nothing else is configured.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(15 * 60);

/// Fixed-window rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    /// Whether rate limiting is enabled. A disabled limiter allows every request.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Maximum number of requests a single route and client pair may make per window.
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
    /// Length of one fixed window.
    #[serde(default = "default_window", deserialize_with = "deserialize_duration")]
    pub window: Duration,
    /// Storage backend configuration.
    #[serde(default)]
    pub storage: StorageConfig,
}

fn default_enabled() -> bool {
    true
}

fn default_max_requests() -> u32 {
    DEFAULT_MAX_REQUESTS
}

fn default_window() -> Duration {
    DEFAULT_WINDOW
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            max_requests: default_max_requests(),
            window: default_window(),
            storage: StorageConfig::default(),
        }
    }
}

/// Storage backend configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Unbounded in-memory storage (default). Keys live for the lifetime of the process
    /// unless purged explicitly.
    #[default]
    Memory,
    /// In-memory storage with a maximum key count and idle eviction.
    Bounded(BoundedStorageConfig),
}

/// Configuration for the capacity-bounded store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoundedStorageConfig {
    /// Maximum number of tracked route and client pairs.
    #[serde(default = "default_max_keys")]
    pub max_keys: u64,
    /// How long a key may stay untouched before it is evicted. Defaults to the window length.
    #[serde(default, deserialize_with = "deserialize_option_duration")]
    pub idle_timeout: Option<Duration>,
}

fn default_max_keys() -> u64 {
    10_000
}

impl Default for BoundedStorageConfig {
    fn default() -> Self {
        Self {
            max_keys: default_max_keys(),
            idle_timeout: None,
        }
    }
}
