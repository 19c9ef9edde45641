//! Limiter configuration structures to map the limiter.toml configuration.

#![deny(missing_docs)]

mod loader;
mod rate_limit;
mod telemetry;

use std::path::Path;

pub use loader::{MAX_REQUESTS_ENV, WINDOW_MS_ENV};
pub use rate_limit::*;
pub use telemetry::{ExportersConfig, OtlpExporterConfig, OtlpProtocol, TelemetryConfig};
use serde::Deserialize;

/// Main configuration structure for the limiter.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Fixed-window rate limiting settings.
    #[serde(default)]
    pub rate_limits: RateLimitConfig,
    /// Metrics export settings.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl Config {
    /// Load configuration from a file path, then apply `RATE_LIMIT_*` environment overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
        loader::load(path, |name| std::env::var(name).ok())
    }

    /// Default configuration with `RATE_LIMIT_*` environment overrides applied.
    pub fn from_env() -> anyhow::Result<Config> {
        loader::finalize(Config::default(), |name| std::env::var(name).ok())
    }

    /// Validates value ranges that serde cannot express.
    pub fn validate(&self) -> anyhow::Result<()> {
        loader::validate(self)
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use insta::assert_debug_snapshot;

    use crate::Config;

    #[test]
    fn all_values() {
        let config = indoc! {r#"
            [rate_limits]
            enabled = true
            max_requests = 30
            window = "90s"

            [rate_limits.storage]
            type = "bounded"
            max_keys = 2048
            idle_timeout = "3m"

            [telemetry]
            service_name = "limiter"
        "#};

        let config: Config = toml::from_str(config).unwrap();

        assert_debug_snapshot!(&config.rate_limits, @r#"
        RateLimitConfig {
            enabled: true,
            max_requests: 30,
            window: 90s,
            storage: Bounded(
                BoundedStorageConfig {
                    max_keys: 2048,
                    idle_timeout: Some(
                        180s,
                    ),
                },
            ),
        }
        "#);

        assert_eq!(config.telemetry.service_name(), Some("limiter"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn defaults() {
        let config: Config = toml::from_str("").unwrap();

        assert_debug_snapshot!(&config.rate_limits, @r#"
        RateLimitConfig {
            enabled: true,
            max_requests: 100,
            window: 900s,
            storage: Memory,
        }
        "#);

        assert!(config.telemetry.metrics_otlp_config().is_none());
    }

    #[test]
    fn unknown_section_is_rejected() {
        let config = indoc! {r#"
            [server]
            listen_address = "127.0.0.1:8080"
        "#};

        let result: Result<Config, _> = toml::from_str(config);

        assert!(result.is_err());
    }
}
