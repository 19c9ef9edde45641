use std::{path::Path, time::Duration};

use anyhow::{Context, bail};
use indoc::formatdoc;

use crate::{Config, RateLimitConfig, StorageConfig};

/// Overrides `rate_limits.max_requests`.
pub const MAX_REQUESTS_ENV: &str = "RATE_LIMIT_MAX_REQUESTS";

/// Overrides `rate_limits.window`, in milliseconds.
pub const WINDOW_MS_ENV: &str = "RATE_LIMIT_WINDOW_MS";

pub(crate) fn load<P, F>(path: P, lookup: F) -> anyhow::Result<Config>
where
    P: AsRef<Path>,
    F: Fn(&str) -> Option<String>,
{
    let path = path.as_ref();

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file {}", path.display()))?;

    let config: Config =
        toml::from_str(&content).with_context(|| format!("Invalid configuration file {}", path.display()))?;

    finalize(config, lookup)
}

/// Applies environment overrides, validates and logs warnings.
pub(crate) fn finalize<F>(mut config: Config, lookup: F) -> anyhow::Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    apply_env_overrides(&mut config.rate_limits, lookup)?;
    validate(&config)?;

    for warning in warnings(&config) {
        log::warn!("{warning}");
    }

    Ok(config)
}

fn apply_env_overrides<F>(config: &mut RateLimitConfig, lookup: F) -> anyhow::Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup(MAX_REQUESTS_ENV) {
        config.max_requests = value
            .trim()
            .parse()
            .with_context(|| format!("{MAX_REQUESTS_ENV} must be a non-negative integer, got '{value}'"))?;

        log::debug!("Using {MAX_REQUESTS_ENV}={} from the environment", config.max_requests);
    }

    if let Some(value) = lookup(WINDOW_MS_ENV) {
        let millis: u64 = value
            .trim()
            .parse()
            .with_context(|| format!("{WINDOW_MS_ENV} must be a number of milliseconds, got '{value}'"))?;

        config.window = Duration::from_millis(millis);

        log::debug!("Using {WINDOW_MS_ENV}={millis} from the environment");
    }

    Ok(())
}

pub(crate) fn validate(config: &Config) -> anyhow::Result<()> {
    let rate_limits = &config.rate_limits;

    if rate_limits.max_requests == 0 {
        bail!(formatdoc! {r#"
            rate_limits.max_requests must be greater than zero.

            To block a route entirely, reject it before it reaches the limiter. To stop limiting,
            set `enabled = false` in [rate_limits].
        "#});
    }

    if rate_limits.window.is_zero() {
        bail!("rate_limits.window must be longer than zero");
    }

    if let StorageConfig::Bounded(bounded) = &rate_limits.storage {
        if bounded.max_keys == 0 {
            bail!("rate_limits.storage.max_keys must be greater than zero");
        }

        if let Some(idle_timeout) = bounded.idle_timeout
            && idle_timeout < rate_limits.window
        {
            bail!(formatdoc! {r#"
                rate_limits.storage.idle_timeout ({idle_timeout:?}) is shorter than rate_limits.window ({window:?}).

                An idle key would be evicted while its window is still active, resetting its quota early.
            "#, window = rate_limits.window});
        }
    }

    Ok(())
}

fn warnings(config: &Config) -> Vec<String> {
    let mut warnings = Vec::new();

    if !config.rate_limits.enabled {
        warnings.push("Rate limiting is disabled, every request will be allowed".to_string());
    }

    let long_window = config.rate_limits.window > Duration::from_secs(86_400);

    if long_window && matches!(config.rate_limits.storage, StorageConfig::Memory) {
        warnings.push(format!(
            "Unbounded memory storage with a {:?} window keeps every key for a long time, consider bounded storage",
            config.rate_limits.window
        ));
    }

    warnings
}
