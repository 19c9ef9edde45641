//! OpenTelemetry metrics for the limiter.
//!
//! [`init`] installs an OTLP-exporting meter provider when one is configured. Without an
//! exporter the global no-op provider stays in place and [`RateLimitRecorder`] records
//! into nothing.

mod export;
pub mod metrics;

use config::TelemetryConfig;
use opentelemetry_sdk::metrics::SdkMeterProvider;

pub use metrics::{Outcome, RateLimitRecorder};

/// Keeps the exporting meter provider alive. Dropping it flushes and shuts the provider down.
pub struct TelemetryGuard {
    provider: Option<SdkMeterProvider>,
}

impl TelemetryGuard {
    /// Whether metrics leave the process.
    pub fn is_exporting(&self) -> bool {
        self.provider.is_some()
    }

    /// Push every pending data point to the exporter now.
    pub fn force_flush(&self) -> anyhow::Result<()> {
        let Some(provider) = &self.provider else {
            return Ok(());
        };

        provider
            .force_flush()
            .map_err(|e| anyhow::anyhow!("Failed to flush rate limit metrics: {e}"))
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.provider.take()
            && let Err(e) = provider.shutdown()
        {
            log::error!("Failed to shut down the metrics exporter: {e}");
        }
    }
}

/// Install the global meter provider described by `config`.
///
/// Must run inside a Tokio runtime when a gRPC exporter is configured. Keep the guard alive
/// for as long as metrics should be exported.
pub fn init(config: &TelemetryConfig) -> anyhow::Result<TelemetryGuard> {
    let Some(exporter) = config.metrics_otlp_config() else {
        log::debug!("No metrics exporter enabled, rate limit metrics stay in process");
        return Ok(TelemetryGuard { provider: None });
    };

    let provider = export::meter_provider(config, exporter)?;
    opentelemetry::global::set_meter_provider(provider.clone());

    log::info!(
        "Exporting rate limit metrics for '{}' to {} via {:?} every {:?}",
        export::service_name(config),
        exporter.endpoint(),
        exporter.protocol,
        exporter.interval
    );

    Ok(TelemetryGuard {
        provider: Some(provider),
    })
}
