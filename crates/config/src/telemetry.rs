use std::collections::BTreeMap;

use serde::Deserialize;

pub mod exporters;

pub use self::exporters::{ExportersConfig, OtlpExporterConfig, OtlpProtocol};

/// Telemetry configuration for observability
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct TelemetryConfig {
    /// Service name for telemetry identification
    service_name: Option<String>,

    /// Custom resource attributes to attach to all telemetry
    #[serde(default)]
    resource_attributes: BTreeMap<String, String>,

    /// Metrics exporters configuration
    #[serde(default)]
    exporters: ExportersConfig,
}

impl TelemetryConfig {
    /// Get the service name
    pub fn service_name(&self) -> Option<&str> {
        self.service_name.as_deref()
    }

    /// Get the resource attributes
    pub fn resource_attributes(&self) -> &BTreeMap<String, String> {
        &self.resource_attributes
    }

    /// Get the exporters configuration
    pub fn exporters(&self) -> &ExportersConfig {
        &self.exporters
    }

    /// The OTLP exporter for metrics, if one is enabled
    pub fn metrics_otlp_config(&self) -> Option<&OtlpExporterConfig> {
        let otlp = self.exporters.otlp();
        otlp.enabled.then_some(otlp)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use indoc::indoc;

    use super::*;

    #[test]
    fn defaults_have_no_exporter() {
        let config: TelemetryConfig = toml::from_str("").unwrap();

        assert!(config.service_name().is_none());
        assert!(config.resource_attributes().is_empty());
        assert!(config.metrics_otlp_config().is_none());
        assert_eq!(config.exporters().otlp().protocol, OtlpProtocol::Grpc);
    }

    #[test]
    fn enabled_otlp_exporter() {
        let config = indoc! {r#"
            service_name = "edge-limiter"

            [resource_attributes]
            environment = "staging"

            [exporters.otlp]
            enabled = true
            endpoint = "http://collector:4318"
            protocol = "http"
            timeout = "5s"
            interval = "15s"
        "#};

        let config: TelemetryConfig = toml::from_str(config).unwrap();
        let otlp = config.metrics_otlp_config().unwrap();

        assert_eq!(config.service_name(), Some("edge-limiter"));
        assert_eq!(
            config.resource_attributes().get("environment").map(String::as_str),
            Some("staging")
        );
        assert_eq!(otlp.endpoint().as_str(), "http://collector:4318/");
        assert_eq!(otlp.protocol, OtlpProtocol::Http);
        assert_eq!(otlp.timeout, Duration::from_secs(5));
        assert_eq!(otlp.interval, Duration::from_secs(15));
    }

    #[test]
    fn disabled_exporter_is_not_returned() {
        let config = indoc! {r#"
            [exporters.otlp]
            endpoint = "http://collector:4317"
        "#};

        let config: TelemetryConfig = toml::from_str(config).unwrap();

        assert!(config.metrics_otlp_config().is_none());
    }
}
