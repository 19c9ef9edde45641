//! Where rate limit metrics are pushed.

use std::time::Duration;

use duration_str::deserialize_duration;
use serde::Deserialize;
use url::Url;

/// Metric exporters. OTLP is the only supported target.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportersConfig {
    otlp: OtlpExporterConfig,
}

impl ExportersConfig {
    /// The OTLP exporter settings, enabled or not.
    pub fn otlp(&self) -> &OtlpExporterConfig {
        &self.otlp
    }
}

/// Push rate limit counters to an OpenTelemetry collector.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OtlpExporterConfig {
    /// Off unless set.
    pub enabled: bool,
    endpoint: Option<Url>,
    /// Wire protocol used to reach the collector.
    pub protocol: OtlpProtocol,
    /// Deadline for one export request.
    #[serde(deserialize_with = "deserialize_duration")]
    pub timeout: Duration,
    /// Delay between two pushes of the counters.
    #[serde(deserialize_with = "deserialize_duration")]
    pub interval: Duration,
}

impl Default for OtlpExporterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: None,
            protocol: OtlpProtocol::Grpc,
            timeout: Duration::from_secs(10),
            interval: Duration::from_secs(5),
        }
    }
}

impl OtlpExporterConfig {
    /// The configured collector endpoint, or a collector on localhost listening on the
    /// protocol's standard port.
    pub fn endpoint(&self) -> Url {
        match &self.endpoint {
            Some(endpoint) => endpoint.clone(),
            None => self.protocol.local_collector(),
        }
    }
}

/// Wire protocol of the OTLP exporter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OtlpProtocol {
    /// gRPC, port 4317.
    #[default]
    Grpc,
    /// HTTP with protobuf bodies, port 4318.
    Http,
}

impl OtlpProtocol {
    fn local_collector(self) -> Url {
        let endpoint = match self {
            OtlpProtocol::Grpc => "http://localhost:4317",
            OtlpProtocol::Http => "http://localhost:4318/v1/metrics",
        };

        Url::parse(endpoint).expect("collector URL literal should be valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_defaults_follow_the_protocol() {
        let grpc: OtlpExporterConfig = toml::from_str("enabled = true").unwrap();
        assert_eq!(grpc.endpoint().as_str(), "http://localhost:4317/");

        let http: OtlpExporterConfig = toml::from_str(r#"protocol = "http""#).unwrap();
        assert_eq!(http.endpoint().as_str(), "http://localhost:4318/v1/metrics");
    }

    #[test]
    fn explicit_endpoint_wins() {
        let config: OtlpExporterConfig = toml::from_str(r#"
            protocol = "http"
            endpoint = "https://otel.internal:443/v1/metrics"
        "#)
        .unwrap();

        assert_eq!(config.endpoint().as_str(), "https://otel.internal/v1/metrics");
    }

    #[test]
    fn unknown_protocol_is_rejected() {
        let result: Result<OtlpExporterConfig, _> = toml::from_str(r#"protocol = "udp""#);
        assert!(result.is_err());
    }
}
