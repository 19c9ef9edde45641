//! OTLP push pipeline for the limiter's meter provider.

use anyhow::Context;
use config::{OtlpExporterConfig, OtlpProtocol, TelemetryConfig};
use opentelemetry::KeyValue;
use opentelemetry_otlp::{MetricExporter, WithExportConfig};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};

use crate::metrics::METER_NAME;

pub(crate) fn service_name(config: &TelemetryConfig) -> &str {
    config.service_name().unwrap_or(METER_NAME)
}

/// A provider that pushes every instrument to the collector at the configured interval.
pub(crate) fn meter_provider(
    config: &TelemetryConfig,
    exporter: &OtlpExporterConfig,
) -> anyhow::Result<SdkMeterProvider> {
    let reader = PeriodicReader::builder(metric_exporter(exporter)?)
        .with_interval(exporter.interval)
        .build();

    Ok(SdkMeterProvider::builder()
        .with_resource(resource(config))
        .with_reader(reader)
        .build())
}

fn metric_exporter(config: &OtlpExporterConfig) -> anyhow::Result<MetricExporter> {
    let endpoint = config.endpoint();

    let exporter = match config.protocol {
        OtlpProtocol::Grpc => MetricExporter::builder()
            .with_tonic()
            .with_endpoint(endpoint.as_str())
            .with_timeout(config.timeout)
            .build(),
        OtlpProtocol::Http => MetricExporter::builder()
            .with_http()
            .with_endpoint(endpoint.as_str())
            .with_timeout(config.timeout)
            .build(),
    };

    exporter.with_context(|| format!("Failed to create the {:?} metric exporter for {endpoint}", config.protocol))
}

fn resource(config: &TelemetryConfig) -> Resource {
    let attributes = config
        .resource_attributes()
        .iter()
        .map(|(key, value)| KeyValue::new(key.clone(), value.clone()));

    Resource::builder()
        .with_service_name(service_name(config).to_owned())
        .with_attributes(attributes)
        .build()
}
