//! Observability setup: structured logging and metrics.
//!
//! Library code only records metrics through the `record_*` helpers; nothing
//! is exported unless a binary installs a recorder with
//! [`install_metrics_recorder`]. Without a recorder the `metrics` macros are
//! no-ops.

use anyhow::Result;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::prelude::*;

use crate::observability_config::{LogFormat, ObservabilityConfig};

/// Initialize structured logging on stderr
pub fn init_tracing(config: &ObservabilityConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("menu_allergens={}", config.log_level).parse()?);

    match config.effective_log_format() {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_thread_ids(false)
                        .with_thread_names(false),
                )
                .try_init()?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_thread_ids(true)
                        .with_thread_names(true),
                )
                .try_init()?;
        }
    }

    tracing::info!(
        environment = %config.environment,
        log_level = %config.log_level,
        "Tracing initialized with structured logging"
    );
    Ok(())
}

/// Install the global Prometheus recorder and return its render handle
pub fn install_metrics_recorder() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    tracing::info!("Prometheus metrics recorder installed");
    Ok(handle)
}

/// Record one segmentation pass
pub fn record_segmentation_metrics(
    duration: std::time::Duration,
    text_length: usize,
    line_count: usize,
    items_found: usize,
    categories_found: usize,
) {
    metrics::counter!("menu_segmentation_operations_total").increment(1);
    metrics::histogram!("menu_segmentation_duration_seconds").record(duration.as_secs_f64());
    metrics::histogram!("menu_segmentation_input_length").record(text_length as f64);
    metrics::histogram!("menu_segmentation_line_count").record(line_count as f64);
    metrics::histogram!("menu_segmentation_items_found").record(items_found as f64);
    metrics::histogram!("menu_segmentation_categories_found").record(categories_found as f64);
}

/// Record one allergen detection run
pub fn record_detection_metrics(
    operation: &str,
    duration: std::time::Duration,
    items_scanned: usize,
    items_flagged: usize,
    allergen_types_found: usize,
) {
    let operation = operation.to_string();
    metrics::counter!("allergen_detection_operations_total", "operation" => operation.clone())
        .increment(1);
    metrics::histogram!("allergen_detection_duration_seconds", "operation" => operation.clone())
        .record(duration.as_secs_f64());
    metrics::histogram!("allergen_detection_items_scanned", "operation" => operation.clone())
        .record(items_scanned as f64);
    metrics::histogram!("allergen_detection_items_flagged", "operation" => operation.clone())
        .record(items_flagged as f64);
    metrics::histogram!("allergen_detection_types_found", "operation" => operation)
        .record(allergen_types_found as f64);
}

/// Record the outcome of a menu analysis
pub fn record_analysis_metrics(ocr_confidence: f64, low_confidence: bool) {
    metrics::histogram!("menu_analysis_ocr_confidence").record(ocr_confidence);
    if low_confidence {
        metrics::counter!("menu_analysis_low_confidence_total").increment(1);
    }
}
