//! # Observability
//!
//! Tracing + Prometheus metrics for the relay.
//!
//! - Tracing initialization (JSON/Pretty/Compact formats)
//! - Prometheus exporter on a configurable port
//! - Relay metric recording helpers

pub mod metrics;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub use crate::metrics::{
    record_decode_error, record_delivery_failure, record_delivery_success, record_dropped,
    record_message_received, record_queue_depth, record_reconnect, record_validation_error,
};

/// Log output format
#[derive(Debug, Clone, Copy, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `verbose` picks the default level
/// (0 = info, 1 = debug, 2+ = trace) and `quiet` forces warn.
///
/// # Errors
/// Fails when a global subscriber is already installed.
pub fn init_logging(format: LogFormat, verbose: u8, quiet: bool) -> Result<()> {
    let filter = if quiet {
        EnvFilter::new("warn")
    } else {
        let default_level = match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };

    let fmt_layer = match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
        LogFormat::Compact => fmt::layer().compact().boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    Ok(())
}

/// Initialize only the Prometheus exporter (tracing set up separately)
pub fn init_metrics_only(port: u16) -> Result<()> {
    let builder = PrometheusBuilder::new();
    builder
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus recorder")?;

    tracing::info!(port = port, "Prometheus metrics endpoint initialized");
    Ok(())
}
