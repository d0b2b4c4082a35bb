// Telemetry module for structured logging and metrics

use crate::config::LogFormat;
use anyhow::Result;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub const CYCLES_TOTAL: &str = "watcher_cycles_total";
pub const CHANGES_TOTAL: &str = "watcher_changes_total";
pub const RENDER_FAILURES_TOTAL: &str = "watcher_render_failures_total";
pub const NOTIFICATIONS_DISPATCHED_TOTAL: &str = "watcher_notifications_dispatched_total";
pub const NOTIFICATIONS_SUPPRESSED_TOTAL: &str = "watcher_notifications_suppressed_total";
pub const NOTIFICATIONS_FAILED_TOTAL: &str = "watcher_notifications_failed_total";
pub const ENDPOINTS_CACHED: &str = "watcher_endpoints_cached";
pub const CYCLE_DURATION_SECONDS: &str = "watcher_cycle_duration_seconds";

/// Initialize structured logging
///
/// `RUST_LOG` takes precedence over `log_level`. JSON output carries the
/// current span so per-cycle fields land on every line.
pub fn init_logging(log_level: &str, format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .map_err(|e| anyhow::anyhow!("Failed to create env filter: {}", e))?;

    let layer = match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .with_thread_ids(true)
            .with_filter(env_filter)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .with_target(false)
            .with_filter(env_filter)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {}", e))?;

    tracing::info!(log_level = log_level, format = ?format, "Structured logging initialized");

    Ok(())
}

/// Initialize Prometheus metrics exporter and describe every metric
pub fn init_metrics(metrics_port: u16) -> Result<()> {
    let addr: SocketAddr = format!("0.0.0.0:{}", metrics_port)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid metrics port: {}", e))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus exporter: {}", e))?;

    describe_counter!(CYCLES_TOTAL, "Completed watch cycles");
    describe_counter!(CHANGES_TOTAL, "Endpoints found changed");
    describe_counter!(RENDER_FAILURES_TOTAL, "Endpoint renders that failed");
    describe_counter!(NOTIFICATIONS_DISPATCHED_TOTAL, "Notification dispatch attempts");
    describe_counter!(
        NOTIFICATIONS_SUPPRESSED_TOTAL,
        "Notifications skipped due to cooldown"
    );
    describe_counter!(
        NOTIFICATIONS_FAILED_TOTAL,
        "Notification attempts the transport rejected"
    );
    describe_gauge!(ENDPOINTS_CACHED, "Endpoints with a stored snapshot");
    describe_histogram!(CYCLE_DURATION_SECONDS, "Duration of one fetch/diff/notify pass");

    tracing::info!(
        metrics_port = metrics_port,
        metrics_endpoint = format!("http://0.0.0.0:{}/metrics", metrics_port),
        "Prometheus metrics exporter initialized"
    );

    Ok(())
}

#[inline]
pub fn record_cycle(changes: usize, duration_seconds: f64) {
    counter!(CYCLES_TOTAL).increment(1);
    counter!(CHANGES_TOTAL).increment(changes as u64);
    histogram!(CYCLE_DURATION_SECONDS).record(duration_seconds);
}

#[inline]
pub fn record_render_failure() {
    counter!(RENDER_FAILURES_TOTAL).increment(1);
}

#[inline]
pub fn record_notification_dispatched() {
    counter!(NOTIFICATIONS_DISPATCHED_TOTAL).increment(1);
}

#[inline]
pub fn record_notification_suppressed() {
    counter!(NOTIFICATIONS_SUPPRESSED_TOTAL).increment(1);
}

#[inline]
pub fn record_notification_failed() {
    counter!(NOTIFICATIONS_FAILED_TOTAL).increment(1);
}

#[inline]
pub fn update_endpoints_cached(count: usize) {
    gauge!(ENDPOINTS_CACHED).set(count as f64);
}
