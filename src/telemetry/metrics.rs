//! Prometheus metrics
//!
//! Recorded through the `metrics` facade; without an installed exporter
//! every call is a no-op.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

/// Counter metric types
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Ticks processed
    Ticks,
    /// Venue calls that failed
    ExecutionFailures,
}

/// Start the Prometheus HTTP exporter
pub fn init_metrics(addr: SocketAddr) -> anyhow::Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to start metrics exporter on {}: {}", addr, e))?;
    tracing::info!(%addr, "Prometheus metrics exporter started");
    Ok(())
}

/// Increment a plain counter
pub fn increment(metric: CounterMetric) {
    let name = match metric {
        CounterMetric::Ticks => "tickfit_ticks_total",
        CounterMetric::ExecutionFailures => "tickfit_execution_failures_total",
    };
    metrics::counter!(name).increment(1);
}

/// Count an actionable verdict
pub fn record_verdict(side: &'static str) {
    metrics::counter!("tickfit_verdicts_total", "side" => side).increment(1);
}

/// Count an open refused by a gate
pub fn record_gate_rejection(gate: &'static str) {
    metrics::counter!("tickfit_gate_rejections_total", "gate" => gate).increment(1);
}

/// Count an order lifecycle event
pub fn record_order(event: &'static str) {
    metrics::counter!("tickfit_orders_total", "event" => event).increment(1);
}

/// Set whether a position is open
pub fn set_position_active(active: bool) {
    metrics::gauge!("tickfit_position_active").set(if active { 1.0 } else { 0.0 });
}

/// Record per-tick processing latency
pub fn record_tick_latency(duration: Duration) {
    metrics::histogram!("tickfit_tick_latency_us").record(duration.as_secs_f64() * 1e6);
}
