//! Telemetry module
//!
//! Structured logging and Prometheus metrics

mod logging;
mod metrics;

pub use self::logging::{init_logging, LogFormat};
pub use self::metrics::{
    increment, init_metrics, record_gate_rejection, record_order, record_tick_latency,
    record_verdict, set_position_active, CounterMetric,
};

use crate::config::TelemetryConfig;
use std::net::{Ipv4Addr, SocketAddr};

/// Initialize logging and, when a port is configured, the metrics exporter
pub fn init_telemetry(config: &TelemetryConfig) -> anyhow::Result<()> {
    init_logging(&config.log_level, config.format)?;

    if let Some(port) = config.metrics_port {
        init_metrics(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)))?;
    }

    Ok(())
}
