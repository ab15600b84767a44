//! Prometheus metrics

use crate::ledger::AuditRecord;
use rust_decimal::prelude::ToPrimitive;
use std::net::SocketAddr;
use std::time::Duration;

/// Counter of revealed raw bars
pub const STEPS_TOTAL: &str = "sandbox_steps_total";
/// Counter of agent actions, labelled by requested and applied action
pub const ACTIONS_TOTAL: &str = "sandbox_actions_total";
/// Gauge of the current mark-to-market portfolio value
pub const EQUITY: &str = "sandbox_equity";
/// Gauge of units held
pub const HOLDINGS: &str = "sandbox_holdings";
/// Histogram of per-step processing time in microseconds
pub const STEP_LATENCY_US: &str = "sandbox_step_latency_us";

/// Serve metrics over HTTP on `port`
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to start metrics exporter: {}", e))?;
    tracing::info!(%addr, "Prometheus metrics exporter listening");
    Ok(())
}

/// Record one completed simulation step
pub fn record_step(record: &AuditRecord, elapsed: Duration) {
    metrics::counter!(STEPS_TOTAL).increment(1);
    metrics::counter!(
        ACTIONS_TOTAL,
        "requested" => record.requested.as_str(),
        "applied" => record.applied.as_str()
    )
    .increment(1);
    metrics::gauge!(EQUITY).set(record.equity().to_f64().unwrap_or_default());
    metrics::gauge!(HOLDINGS).set(record.holdings as f64);
    metrics::histogram!(STEP_LATENCY_US).record(elapsed.as_secs_f64() * 1e6);
}
