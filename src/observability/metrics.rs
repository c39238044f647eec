//! Metrics collection and exposition.
//!
//! # Metrics
//! - `api_requests_total` (counter): requests by method, status
//! - `api_request_duration_seconds` (histogram): latency distribution
//! - `api_bootstrap_total` (counter): pipeline builds by outcome
//! - `api_bootstrap_duration_seconds` (histogram): time spent building the pipeline
//! - `api_handler_failures_total` (counter): unhandled handler errors by kind
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Start the Prometheus scrape endpoint on `addr`. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, started: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
    ];
    metrics::counter!("api_requests_total", &labels).increment(1);
    metrics::histogram!("api_request_duration_seconds", &labels)
        .record(started.elapsed().as_secs_f64());
}

/// `outcome` is `ok` or the failure kind.
pub fn record_bootstrap(outcome: &'static str, started: Instant) {
    metrics::counter!("api_bootstrap_total", "outcome" => outcome).increment(1);
    metrics::histogram!("api_bootstrap_duration_seconds", "outcome" => outcome)
        .record(started.elapsed().as_secs_f64());
}

pub fn record_handler_failure(kind: &'static str) {
    metrics::counter!("api_handler_failures_total", "kind" => kind).increment(1);
}
