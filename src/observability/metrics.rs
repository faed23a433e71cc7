//! Metrics collection and exposition.
//!
//! # Metrics
//! - `searchgate_requests_total` (counter): requests by terminal outcome
//!   (relayed, challenged, denied, exhausted, body_too_large)
//! - `searchgate_forward_attempts_total` (counter): per-node attempts by
//!   result
//! - `searchgate_node_available` (gauge): 1=available, 0=unavailable

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and scrape endpoint.
///
/// Failures are logged, not fatal: the proxy serves traffic without
/// metrics rather than refusing to start.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Count one request reaching a terminal outcome.
pub fn record_request(outcome: &str) {
    metrics::counter!("searchgate_requests_total", "outcome" => outcome.to_string()).increment(1);
}

/// Count one forward attempt against a node.
pub fn record_forward_attempt(node: &str, success: bool) {
    let result = if success { "success" } else { "failure" };
    metrics::counter!(
        "searchgate_forward_attempts_total",
        "node" => node.to_string(),
        "result" => result,
    )
    .increment(1);
}

/// Publish a node's availability state.
pub fn record_node_availability(node: &str, available: bool) {
    let value = if available { 1.0 } else { 0.0 };
    metrics::gauge!("searchgate_node_available", "node" => node.to_string()).set(value);
}
