//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): façade requests by route, status
//! - `relay_request_duration_seconds` (histogram): façade latency by route
//! - `relay_rpc_attempts_total` (counter): failover attempts by outcome
//! - `relay_endpoint_rotations_total` (counter): pool cursor advances
//! - `relay_broadcasts_total` (counter): broadcasts by result
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op, so tests need no setup
//! - Labels are low-cardinality: route, status, outcome, result

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => {
            ::metrics::describe_counter!("relay_requests_total", "Façade requests by route and status");
            ::metrics::describe_histogram!("relay_request_duration_seconds", "Façade request latency");
            ::metrics::describe_counter!("relay_rpc_attempts_total", "Failover attempts by outcome");
            ::metrics::describe_counter!("relay_endpoint_rotations_total", "Endpoint pool rotations");
            ::metrics::describe_counter!("relay_broadcasts_total", "Transaction broadcasts by result");
            tracing::info!(address = %addr, "Metrics endpoint listening");
        }
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics recorder"),
    }
}

/// Record a completed façade request.
pub fn record_request(route: &str, status: u16, start: Instant) {
    ::metrics::counter!(
        "relay_requests_total",
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!("relay_request_duration_seconds", "route" => route.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Record one failover attempt (`success` or the error class).
pub fn record_attempt(outcome: &str) {
    ::metrics::counter!("relay_rpc_attempts_total", "outcome" => outcome.to_string()).increment(1);
}

/// Record an endpoint rotation.
pub fn record_rotation() {
    ::metrics::counter!("relay_endpoint_rotations_total").increment(1);
}

/// Record a broadcast outcome (`included`, `failed`, `rejected`, `resumed`).
pub fn record_broadcast(result: &str) {
    ::metrics::counter!("relay_broadcasts_total", "result" => result.to_string()).increment(1);
}
