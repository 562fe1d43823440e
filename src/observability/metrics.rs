//! Metrics collection and exposition.
//!
//! # Metrics
//! - `router_requests_total` (counter): requests by route, method, status
//! - `router_request_duration_seconds` (histogram): dispatch latency
//! - `router_reloads_total` (counter): reloads by outcome
//! - `router_active_routes` (gauge): routes in the published table
//!
//! Unmatched requests are recorded under route `none`.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint started");
    Ok(())
}

pub fn record_request(route: &str, method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "router_requests_total",
        "route" => route.to_string(),
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "router_request_duration_seconds",
        "route" => route.to_string(),
        "method" => method.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_reload(outcome: &'static str) {
    metrics::counter!("router_reloads_total", "outcome" => outcome).increment(1);
}

pub fn set_route_count(count: usize) {
    metrics::gauge!("router_active_routes").set(count as f64);
}
