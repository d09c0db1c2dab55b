//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_tx_total` (counter): pipeline calls by `outcome`
//! - `relay_tx_duration_seconds` (histogram): end-to-end pipeline latency
//! - `relay_node_requests_total` (counter): node calls by `op`, `status`
//! - `relay_node_healthy` (gauge): 1=reachable, 0=unreachable
//! - `relay_session_resyncs_total` (counter): account re-fetches after drift
//!
//! Recording is a no-op until a recorder is installed.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_tx(outcome: &'static str, start: Instant) {
    ::metrics::counter!("relay_tx_total", "outcome" => outcome).increment(1);
    ::metrics::histogram!("relay_tx_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_node_request(op: &'static str, ok: bool) {
    let status = if ok { "ok" } else { "error" };
    ::metrics::counter!("relay_node_requests_total", "op" => op, "status" => status).increment(1);
}

pub fn record_node_health(healthy: bool) {
    ::metrics::gauge!("relay_node_healthy").set(if healthy { 1.0 } else { 0.0 });
}

pub fn record_session_resync() {
    ::metrics::counter!("relay_session_resyncs_total").increment(1);
}
