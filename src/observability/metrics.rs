//! Metrics collection and exposition.
//!
//! # Metrics
//! - `graft_requests_total` (counter): requests by method, status
//! - `graft_request_duration_seconds` (histogram): latency distribution
//! - `graft_dispatch_outcomes_total` (counter): dispatcher terminal states
//! - `graft_apphook_binding_lookups_total` (counter): apphook → page lookups
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Exposition is a separate Prometheus listener, off by default

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one served HTTP request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    let method = method.to_string();
    let status = status.to_string();
    ::metrics::counter!(
        "graft_requests_total",
        "method" => method.clone(),
        "status" => status.clone()
    )
    .increment(1);
    ::metrics::histogram!(
        "graft_request_duration_seconds",
        "method" => method,
        "status" => status
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record the terminal state reached by the dispatcher.
pub fn record_dispatch(outcome: &'static str) {
    ::metrics::counter!("graft_dispatch_outcomes_total", "outcome" => outcome).increment(1);
}

/// Record an uncached apphook binding lookup.
pub fn record_binding_lookup(apphook: &str, found: bool) {
    let result = if found { "bound" } else { "unbound" };
    ::metrics::counter!(
        "graft_apphook_binding_lookups_total",
        "apphook" => apphook.to_string(),
        "result" => result
    )
    .increment(1);
}
