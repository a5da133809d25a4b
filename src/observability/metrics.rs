//! Metrics collection and exposition.
//!
//! # Metrics
//! - `resilience_breaker_transitions_total` (counter): by circuit, from, to
//! - `resilience_breaker_rejections_total` (counter): fast-failed calls by
//!   circuit
//! - `resilience_endpoint_health` (gauge): 1=healthy, 0=unhealthy, by
//!   service and endpoint
//! - `resilience_attempts_total` (counter): per-attempt outcomes by
//!   service, endpoint and result
//!
//! # Design Decisions
//! - Free functions over the `metrics` facade, so the embedding service
//!   picks the recorder; `init_metrics` installs the Prometheus exporter
//!   for services that want the batteries included
//! - Metric updates are cheap enough to call from locked sections

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

use crate::breaker::CircuitState;

/// Install the Prometheus exporter listening on `addr`.
///
/// Optional: embedding services with their own recorder skip this and the
/// facade routes the same metrics there.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => {
            tracing::info!(address = %addr, "metrics exporter listening");
        }
        Err(error) => {
            tracing::error!(error = %error, "failed to install metrics exporter");
        }
    }
}

/// Count a breaker state transition.
pub fn record_breaker_transition(circuit: &str, from: CircuitState, to: CircuitState) {
    counter!(
        "resilience_breaker_transitions_total",
        "circuit" => circuit.to_string(),
        "from" => from.as_str(),
        "to" => to.as_str()
    )
    .increment(1);
}

/// Count a call rejected by an open (or trial-saturated) breaker.
pub fn record_breaker_rejection(circuit: &str) {
    counter!(
        "resilience_breaker_rejections_total",
        "circuit" => circuit.to_string()
    )
    .increment(1);
}

/// Record an endpoint health flip.
pub fn record_endpoint_health(service: &str, endpoint: &str, healthy: bool) {
    gauge!(
        "resilience_endpoint_health",
        "service" => service.to_string(),
        "endpoint" => endpoint.to_string()
    )
    .set(if healthy { 1.0 } else { 0.0 });
}

/// Count one executor attempt outcome.
pub fn record_attempt(service: &str, endpoint: &str, success: bool) {
    counter!(
        "resilience_attempts_total",
        "service" => service.to_string(),
        "endpoint" => endpoint.to_string(),
        "result" => if success { "success" } else { "failure" }
    )
    .increment(1);
}
