//! Metrics collection and exposition.
//!
//! # Metrics
//! - `bridge_requests_total` (counter): request cycles by outcome
//! - `bridge_request_duration_seconds` (histogram): latency by outcome
//! - `bridge_messages_total` (counter): WebSocket text messages by direction
//! - `bridge_discarded_replies_total` (counter): stale messages dropped
//! - `bridge_session_state` (gauge): 0=connecting 1=open 2=closed 3=errored
//!
//! Without an installed exporter the macros are no-ops.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::upstream::SessionState;

/// Install the Prometheus exporter with an HTTP scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record a finished HTTP request.
pub fn record_request(outcome: &'static str, start: Instant) {
    counter!("bridge_requests_total", "outcome" => outcome).increment(1);
    histogram!("bridge_request_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

/// Record a WebSocket text message (`inbound` or `outbound`).
pub fn record_message(direction: &'static str) {
    counter!("bridge_messages_total", "direction" => direction).increment(1);
}

pub fn record_discarded_reply() {
    counter!("bridge_discarded_replies_total").increment(1);
}

pub fn record_session_state(state: SessionState) {
    gauge!("bridge_session_state").set(state as u8 as f64);
}
