//! Prometheus metrics.
//!
//! Recording is fire-and-forget; if no exporter was installed the macros
//! are no-ops, so library users who never call [`init_metrics`] pay nothing.

use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::routing::Method;

/// Install the Prometheus exporter on its own listener.
///
/// Failures are logged, not returned; the service runs fine without an
/// exporter.
pub fn init_metrics(address: std::net::SocketAddr) {
    match PrometheusBuilder::new()
        .with_http_listener(address)
        .install()
    {
        Ok(()) => tracing::info!(%address, "metrics exporter listening"),
        Err(error) => tracing::warn!(error = %error, "failed to install metrics exporter"),
    }
}

/// One pipeline dispatch: counted by method and status, timed by method.
pub(crate) fn record_dispatch(method: Method, status: u16, started: Instant) {
    counter!(
        "switchboard_dispatch_total",
        "method" => method.as_str(),
        "status" => status.to_string(),
    )
    .increment(1);
    histogram!(
        "switchboard_dispatch_duration_seconds",
        "method" => method.as_str(),
    )
    .record(started.elapsed().as_secs_f64());
}

/// One realtime envelope dispatched to its handler set.
pub(crate) fn record_event(kind: &str, outcome: &'static str) {
    counter!(
        "switchboard_events_total",
        "kind" => kind.to_string(),
        "outcome" => outcome,
    )
    .increment(1);
}

pub(crate) fn connection_opened() {
    gauge!("switchboard_realtime_connections").increment(1.0);
}

pub(crate) fn connection_closed() {
    gauge!("switchboard_realtime_connections").decrement(1.0);
}
