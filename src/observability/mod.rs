//! Metrics surface.
//!
//! Structured logs come from `tracing` at the call sites; this module owns
//! the Prometheus exporter and the handful of counters the service emits.

pub mod metrics;

pub use metrics::init_metrics;
