//! Lightweight in-process metrics.
//!
//! Counters and a dispatch-latency histogram stored as atomics behind
//! `DashMap`, rendered in Prometheus text format on demand. Dropped and
//! unrouted frames land here instead of being raised as errors.

pub mod metrics;

pub use metrics::ClientMetrics;
