//! In-process probe metrics.
//!
//! Aggregates live in a sharded map keyed by target and are rendered in the
//! Prometheus text format by the `/metrics` handler.

pub mod metrics;

pub use metrics::{
    HistogramSnapshot, MetricsRegistry, Snapshot, TargetSnapshot, RTT_BUCKETS_SECONDS,
};
