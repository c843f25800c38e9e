//! pingprom exporter library entry.
//!
//! Wires ICMP probe loops, the shared metrics registry, and the Prometheus
//! pull endpoint together. Consumed by the binary (`main.rs`) and by
//! integration tests.

pub mod app_state;
pub mod bootstrap;
pub mod config;
pub mod obs;
pub mod ops;
pub mod orchestrator;
pub mod probe;
pub mod router;
