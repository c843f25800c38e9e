//! Probe module exports.
//!
//! - [`EchoTransport`] / [`Connector`]: the echo capability a loop drives
//! - [`IcmpConnector`]: ICMP implementation on top of `surge-ping`
//! - [`ProbeLoop`]: per-target send/receive cycle emitting lifecycle events

pub mod icmp;
pub mod runner;
pub mod transport;

pub use icmp::{IcmpConnector, IcmpTransport};
pub use runner::ProbeLoop;
pub use transport::{Connector, EchoOutcome, EchoTransport};
