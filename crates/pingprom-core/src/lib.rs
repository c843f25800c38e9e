//! pingprom core: transport-agnostic probe primitives and the shared error type.
//!
//! This crate defines the contract between probe loops and whatever consumes
//! their lifecycle events (the metrics registry in the exporter, fakes in tests).
//! It carries no runtime or network dependencies.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. All fallible paths
//! surface as `PingPromError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod event;

/// Shared result type.
pub use error::{ErrorCode, PingPromError, Result};
pub use event::{ProbeEvent, ProbeSink, Target};
