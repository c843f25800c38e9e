//! Probe targets, lifecycle events, and the sink they are delivered to.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// An opaque network address (IP literal or hostname) identifying one probe loop.
///
/// Immutable once configured; clones share the same allocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Target(Arc<str>);

impl Target {
    pub fn new(addr: impl AsRef<str>) -> Self {
        Self(Arc::from(addr.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Target {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Target {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Target {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

/// Lifecycle event emitted by a probe loop for its own target.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeEvent {
    /// The loop is ready; emitted once before any probe.
    Setup(Target),
    /// One echo request was transmitted.
    Sent(Target),
    /// A reply arrived after the given round-trip time.
    Received(Target, Duration),
}

impl ProbeEvent {
    pub fn target(&self) -> &Target {
        match self {
            ProbeEvent::Setup(t) | ProbeEvent::Sent(t) | ProbeEvent::Received(t, _) => t,
        }
    }
}

/// Consumer of probe lifecycle events.
///
/// Implementations must be safe to call concurrently from any number of loops
/// and must not block for long: loops call `observe` inline.
pub trait ProbeSink: Send + Sync {
    fn observe(&self, event: ProbeEvent);
}

impl<S: ProbeSink + ?Sized> ProbeSink for Arc<S> {
    fn observe(&self, event: ProbeEvent) {
        (**self).observe(event)
    }
}
