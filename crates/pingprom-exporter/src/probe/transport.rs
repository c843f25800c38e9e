use std::time::Duration;

use async_trait::async_trait;

use pingprom_core::error::Result;
use pingprom_core::Target;

/// Result of one echo exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchoOutcome {
    /// Reply received after the measured round-trip time.
    Reply(Duration),
    /// No reply within the timeout, or the request could not be sent.
    Lost,
}

/// One target's echo channel. Transient failures are folded into [`EchoOutcome::Lost`].
#[async_trait]
pub trait EchoTransport: Send {
    /// Transmit one request with `seq` and wait for its reply or the timeout.
    async fn echo(&mut self, seq: u16) -> EchoOutcome;
}

/// Builds a transport for a target. Errors here are setup failures.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, target: &Target) -> Result<Box<dyn EchoTransport>>;
}
