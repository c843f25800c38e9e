//! Startup sequencing between the probe loops and the metrics listener.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;

use pingprom_core::error::{PingPromError, Result};

use crate::orchestrator::Orchestrator;

/// Bind the metrics listener once the loops are running.
///
/// On bind failure the loops are stopped (within `grace`) before the
/// `Listener` error is returned, so a failed startup leaves nothing behind.
pub async fn bind_or_shutdown(
    listen: SocketAddr,
    orchestrator: Orchestrator,
    grace: Duration,
) -> Result<(TcpListener, Orchestrator)> {
    match TcpListener::bind(listen).await {
        Ok(listener) => Ok((listener, orchestrator)),
        Err(source) => {
            tracing::error!(%listen, error = %source, "metrics listener bind failed");
            let stopped = orchestrator.shutdown(grace).await;
            tracing::info!(stopped, "probe loops stopped after bind failure");
            Err(PingPromError::Listener {
                addr: listen.to_string(),
                source,
            })
        }
    }
}
