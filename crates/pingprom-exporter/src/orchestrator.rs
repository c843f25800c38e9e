//! Probe fan-out and shared cancellation.
//!
//! Every target is connected before any loop is spawned, so an aborted startup
//! never leaves half the loops running. The orchestrator owns the only
//! cancellation token that can stop them; callers get child tokens to watch.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use futures_util::stream::FuturesUnordered;
use futures_util::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use pingprom_core::error::Result;
use pingprom_core::{ProbeSink, Target};

use crate::config::{ProbeSection, SetupFailure};
use crate::probe::{Connector, ProbeLoop};

pub struct Orchestrator {
    cancel: CancellationToken,
    loops: Vec<(Target, JoinHandle<u64>)>,
    failed: Vec<Target>,
}

impl Orchestrator {
    /// Connect every target and spawn one probe loop per target.
    ///
    /// Under [`SetupFailure::Abort`] the first setup error is returned and
    /// nothing is spawned. Under [`SetupFailure::Skip`] failed targets are
    /// logged and left out.
    pub async fn start(
        targets: &[Target],
        probe: &ProbeSection,
        connector: &dyn Connector,
        sink: Arc<dyn ProbeSink>,
    ) -> Result<Self> {
        let connected = join_all(targets.iter().map(|t| connector.connect(t))).await;

        let mut ready = Vec::with_capacity(targets.len());
        let mut failed = Vec::new();
        for (target, res) in targets.iter().zip(connected) {
            match res {
                Ok(transport) => ready.push((target.clone(), transport)),
                Err(e) => match probe.setup_failure {
                    SetupFailure::Abort => {
                        tracing::error!(
                            addr = %target,
                            code = e.code().as_str(),
                            error = %e,
                            "probe setup failed"
                        );
                        return Err(e);
                    }
                    SetupFailure::Skip => {
                        tracing::error!(
                            addr = %target,
                            code = e.code().as_str(),
                            error = %e,
                            "probe setup failed, skipping target"
                        );
                        failed.push(target.clone());
                    }
                },
            }
        }

        let cancel = CancellationToken::new();
        let loops = ready
            .into_iter()
            .map(|(target, transport)| {
                let probe_loop = ProbeLoop::new(
                    target.clone(),
                    transport,
                    Arc::clone(&sink),
                    probe.interval(),
                    cancel.clone(),
                );
                (target, tokio::spawn(probe_loop.run()))
            })
            .collect::<Vec<_>>();

        tracing::info!(running = loops.len(), skipped = failed.len(), "probe loops spawned");
        Ok(Self { cancel, loops, failed })
    }

    /// Targets whose loop is running.
    pub fn targets(&self) -> Vec<Target> {
        self.loops.iter().map(|(t, _)| t.clone()).collect()
    }

    /// Targets left out because their setup failed.
    pub fn failed(&self) -> &[Target] {
        &self.failed
    }

    /// Token that observes (but cannot trigger) shutdown.
    pub fn watch(&self) -> CancellationToken {
        self.cancel.child_token()
    }

    /// Cancel every loop and wait up to `grace` for them to stop; stragglers
    /// are aborted. Returns how many loops stopped on their own.
    pub async fn shutdown(self, grace: Duration) -> usize {
        self.cancel.cancel();

        let aborts: Vec<_> = self.loops.iter().map(|(_, h)| h.abort_handle()).collect();
        let total = self.loops.len();

        let mut futs: FuturesUnordered<_> = self
            .loops
            .into_iter()
            .map(|(target, handle)| async move { (target, handle.await) })
            .collect();

        let mut stopped = 0;
        let drained = timeout(grace, async {
            while let Some((target, res)) = futs.next().await {
                match res {
                    Ok(sent) => tracing::debug!(addr = %target, sent, "probe loop joined"),
                    Err(e) => {
                        tracing::warn!(addr = %target, error = %e, "probe loop ended abnormally")
                    }
                }
                stopped += 1;
            }
        })
        .await;

        if drained.is_err() {
            tracing::warn!(
                pending = total - stopped,
                grace_ms = grace.as_millis() as u64,
                "aborting probe loops after grace period"
            );
            for a in aborts {
                a.abort();
            }
        }

        stopped
    }
}
