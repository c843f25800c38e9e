//! Per-target probe loop.
//!
//! Emits `Setup` once, then `Sent` for every transmitted request and
//! `Received` for every reply. Lost probes produce no event of their own.
//! Cancellation interrupts both the reply wait and the inter-probe sleep.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use pingprom_core::{ProbeEvent, ProbeSink, Target};

use super::transport::{EchoOutcome, EchoTransport};

pub struct ProbeLoop {
    target: Target,
    transport: Box<dyn EchoTransport>,
    sink: Arc<dyn ProbeSink>,
    interval: Duration,
    cancel: CancellationToken,
}

impl ProbeLoop {
    pub fn new(
        target: Target,
        transport: Box<dyn EchoTransport>,
        sink: Arc<dyn ProbeSink>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            target,
            transport,
            sink,
            interval,
            cancel,
        }
    }

    /// Run until the token is cancelled. Returns the number of probes sent.
    pub async fn run(mut self) -> u64 {
        self.sink.observe(ProbeEvent::Setup(self.target.clone()));
        tracing::info!(
            addr = %self.target,
            interval_ms = self.interval.as_millis() as u64,
            "probe loop started"
        );

        let mut seq: u16 = 0;
        let mut sent: u64 = 0;

        while !self.cancel.is_cancelled() {
            let started = Instant::now();
            self.sink.observe(ProbeEvent::Sent(self.target.clone()));
            sent += 1;

            let outcome = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                outcome = self.transport.echo(seq) => outcome,
            };

            match outcome {
                EchoOutcome::Reply(rtt) => {
                    let rtt_ms = rtt.as_secs_f64() * 1000.0;
                    tracing::trace!(addr = %self.target, seq, rtt_ms, "reply");
                    self.sink.observe(ProbeEvent::Received(self.target.clone(), rtt));
                }
                EchoOutcome::Lost => {
                    tracing::debug!(addr = %self.target, seq, "no reply");
                }
            }

            seq = seq.wrapping_add(1);

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep_until(started + self.interval) => {}
            }
        }

        tracing::info!(addr = %self.target, sent, "probe loop stopped");
        sent
    }
}
