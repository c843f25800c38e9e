//! ICMP echo transport.
//!
//! Resolves the target once at setup, then reuses one pinger on a `surge-ping`
//! client shared by every target of the same address family.

use std::net::IpAddr;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use surge_ping::{Client, Config, PingIdentifier, PingSequence, Pinger, SurgeError, ICMP};
use thiserror::Error;
use tokio::sync::OnceCell;

use pingprom_core::error::{PingPromError, Result};
use pingprom_core::Target;

use super::transport::{Connector, EchoOutcome, EchoTransport};

#[derive(Debug, Error)]
enum SetupError {
    #[error("resolve failed: {0}")]
    Resolve(#[source] std::io::Error),
    #[error("no addresses found")]
    NoAddress,
    #[error("icmp socket: {0}")]
    Socket(#[source] std::io::Error),
}

/// Resolve hostname to IP address.
async fn resolve_host(host: &str) -> std::result::Result<IpAddr, SetupError> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(ip);
    }

    let mut addrs = tokio::net::lookup_host(format!("{host}:0"))
        .await
        .map_err(SetupError::Resolve)?;
    addrs.next().map(|addr| addr.ip()).ok_or(SetupError::NoAddress)
}

/// Creates [`IcmpTransport`]s with shared probe settings.
///
/// One `surge-ping` client (socket plus reply dispatcher) is opened lazily per
/// ICMP kind and shared by every pinger, so raw sockets do not each receive a
/// copy of every reply.
pub struct IcmpConnector {
    timeout: Duration,
    payload_size: usize,
    v4: OnceCell<Client>,
    v6: OnceCell<Client>,
}

impl IcmpConnector {
    pub fn new(timeout: Duration, payload_size: usize) -> Self {
        Self {
            timeout,
            payload_size,
            v4: OnceCell::new(),
            v6: OnceCell::new(),
        }
    }

    /// Shared client for the address family of `ip`, opened on first use.
    async fn client(&self, ip: IpAddr) -> std::result::Result<&Client, SetupError> {
        let (cell, kind) = match ip {
            IpAddr::V4(_) => (&self.v4, ICMP::V4),
            IpAddr::V6(_) => (&self.v6, ICMP::V6),
        };
        cell.get_or_try_init(|| async {
            let client = Client::new(&Config::builder().kind(kind).build())
                .map_err(SetupError::Socket)?;
            tracing::debug!(ipv6 = ip.is_ipv6(), "icmp client opened");
            Ok(client)
        })
        .await
    }

    async fn open(&self, target: &Target) -> std::result::Result<IcmpTransport, SetupError> {
        let ip = resolve_host(target.as_str()).await?;
        let client = self.client(ip).await?.clone();

        let mut pinger = client.pinger(ip, PingIdentifier(rand::random())).await;
        pinger.timeout(self.timeout);
        tracing::debug!(addr = %target, %ip, "icmp transport ready");

        Ok(IcmpTransport {
            target: target.clone(),
            _client: client,
            pinger,
            payload: vec![0; self.payload_size],
        })
    }
}

#[async_trait]
impl Connector for IcmpConnector {
    async fn connect(&self, target: &Target) -> Result<Box<dyn EchoTransport>> {
        let transport = self.open(target).await.map_err(|e| PingPromError::Setup {
            target: target.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Box::new(transport))
    }
}

/// ICMP echo channel to one resolved address.
pub struct IcmpTransport {
    target: Target,
    // Keeps the shared reply dispatcher alive while this pinger is in use.
    _client: Client,
    pinger: Pinger,
    payload: Vec<u8>,
}

#[async_trait]
impl EchoTransport for IcmpTransport {
    async fn echo(&mut self, seq: u16) -> EchoOutcome {
        let started = Instant::now();
        match self.pinger.ping(PingSequence(seq), &self.payload).await {
            Ok((_, rtt)) => EchoOutcome::Reply(rtt),
            Err(SurgeError::Timeout { .. }) => {
                tracing::trace!(addr = %self.target, seq, "echo timed out");
                EchoOutcome::Lost
            }
            Err(e) => {
                tracing::debug!(
                    addr = %self.target,
                    seq,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    error = %e,
                    "echo failed"
                );
                EchoOutcome::Lost
            }
        }
    }
}
