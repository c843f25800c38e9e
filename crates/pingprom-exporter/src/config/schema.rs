use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use serde::Deserialize;
use pingprom_core::error::{PingPromError, Result};
use pingprom_core::Target;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExporterConfig {
    pub version: u32,

    #[serde(default)]
    pub exporter: ExporterSection,

    #[serde(default)]
    pub probe: ProbeSection,

    #[serde(default)]
    pub targets: Vec<String>,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            version: 1,
            exporter: ExporterSection::default(),
            probe: ProbeSection::default(),
            targets: Vec::new(),
        }
    }
}

impl ExporterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(PingPromError::UnsupportedVersion);
        }

        self.exporter.validate()?;
        self.probe.validate()?;

        let mut seen = HashSet::new();
        for t in &self.targets {
            let t = t.trim();
            if t.is_empty() {
                return Err(PingPromError::Config("targets must not contain blank entries".into()));
            }
            if !seen.insert(t) {
                return Err(PingPromError::Config(format!("duplicate target: {t}")));
            }
        }

        Ok(())
    }

    /// Layer command-line values over this config and re-validate.
    ///
    /// `bind`/`port` replace the file values when present; targets are
    /// appended after the file's own, so duplicates across both are rejected.
    pub fn apply_overrides(&mut self, overrides: Overrides) -> Result<()> {
        if let Some(bind) = overrides.bind {
            self.exporter.bind = bind;
        }
        if let Some(port) = overrides.port {
            self.exporter.port = port;
        }
        self.targets.extend(overrides.targets);
        self.validate()
    }

    /// Configured targets in declaration order.
    pub fn targets(&self) -> Vec<Target> {
        self.targets.iter().map(|t| Target::new(t.trim())).collect()
    }
}

/// Values supplied on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub bind: Option<String>,
    pub port: Option<u16>,
    pub targets: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExporterSection {
    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ExporterSection {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

impl ExporterSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr().map(|_| ())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self.bind.parse().map_err(|_| {
            PingPromError::Config(format!("exporter.bind must be an IP address: {}", self.bind))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// What to do when a target cannot be prepared for probing at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupFailure {
    /// Fail startup; the process exits non-zero.
    #[default]
    Abort,
    /// Log the failure and keep probing the remaining targets.
    Skip,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProbeSection {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_payload_size")]
    pub payload_size: usize,

    #[serde(default)]
    pub setup_failure: SetupFailure,

    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
}

impl Default for ProbeSection {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            timeout_ms: default_timeout_ms(),
            payload_size: default_payload_size(),
            setup_failure: SetupFailure::default(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
        }
    }
}

impl ProbeSection {
    pub fn validate(&self) -> Result<()> {
        if !(100..=60000).contains(&self.interval_ms) {
            return Err(PingPromError::Config(
                "probe.interval_ms must be between 100 and 60000".into(),
            ));
        }
        if self.timeout_ms == 0 || self.timeout_ms > self.interval_ms {
            return Err(PingPromError::Config(
                "probe.timeout_ms must be between 1 and interval_ms".into(),
            ));
        }
        if self.payload_size > 1400 {
            return Err(PingPromError::Config(
                "probe.payload_size must be at most 1400".into(),
            ));
        }
        if self.shutdown_grace_ms > 60000 {
            return Err(PingPromError::Config(
                "probe.shutdown_grace_ms must be at most 60000".into(),
            ));
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

fn default_bind() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    2112
}
fn default_interval_ms() -> u64 {
    1000
}
fn default_timeout_ms() -> u64 {
    1000
}
fn default_payload_size() -> usize {
    56
}
fn default_shutdown_grace_ms() -> u64 {
    5000
}
