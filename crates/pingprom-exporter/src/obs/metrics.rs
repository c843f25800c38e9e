//! Per-target probe aggregates and their Prometheus rendering.
//!
//! The registry maps each target to an `Arc<Aggregate>` inside a `DashMap`, so
//! updates for unrelated targets never contend on the same lock. `sent` is a
//! plain atomic; `recv` lives next to the latency histogram under one small
//! per-target mutex so a snapshot always sees `recv == rtt.count`.

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use dashmap::DashMap;
use pingprom_core::error::Result;
use pingprom_core::{ProbeEvent, ProbeSink, Target};

/// Histogram upper bounds in seconds (`+Inf` is implicit).
pub const RTT_BUCKETS_SECONDS: [f64; 11] =
    [0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

const SENT_NAME: &str = "ping_packets_sent_total";
const RECV_NAME: &str = "ping_packets_recv_total";
const RTT_NAME: &str = "ping_packets_rtt_seconds";

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

#[derive(Default)]
struct LatencyState {
    recv: u64,
    sum: f64,
    // Non-cumulative; the last slot is the +Inf overflow bucket.
    buckets: [u64; RTT_BUCKETS_SECONDS.len() + 1],
}

impl LatencyState {
    fn record(&mut self, secs: f64) {
        let idx = RTT_BUCKETS_SECONDS.partition_point(|&le| le < secs);
        self.buckets[idx] += 1;
        self.recv += 1;
        self.sum += secs;
    }
}

#[derive(Default)]
struct Aggregate {
    sent: AtomicU64,
    latency: Mutex<LatencyState>,
}

impl Aggregate {
    fn latency(&self) -> MutexGuard<'_, LatencyState> {
        // A poisoned lock only means a writer panicked mid-increment; the counts are still usable.
        self.latency.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn snapshot(&self, target: Target) -> TargetSnapshot {
        // Read recv before sent: a Received always follows its Sent, so recv <= sent holds here.
        let (recv, rtt) = {
            let l = self.latency();
            let mut cumulative = 0;
            let buckets = RTT_BUCKETS_SECONDS
                .iter()
                .zip(l.buckets.iter())
                .map(|(&le, &n)| {
                    cumulative += n;
                    (le, cumulative)
                })
                .collect();
            (l.recv, HistogramSnapshot { buckets, count: l.recv, sum: l.sum })
        };
        let sent = self.sent.load(Ordering::Acquire);
        TargetSnapshot { target, sent, recv, rtt }
    }
}

/// Point-in-time copy of one target's histogram. Buckets are cumulative.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSnapshot {
    pub buckets: Vec<(f64, u64)>,
    pub count: u64,
    pub sum: f64,
}

/// Point-in-time copy of one target's aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetSnapshot {
    pub target: Target,
    pub sent: u64,
    pub recv: u64,
    pub rtt: HistogramSnapshot,
}

/// Point-in-time copy of every known aggregate, sorted by target.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub targets: Vec<TargetSnapshot>,
}

impl Snapshot {
    pub fn get(&self, target: &str) -> Option<&TargetSnapshot> {
        self.targets.iter().find(|t| t.target.as_str() == target)
    }

    /// Render in Prometheus text exposition format (version 0.0.4).
    pub fn render(&self) -> Result<String> {
        let mut out = String::new();

        writeln!(out, "# HELP {SENT_NAME} Total number of packets sent")?;
        writeln!(out, "# TYPE {SENT_NAME} counter")?;
        for t in &self.targets {
            let label = escape_label(t.target.as_str());
            writeln!(out, "{SENT_NAME}{{target=\"{label}\"}} {}", t.sent)?;
        }

        writeln!(out, "# HELP {RECV_NAME} Total number of packets received")?;
        writeln!(out, "# TYPE {RECV_NAME} counter")?;
        for t in &self.targets {
            let label = escape_label(t.target.as_str());
            writeln!(out, "{RECV_NAME}{{target=\"{label}\"}} {}", t.recv)?;
        }

        writeln!(out, "# HELP {RTT_NAME} Round trip time in seconds")?;
        writeln!(out, "# TYPE {RTT_NAME} histogram")?;
        for t in &self.targets {
            let label = escape_label(t.target.as_str());
            for (le, count) in &t.rtt.buckets {
                writeln!(out, "{RTT_NAME}_bucket{{target=\"{label}\",le=\"{le}\"}} {count}")?;
            }
            writeln!(out, "{RTT_NAME}_bucket{{target=\"{label}\",le=\"+Inf\"}} {}", t.rtt.count)?;
            writeln!(out, "{RTT_NAME}_sum{{target=\"{label}\"}} {}", t.rtt.sum)?;
            writeln!(out, "{RTT_NAME}_count{{target=\"{label}\"}} {}", t.rtt.count)?;
        }

        Ok(out)
    }
}

/// Process-wide probe aggregates.
///
/// Construct once before any probe loop starts and share via `Arc`. State is
/// reachable only through [`MetricsRegistry::observe`] and
/// [`MetricsRegistry::snapshot`].
#[derive(Default)]
pub struct MetricsRegistry {
    targets: DashMap<Target, Arc<Aggregate>>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lookup-or-create; the shard lock is released before the caller touches the aggregate.
    fn aggregate(&self, target: &Target) -> Arc<Aggregate> {
        if let Some(agg) = self.targets.get(target.as_str()) {
            return Arc::clone(agg.value());
        }
        Arc::clone(self.targets.entry(target.clone()).or_default().value())
    }

    /// Accumulate one lifecycle event.
    pub fn observe(&self, event: ProbeEvent) {
        match event {
            ProbeEvent::Setup(target) => {
                self.aggregate(&target);
            }
            ProbeEvent::Sent(target) => {
                self.aggregate(&target).sent.fetch_add(1, Ordering::Release);
            }
            ProbeEvent::Received(target, rtt) => {
                self.aggregate(&target).latency().record(rtt.as_secs_f64());
            }
        }
    }

    /// Consistent copy of every known aggregate.
    pub fn snapshot(&self) -> Snapshot {
        let entries: Vec<(Target, Arc<Aggregate>)> = self
            .targets
            .iter()
            .map(|r| (r.key().clone(), Arc::clone(r.value())))
            .collect();

        let mut targets: Vec<TargetSnapshot> = entries
            .into_iter()
            .map(|(target, agg)| agg.snapshot(target))
            .collect();
        targets.sort_by(|a, b| a.target.cmp(&b.target));

        Snapshot { targets }
    }

    /// Number of targets with an aggregate.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

impl ProbeSink for MetricsRegistry {
    fn observe(&self, event: ProbeEvent) {
        MetricsRegistry::observe(self, event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_boundaries_are_inclusive() {
        let mut l = LatencyState::default();
        l.record(0.005);
        l.record(0.0051);
        l.record(42.0);
        assert_eq!(l.buckets[0], 1);
        assert_eq!(l.buckets[1], 1);
        assert_eq!(l.buckets[RTT_BUCKETS_SECONDS.len()], 1);
        assert_eq!(l.recv, 3);
    }

    #[test]
    fn label_values_are_escaped() {
        assert_eq!(escape_label("a\"b\\c\nd"), "a\\\"b\\\\c\\nd");
    }
}
