#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use pingprom_core::{ProbeEvent, Target};
use pingprom_exporter::obs::{MetricsRegistry, RTT_BUCKETS_SECONDS};

fn feed(reg: &MetricsRegistry, target: &str, sent: usize, recv: usize, rtt: Duration) {
    let t = Target::new(target);
    reg.observe(ProbeEvent::Setup(t.clone()));
    for i in 0..sent {
        reg.observe(ProbeEvent::Sent(t.clone()));
        if i < recv {
            reg.observe(ProbeEvent::Received(t.clone(), rtt));
        }
    }
}

#[test]
fn two_targets_end_to_end() {
    let reg = MetricsRegistry::new();
    feed(&reg, "10.0.0.1", 5, 4, Duration::from_millis(20));
    feed(&reg, "10.0.0.2", 3, 3, Duration::from_millis(3));

    let snap = reg.snapshot();
    assert_eq!(snap.targets.len(), 2);

    let a = snap.get("10.0.0.1").unwrap();
    assert_eq!((a.sent, a.recv, a.rtt.count), (5, 4, 4));
    assert!((a.rtt.sum - 0.08).abs() < 1e-9);

    let b = snap.get("10.0.0.2").unwrap();
    assert_eq!((b.sent, b.recv, b.rtt.count), (3, 3, 3));
}

#[test]
fn setup_creates_zeroed_aggregate() {
    let reg = MetricsRegistry::new();
    assert!(reg.snapshot().targets.is_empty());

    reg.observe(ProbeEvent::Setup(Target::new("192.0.2.1")));
    let snap = reg.snapshot();
    let t = snap.get("192.0.2.1").unwrap();
    assert_eq!((t.sent, t.recv, t.rtt.count), (0, 0, 0));
    assert!(t.rtt.buckets.iter().all(|(_, n)| *n == 0));
    assert_eq!(t.rtt.buckets.len(), RTT_BUCKETS_SECONDS.len());
}

#[test]
fn received_without_sent_is_accumulated_not_validated() {
    let reg = MetricsRegistry::new();
    reg.observe(ProbeEvent::Received(Target::new("late"), Duration::from_millis(1)));

    let snap = reg.snapshot();
    let t = snap.get("late").unwrap();
    assert_eq!((t.sent, t.recv), (0, 1));
}

#[test]
fn buckets_are_cumulative() {
    let reg = MetricsRegistry::new();
    let t = Target::new("h");
    for ms in [1, 7, 30, 300, 20_000] {
        reg.observe(ProbeEvent::Received(t.clone(), Duration::from_millis(ms)));
    }

    let snap = reg.snapshot();
    let h = &snap.get("h").unwrap().rtt;
    let le = |bound: f64| h.buckets.iter().find(|(b, _)| *b == bound).unwrap().1;
    assert_eq!(le(0.005), 1);
    assert_eq!(le(0.01), 2);
    assert_eq!(le(0.05), 3);
    assert_eq!(le(0.5), 4);
    assert_eq!(le(10.0), 4);
    assert_eq!(h.count, 5);
}

#[test]
fn snapshot_is_sorted_by_target() {
    let reg = MetricsRegistry::new();
    for t in ["c", "a", "b"] {
        reg.observe(ProbeEvent::Setup(Target::new(t)));
    }
    let names: Vec<_> = reg
        .snapshot()
        .targets
        .iter()
        .map(|t| t.target.to_string())
        .collect();
    assert_eq!(names, ["a", "b", "c"]);
}

#[test]
fn concurrent_loops_sum_like_sequential() {
    const LOOPS: usize = 16;
    const SENT: usize = 2_000;

    let reg = Arc::new(MetricsRegistry::new());

    thread::scope(|s| {
        for p in 0..LOOPS {
            let reg = Arc::clone(&reg);
            s.spawn(move || {
                // Half the loops share one target to contend on the same aggregate.
                let target = if p % 2 == 0 { "shared".to_string() } else { format!("t{p}") };
                let recv = SENT - p;
                feed(&reg, &target, SENT, recv, Duration::from_micros(500 + p as u64));
            });
        }
    });

    let snap = reg.snapshot();
    assert_eq!(snap.targets.len(), 1 + LOOPS / 2);

    let shared = snap.get("shared").unwrap();
    let expected_recv: usize = (0..LOOPS).step_by(2).map(|p| SENT - p).sum();
    assert_eq!(shared.sent, (SENT * LOOPS / 2) as u64);
    assert_eq!(shared.recv, expected_recv as u64);

    for p in (1..LOOPS).step_by(2) {
        let t = snap.get(&format!("t{p}")).unwrap();
        assert_eq!(t.sent, SENT as u64);
        assert_eq!(t.recv, (SENT - p) as u64);
    }

    for t in &snap.targets {
        assert_eq!(t.rtt.count, t.recv);
        assert_eq!(t.rtt.buckets.last().unwrap().1, t.recv);
    }
}

#[test]
fn snapshots_are_monotonic_under_concurrent_writes() {
    let reg = Arc::new(MetricsRegistry::new());
    let writers = 8;

    thread::scope(|s| {
        for p in 0..writers {
            let reg = Arc::clone(&reg);
            let target = format!("w{}", p % 3);
            s.spawn(move || feed(&reg, &target, 5_000, 4_000, Duration::from_millis(2)));
        }

        let reg = Arc::clone(&reg);
        s.spawn(move || {
            let mut prev = reg.snapshot();
            for _ in 0..200 {
                let next = reg.snapshot();
                for t in &next.targets {
                    assert!(t.recv <= t.sent);
                    assert_eq!(t.recv, t.rtt.count);
                    if let Some(old) = prev.get(t.target.as_str()) {
                        assert!(t.sent >= old.sent);
                        assert!(t.recv >= old.recv);
                    }
                }
                // A target never disappears once observed.
                for old in &prev.targets {
                    assert!(next.get(old.target.as_str()).is_some());
                }
                prev = next;
            }
        });
    });

    let total_sent: u64 = reg.snapshot().targets.iter().map(|t| t.sent).sum();
    assert_eq!(total_sent, 5_000 * writers as u64);
}
