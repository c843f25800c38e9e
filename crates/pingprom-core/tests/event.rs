#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pingprom_core::{ErrorCode, PingPromError, ProbeEvent, ProbeSink, Target};

#[derive(Default)]
struct CountingSink {
    per_target: Mutex<HashMap<Target, usize>>,
}

impl ProbeSink for CountingSink {
    fn observe(&self, event: ProbeEvent) {
        *self
            .per_target
            .lock()
            .unwrap()
            .entry(event.target().clone())
            .or_default() += 1;
    }
}

#[test]
fn event_target_accessor() {
    let t = Target::new("10.0.0.1");
    let events = [
        ProbeEvent::Setup(t.clone()),
        ProbeEvent::Sent(t.clone()),
        ProbeEvent::Received(t.clone(), Duration::from_millis(1)),
    ];
    for e in &events {
        assert_eq!(e.target(), &t);
    }
}

#[test]
fn target_is_lookup_compatible_with_str() {
    let mut m: HashMap<Target, u32> = HashMap::new();
    m.insert(Target::from("example.com"), 7);
    assert_eq!(m.get("example.com"), Some(&7));
    assert_eq!(Target::from(String::from("x")).to_string(), "x");
}

#[test]
fn arc_sink_forwards() {
    let sink = Arc::new(CountingSink::default());
    let dyn_sink: Arc<dyn ProbeSink> = sink.clone();

    dyn_sink.observe(ProbeEvent::Sent(Target::new("a")));
    sink.clone().observe(ProbeEvent::Sent(Target::new("a")));

    assert_eq!(sink.per_target.lock().unwrap().get("a"), Some(&2));
}

#[test]
fn error_codes_are_stable() {
    let cases = [
        (PingPromError::Config("x".into()), "CONFIG"),
        (PingPromError::UnsupportedVersion, "UNSUPPORTED_VERSION"),
        (
            PingPromError::Setup {
                target: "h".into(),
                reason: "r".into(),
            },
            "SETUP",
        ),
        (PingPromError::Render(std::fmt::Error), "RENDER"),
        (PingPromError::Internal("x".into()), "INTERNAL"),
    ];
    for (err, code) in cases {
        assert_eq!(err.code().as_str(), code);
    }

    let err = PingPromError::Listener {
        addr: "0.0.0.0:2112".into(),
        source: std::io::Error::new(std::io::ErrorKind::AddrInUse, "in use"),
    };
    assert_eq!(err.code(), ErrorCode::Listener);
    assert!(err.to_string().contains("0.0.0.0:2112"));
}
