#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use serde_json::{json, Value};
use statkit_core::{AggregateSink, ManualClock, MetricsRegistry};
use statkit_report::config::ReporterSection;
use statkit_report::payload::{self, metric_key};

fn registry(clock: Arc<ManualClock>) -> MetricsRegistry {
    MetricsRegistry::new()
        .with_clock(clock)
        .with_sink_factory(AggregateSink::factory())
}

fn section(name: &str, prefix: &str, interval_secs: u64) -> ReporterSection {
    ReporterSection {
        name: name.into(),
        prefix: prefix.into(),
        interval_secs,
        ..ReporterSection::default()
    }
}

#[test]
fn agent_reports_the_machine_hostname() {
    let host = payload::hostname();
    assert!(!host.is_empty());
    if let Ok(etc) = std::fs::read_to_string("/etc/hostname") {
        if !etc.trim().is_empty() {
            assert_eq!(host, etc.trim());
        }
    }
    assert_eq!(payload::Agent::current().host, host);
}

#[test]
fn keys_map_dots_to_slashes() {
    assert_eq!(metric_key("", "counter-1"), "Component/counter-1");
    assert_eq!(metric_key("app.", "db.query"), "Component/app/db/query");
}

#[test]
fn collects_sink_totals_for_counters_timers_and_gauges() {
    let clock = Arc::new(ManualClock::new());
    let registry = registry(clock.clone());

    let h1 = registry.histogram("hist").unwrap();
    for i in 0..10 {
        h1.add(2f64.powi(i));
    }
    let t1 = registry.timer("t1").unwrap();
    registry.meter("m1").unwrap().mark();
    registry.gauge("g1").unwrap().set_value(10i64).unwrap();
    {
        let _ctx = t1.time();
        let c1 = registry.counter("counter-1").unwrap();
        let c2 = registry.counter("counter-2").unwrap();
        c1.inc();
        c2.dec();
        c2.dec();
        clock.advance(1.0);
    }

    let p = payload::collect(&registry, &section("foo", "", 1));
    let out: Value = serde_json::from_str(&payload::to_json(&p).unwrap()).unwrap();

    assert_eq!(out["agent"]["pid"], json!(std::process::id()));
    assert_eq!(out["agent"]["host"], json!(payload::hostname()));
    assert_eq!(out["agent"]["version"], json!(env!("CARGO_PKG_VERSION")));

    let expected = json!([{
        "duration": 1,
        "guid": "io.statkit",
        "name": "foo",
        "metrics": {
            "Component/counter-1": {"count": 1, "max": 1.0, "min": 1.0, "sum_of_squares": 1.0, "total": 1.0},
            "Component/counter-2": {"count": 2, "max": -1.0, "min": -1.0, "sum_of_squares": 2.0, "total": -2.0},
            "Component/t1": {"count": 1, "max": 1.0, "min": 1.0, "sum_of_squares": 1.0, "total": 1.0},
            "Component/g1": 10
        }
    }]);
    assert_eq!(out["components"], expected);
}

#[test]
fn sinks_are_drained_by_collection() {
    let clock = Arc::new(ManualClock::new());
    let registry = registry(clock);
    let c = registry.counter("c").unwrap();
    c.inc_by(4);
    registry.gauge("g").unwrap().set_value(2.5).unwrap();

    let cfg = section("svc", "", 5);
    let first = payload::collect(&registry, &cfg);
    assert_eq!(first.components[0].metrics.len(), 2);

    // Nothing new on the counter: only the gauge remains.
    let second = payload::collect(&registry, &cfg);
    let keys: Vec<_> = second.components[0].metrics.keys().cloned().collect();
    assert_eq!(keys, ["Component/g"]);

    // The metric itself keeps its running total.
    assert_eq!(c.count(), 4);
    c.inc();
    let third = payload::collect(&registry, &cfg);
    assert!(third.components[0].metrics.contains_key("Component/c"));
}

#[test]
fn metrics_without_sinks_and_text_gauges_are_skipped() {
    let registry = MetricsRegistry::new();
    registry.counter("plain").unwrap().inc();
    registry.gauge("mode").unwrap().set_value("idle").unwrap();

    let p = payload::collect(&registry, &section("svc", "x.", 5));
    assert!(p.components[0].metrics.is_empty());
    assert_eq!(p.components[0].duration, 5);
}
