//! Raw-value sinks: aggregation, reset, and what each metric kind forwards.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use statkit_core::{
    AggregateSink, Clearable, Counter, HistogramOptions, ManualClock, Meter, MetricsRegistry,
    Sink, SinkAttachable, SinkSummary, Timer,
};

#[test]
fn aggregate_sink_tracks_totals() {
    let sink = AggregateSink::new();
    for v in [3.0, -1.0, 4.0] {
        sink.add(v);
    }
    let s = sink.summary();
    assert_eq!(s.total, 6.0);
    assert_eq!(s.count, 3);
    assert_eq!(s.min, -1.0);
    assert_eq!(s.max, 4.0);
    assert_eq!(s.sum_of_squares, 26.0);
}

#[test]
fn take_reads_and_resets() {
    let sink = AggregateSink::new();
    sink.add(2.0);
    sink.add(5.0);

    let taken = sink.take().expect("aggregate sinks summarize");
    assert_eq!(taken.count, 2);
    assert_eq!(taken.total, 7.0);

    let empty = sink.take().unwrap();
    assert_eq!(empty, SinkSummary::default());
    assert_eq!(empty.min_or_zero(), 0.0);
    assert_eq!(empty.max_or_zero(), 0.0);
    assert_eq!(empty.min, f64::INFINITY);
}

#[test]
fn counter_sink_receives_deltas() {
    let sink = Arc::new(AggregateSink::new());
    let c = Counter::with_sink(Some(sink.clone() as Arc<dyn Sink>));
    c.dec();
    c.dec();

    assert_eq!(c.count(), -2);
    let s = sink.summary();
    assert_eq!(s.total, -2.0);
    assert_eq!(s.count, 2);
    assert_eq!(s.min, -1.0);
    assert_eq!(s.max, -1.0);
    assert_eq!(s.sum_of_squares, 2.0);
}

#[test]
fn timer_sink_receives_durations() {
    let clock = Arc::new(ManualClock::new());
    let sink = Arc::new(AggregateSink::new());
    let t = Timer::with_options(
        HistogramOptions::default(),
        clock.clone(),
        Some(sink.clone() as Arc<dyn Sink>),
    );

    for secs in [1.0, 2.0, 3.0] {
        let ctx = t.time();
        clock.advance(secs);
        let _ = ctx.stop();
    }

    let s = sink.summary();
    assert_eq!(s.count, 3);
    assert_eq!(s.total, 6.0);
    assert_eq!(s.min, 1.0);
    assert_eq!(s.max, 3.0);
    assert_eq!(s.sum_of_squares, 14.0);
}

#[test]
fn meter_sink_receives_marks() {
    let clock = Arc::new(ManualClock::new());
    let sink = Arc::new(AggregateSink::new());
    let m = Meter::with_clock(clock, Some(sink.clone() as Arc<dyn Sink>));
    m.mark();
    m.mark_n(4);

    let s = sink.summary();
    assert_eq!(s.count, 2);
    assert_eq!(s.total, 5.0);
}

#[test]
fn clearing_a_metric_clears_its_sink() {
    let sink = Arc::new(AggregateSink::new());
    let c = Counter::new();
    assert!(c.sink().is_none());
    c.attach_sink(sink.clone());
    c.inc_by(10);
    assert_eq!(sink.summary().count, 1);

    c.clear();
    assert_eq!(sink.summary(), SinkSummary::default());
}

#[test]
fn registry_factory_gives_each_metric_its_own_sink() {
    let registry = MetricsRegistry::new().with_sink_factory(AggregateSink::factory());
    let a = registry.counter("a").unwrap();
    let b = registry.counter("b").unwrap();
    a.inc_by(3);
    b.inc();

    let sa = a.sink().expect("factory attaches a sink");
    let sb = b.sink().expect("factory attaches a sink");
    assert!(!Arc::ptr_eq(&sa, &sb));
    assert_eq!(sa.take().unwrap().total, 3.0);
    assert_eq!(sb.take().unwrap().total, 1.0);

    let h = registry.histogram("h").unwrap();
    h.add(0.5);
    assert_eq!(h.sink().unwrap().take().unwrap().count, 1);

    let g = registry.gauge("g").unwrap();
    g.set_value("idle").unwrap();
    g.set_value(2.5).unwrap();
    let gs = g.sink().unwrap().take().unwrap();
    assert_eq!(gs.count, 1);
    assert_eq!(gs.total, 2.5);
}
