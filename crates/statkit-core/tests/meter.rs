//! Meter rates and lazy EWMA ticking.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use statkit_core::ewma::{Ewma, TICK_INTERVAL};
use statkit_core::{Clearable, ManualClock, Meter};

fn meter() -> (Arc<ManualClock>, Meter) {
    let clock = Arc::new(ManualClock::new());
    let meter = Meter::with_clock(clock.clone(), None);
    (clock, meter)
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn fresh_meter_reports_zero() {
    let (clock, m) = meter();
    assert_eq!(m.count(), 0);
    assert_eq!(m.one_minute_rate(), 0.0);
    assert_eq!(m.five_minute_rate(), 0.0);
    assert_eq!(m.fifteen_minute_rate(), 0.0);
    assert_eq!(m.mean_rate(), 0.0);

    clock.advance(60.0);
    assert_eq!(m.one_minute_rate(), 0.0);
    assert_eq!(m.mean_rate(), 0.0);
}

#[test]
fn mean_rate_is_count_over_elapsed() {
    let (clock, m) = meter();
    m.mark_n(10);
    for _ in 0..4 {
        clock.advance(TICK_INTERVAL);
    }
    assert_eq!(m.count(), 10);
    assert_close(m.mean_rate(), 10.0 / 20.0);
}

#[test]
fn first_tick_adopts_instant_rate() {
    let (clock, m) = meter();
    m.mark_n(3);
    assert_eq!(m.one_minute_rate(), 0.0);

    clock.advance(TICK_INTERVAL);
    assert_close(m.one_minute_rate(), 0.6);
    assert_close(m.five_minute_rate(), 0.6);
    assert_close(m.fifteen_minute_rate(), 0.6);
}

#[test]
fn rates_decay_over_one_idle_minute() {
    let (clock, m) = meter();
    m.mark_n(3);
    clock.advance(TICK_INTERVAL);
    assert_close(m.one_minute_rate(), 0.6);

    clock.advance(60.0);
    assert_close(m.one_minute_rate(), 0.6 * (-1.0f64).exp());
    assert_close(m.five_minute_rate(), 0.6 * (-60.0f64 / 300.0).exp());
    assert_close(m.fifteen_minute_rate(), 0.6 * (-60.0f64 / 900.0).exp());
}

#[test]
fn catch_up_matches_step_by_step_reads() {
    let (clock_a, a) = meter();
    let (clock_b, b) = meter();

    for step in 0..40 {
        let n = (step % 7) as u64;
        a.mark_n(n);
        b.mark_n(n);
        clock_a.advance(TICK_INTERVAL);
        clock_b.advance(TICK_INTERVAL);
        // `a` is read every interval, `b` only at the end.
        let _ = a.one_minute_rate();
    }
    clock_a.advance(600.0);
    clock_b.advance(600.0);

    assert_close(a.one_minute_rate(), b.one_minute_rate());
    assert_close(a.five_minute_rate(), b.five_minute_rate());
    assert_close(a.fifteen_minute_rate(), b.fifteen_minute_rate());
}

#[test]
fn partial_intervals_carry_over() {
    let (clock, m) = meter();
    m.mark();
    clock.advance(3.0);
    assert_eq!(m.one_minute_rate(), 0.0);
    clock.advance(3.0);
    // 6s elapsed: one tick applied, 1s carried toward the next.
    assert_close(m.one_minute_rate(), 0.2);
    clock.advance(4.0);
    let a = 1.0 - (-TICK_INTERVAL / 60.0).exp();
    assert_close(m.one_minute_rate(), 0.2 * (1.0 - a));
}

#[test]
fn idle_for_days_stays_cheap_and_finite() {
    let (clock, m) = meter();
    m.mark_n(1000);
    clock.advance(TICK_INTERVAL);
    clock.advance(90.0 * 24.0 * 3600.0);
    let r = m.one_minute_rate();
    assert!(r.is_finite());
    assert!(r >= 0.0 && r < 1e-12);
    m.mark();
    assert_eq!(m.count(), 1001);
}

#[test]
fn forced_tick_applies_one_step() {
    let (_clock, m) = meter();
    m.mark_n(5);
    m.tick();
    assert_close(m.one_minute_rate(), 1.0);
}

#[test]
fn clear_resets_count_and_rates() {
    let (clock, m) = meter();
    m.mark_n(7);
    clock.advance(30.0);
    assert!(m.one_minute_rate() > 0.0);

    m.clear();
    assert_eq!(m.count(), 0);
    assert_eq!(m.one_minute_rate(), 0.0);
    assert_eq!(m.mean_rate(), 0.0);

    m.mark_n(4);
    clock.advance(2.0);
    assert_close(m.mean_rate(), 2.0);
}

#[test]
fn summary_reads_all_rates() {
    let (clock, m) = meter();
    m.mark_n(3);
    clock.advance(TICK_INTERVAL);
    let s = m.summary();
    assert_eq!(s.count, 3);
    assert_close(s.m1_rate, 0.6);
    assert_close(s.mean_rate, 0.6);
}

#[test]
fn ewma_alpha_from_window() {
    let e = Ewma::one_minute();
    assert_close(e.alpha(), 1.0 - (-5.0f64 / 60.0).exp());
    assert_eq!(e.interval(), TICK_INTERVAL);

    let mut e = Ewma::new(60.0, 1.0);
    assert_eq!(e.rate(), 0.0);
    e.tick();
    assert_eq!(e.rate(), 0.0);
    e.update(10);
    e.tick();
    assert_close(e.rate(), e.alpha() * 10.0);
}
