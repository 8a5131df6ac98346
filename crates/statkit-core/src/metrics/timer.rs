//! Timer: a histogram of durations plus a meter of calls.
//!
//! Durations are seconds as `f64`, read from the timer's [`Clock`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use super::{impl_sink_attachable, Clearable, Histogram, HistogramOptions, Meter, SinkSlot};
use crate::clock::{default_clock, Clock};
use crate::sample::Snapshot;
use crate::sink::Sink;

/// Serialisable timer reading (durations in seconds, rates per second).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimerSummary {
    pub count: u64,
    pub sum: f64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub stddev: f64,
    pub median: f64,
    pub p75: f64,
    pub p95: f64,
    pub p98: f64,
    pub p99: f64,
    pub p999: f64,
    pub m1_rate: f64,
    pub m5_rate: f64,
    pub m15_rate: f64,
    pub mean_rate: f64,
}

pub struct Timer {
    clock: Arc<dyn Clock>,
    histogram: Histogram,
    meter: Meter,
    sink: SinkSlot,
}

impl Timer {
    pub fn new() -> Self {
        Self::with_options(HistogramOptions::default(), default_clock(), None)
    }

    pub fn with_options(
        opts: HistogramOptions,
        clock: Arc<dyn Clock>,
        sink: Option<Arc<dyn Sink>>,
    ) -> Self {
        Self {
            histogram: Histogram::with_options(opts, Arc::clone(&clock), None),
            meter: Meter::with_clock(Arc::clone(&clock), None),
            clock,
            sink: SinkSlot::new(sink),
        }
    }

    /// Start timing; the duration is recorded when the returned guard drops.
    ///
    /// ```
    /// use statkit_core::Timer;
    ///
    /// let timer = Timer::new();
    /// {
    ///     let _t = timer.time();
    ///     // work
    /// }
    /// assert_eq!(timer.count(), 1);
    /// ```
    #[must_use = "the duration is recorded when the guard is dropped"]
    pub fn time(&self) -> TimerContext<'_> {
        TimerContext {
            timer: self,
            start: self.clock.now(),
            done: false,
        }
    }

    /// Time a closure.
    pub fn time_fn<T>(&self, f: impl FnOnce() -> T) -> T {
        let _ctx = self.time();
        f()
    }

    /// Record a duration in seconds. Negative or non-finite durations are dropped.
    pub fn update(&self, seconds: f64) {
        if !seconds.is_finite() || seconds < 0.0 {
            tracing::debug!(seconds, "timer ignored invalid duration");
            return;
        }
        self.histogram.add(seconds);
        self.meter.mark();
        self.sink.add(seconds);
    }

    pub fn update_duration(&self, d: Duration) {
        self.update(d.as_secs_f64());
    }

    pub fn count(&self) -> u64 {
        self.histogram.count()
    }

    pub fn sum(&self) -> f64 {
        self.histogram.sum()
    }

    pub fn min(&self) -> f64 {
        self.histogram.min()
    }

    pub fn max(&self) -> f64 {
        self.histogram.max()
    }

    pub fn mean(&self) -> f64 {
        self.histogram.mean()
    }

    pub fn variance(&self) -> f64 {
        self.histogram.variance()
    }

    pub fn stddev(&self) -> f64 {
        self.histogram.stddev()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.histogram.snapshot()
    }

    pub fn one_minute_rate(&self) -> f64 {
        self.meter.one_minute_rate()
    }

    pub fn five_minute_rate(&self) -> f64 {
        self.meter.five_minute_rate()
    }

    pub fn fifteen_minute_rate(&self) -> f64 {
        self.meter.fifteen_minute_rate()
    }

    pub fn mean_rate(&self) -> f64 {
        self.meter.mean_rate()
    }

    /// Underlying duration histogram.
    pub fn histogram(&self) -> &Histogram {
        &self.histogram
    }

    /// Underlying call-rate meter.
    pub fn meter(&self) -> &Meter {
        &self.meter
    }

    pub fn summary(&self) -> TimerSummary {
        let h = self.histogram.summary();
        let m = self.meter.summary();
        TimerSummary {
            count: h.count,
            sum: h.sum,
            min: h.min,
            max: h.max,
            mean: h.mean,
            stddev: h.stddev,
            median: h.median,
            p75: h.p75,
            p95: h.p95,
            p98: h.p98,
            p99: h.p99,
            p999: h.p999,
            m1_rate: m.m1_rate,
            m5_rate: m.m5_rate,
            m15_rate: m.m15_rate,
            mean_rate: m.mean_rate,
        }
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Clearable for Timer {
    fn clear(&self) {
        self.histogram.clear();
        self.meter.clear();
        self.sink.clear();
    }
}

impl_sink_attachable!(Timer);

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("count", &self.count())
            .field("mean", &self.mean())
            .finish()
    }
}

/// Scoped timing guard returned by [`Timer::time`].
///
/// Records exactly once: on [`TimerContext::stop`] or on drop, whichever
/// comes first, including drops during unwinding or early returns.
pub struct TimerContext<'a> {
    timer: &'a Timer,
    start: f64,
    done: bool,
}

impl TimerContext<'_> {
    /// Record now and return the elapsed seconds.
    pub fn stop(mut self) -> f64 {
        self.record()
    }

    /// Seconds elapsed so far, without recording.
    pub fn elapsed(&self) -> f64 {
        self.timer.clock.now() - self.start
    }

    fn record(&mut self) -> f64 {
        let elapsed = self.elapsed();
        if !self.done {
            self.done = true;
            self.timer.update(elapsed);
        }
        elapsed
    }
}

impl Drop for TimerContext<'_> {
    fn drop(&mut self) {
        self.record();
    }
}
