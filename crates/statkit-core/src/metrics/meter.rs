//! Event rates: lifetime mean plus 1/5/15 minute EWMAs.
//!
//! There is no background ticker. Every `mark` and every rate read first
//! works out how many whole tick intervals passed since the last tick and
//! applies them, so sparse or idle meters stay correct and test clocks fully
//! control the outcome.

use std::fmt;
use std::sync::{Arc, Mutex};

use serde::Serialize;

use super::{impl_sink_attachable, Clearable, SinkSlot};
use crate::clock::{default_clock, Clock};
use crate::ewma::{Ewma, TICK_INTERVAL};
use crate::sink::Sink;
use crate::sync::lock;

#[derive(Debug, Clone)]
struct State {
    count: u64,
    start_time: f64,
    last_tick: f64,
    m1: Ewma,
    m5: Ewma,
    m15: Ewma,
}

impl State {
    fn new(now: f64) -> Self {
        Self {
            count: 0,
            start_time: now,
            last_tick: now,
            m1: Ewma::one_minute(),
            m5: Ewma::five_minute(),
            m15: Ewma::fifteen_minute(),
        }
    }

    fn tick_if_necessary(&mut self, now: f64) {
        let elapsed = now - self.last_tick;
        if elapsed < TICK_INTERVAL {
            return;
        }
        let ticks = (elapsed / TICK_INTERVAL).floor();
        self.last_tick += ticks * TICK_INTERVAL;

        let ticks = ticks as u64;
        self.m1.tick_many(ticks);
        self.m5.tick_many(ticks);
        self.m15.tick_many(ticks);
    }

    fn mean_rate(&self, now: f64) -> f64 {
        let elapsed = now - self.start_time;
        if self.count == 0 || elapsed <= 0.0 {
            return 0.0;
        }
        self.count as f64 / elapsed
    }
}

/// Serialisable meter reading. Rates are events per second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeterSummary {
    pub count: u64,
    pub m1_rate: f64,
    pub m5_rate: f64,
    pub m15_rate: f64,
    pub mean_rate: f64,
}

/// Metric measuring the rate of events.
pub struct Meter {
    clock: Arc<dyn Clock>,
    state: Mutex<State>,
    sink: SinkSlot,
}

impl Meter {
    pub fn new() -> Self {
        Self::with_clock(default_clock(), None)
    }

    pub fn with_clock(clock: Arc<dyn Clock>, sink: Option<Arc<dyn Sink>>) -> Self {
        let now = clock.now();
        Self {
            clock,
            state: Mutex::new(State::new(now)),
            sink: SinkSlot::new(sink),
        }
    }

    /// Record one event.
    pub fn mark(&self) {
        self.mark_n(1);
    }

    /// Record `n` events. The sink receives `n`.
    pub fn mark_n(&self, n: u64) {
        let now = self.clock.now();
        {
            let mut st = lock(&self.state);
            st.tick_if_necessary(now);
            st.count = st.count.saturating_add(n);
            st.m1.update(n);
            st.m5.update(n);
            st.m15.update(n);
        }
        self.sink.add(n as f64);
    }

    /// Apply one tick step to every tracker right away.
    ///
    /// Reads already catch up on elapsed intervals by themselves; this is for
    /// callers driving ticks from their own schedule.
    pub fn tick(&self) {
        let mut st = lock(&self.state);
        st.m1.tick();
        st.m5.tick();
        st.m15.tick();
    }

    /// Lifetime number of events.
    pub fn count(&self) -> u64 {
        lock(&self.state).count
    }

    pub fn one_minute_rate(&self) -> f64 {
        self.read(|st| st.m1.rate())
    }

    pub fn five_minute_rate(&self) -> f64 {
        self.read(|st| st.m5.rate())
    }

    pub fn fifteen_minute_rate(&self) -> f64 {
        self.read(|st| st.m15.rate())
    }

    /// `count / seconds since start`; 0 before any time has passed.
    pub fn mean_rate(&self) -> f64 {
        let now = self.clock.now();
        lock(&self.state).mean_rate(now)
    }

    pub fn summary(&self) -> MeterSummary {
        let now = self.clock.now();
        let mut st = lock(&self.state);
        st.tick_if_necessary(now);
        MeterSummary {
            count: st.count,
            m1_rate: st.m1.rate(),
            m5_rate: st.m5.rate(),
            m15_rate: st.m15.rate(),
            mean_rate: st.mean_rate(now),
        }
    }

    fn read(&self, f: impl FnOnce(&State) -> f64) -> f64 {
        let now = self.clock.now();
        let mut st = lock(&self.state);
        st.tick_if_necessary(now);
        f(&st)
    }
}

impl Default for Meter {
    fn default() -> Self {
        Self::new()
    }
}

impl Clearable for Meter {
    fn clear(&self) {
        let now = self.clock.now();
        *lock(&self.state) = State::new(now);
        self.sink.clear();
    }
}

impl_sink_attachable!(Meter);

impl fmt::Debug for Meter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Meter").field("count", &self.count()).finish()
    }
}
