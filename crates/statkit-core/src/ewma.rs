//! Exponentially weighted moving average of an event rate.
//!
//! Events are accumulated in `uncounted` and folded into `rate` once per tick
//! interval: `rate += alpha * (uncounted / interval - rate)`, with
//! `alpha = 1 - exp(-interval / window)`. The tracker owns no timer; its owner
//! (the meter) decides when ticks happen.

/// Seconds between ticks.
pub const TICK_INTERVAL: f64 = 5.0;

const SECONDS_PER_MINUTE: f64 = 60.0;

#[derive(Debug, Clone)]
pub struct Ewma {
    alpha: f64,
    interval: f64,
    uncounted: u64,
    rate: f64,
    initialized: bool,
}

impl Ewma {
    /// Tracker over `window` seconds, ticked every `interval` seconds.
    pub fn new(window: f64, interval: f64) -> Self {
        Self {
            alpha: 1.0 - (-interval / window).exp(),
            interval,
            uncounted: 0,
            rate: 0.0,
            initialized: false,
        }
    }

    pub fn one_minute() -> Self {
        Self::new(SECONDS_PER_MINUTE, TICK_INTERVAL)
    }

    pub fn five_minute() -> Self {
        Self::new(5.0 * SECONDS_PER_MINUTE, TICK_INTERVAL)
    }

    pub fn fifteen_minute() -> Self {
        Self::new(15.0 * SECONDS_PER_MINUTE, TICK_INTERVAL)
    }

    /// Record `n` events for the next tick.
    pub fn update(&mut self, n: u64) {
        self.uncounted = self.uncounted.saturating_add(n);
    }

    /// Fold pending events into the rate. The first tick adopts the instant rate as-is.
    pub fn tick(&mut self) {
        let instant = self.uncounted as f64 / self.interval;
        self.uncounted = 0;
        if self.initialized {
            self.rate += self.alpha * (instant - self.rate);
        } else {
            self.rate = instant;
            self.initialized = true;
        }
    }

    /// Apply `ticks` consecutive ticks.
    ///
    /// Only the first one can see pending events; the rest decay toward zero,
    /// so they collapse into a single multiplication.
    pub fn tick_many(&mut self, ticks: u64) {
        if ticks == 0 {
            return;
        }
        self.tick();
        if ticks > 1 {
            let idle = (ticks - 1).min(i32::MAX as u64) as i32;
            self.rate *= (1.0 - self.alpha).powi(idle);
        }
    }

    /// Rate in events per second; 0 before the first tick.
    pub fn rate(&self) -> f64 {
        if self.initialized {
            self.rate
        } else {
            0.0
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }
}
