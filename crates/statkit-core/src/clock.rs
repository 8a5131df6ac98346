//! Time sources.
//!
//! Every time-dependent component (reservoir landmarks, meter ticks, timers)
//! reads "now" through [`Clock`] as seconds in `f64`. Production code uses
//! [`MonotonicClock`]; tests inject a [`ManualClock`] and move it by hand.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Supplier of monotonic time in seconds.
pub trait Clock: Send + Sync {
    /// Current reading in seconds. Only differences between readings are meaningful.
    fn now(&self) -> f64;
}

/// `Instant`-backed clock; readings are seconds since the clock was created.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Hand-driven clock for deterministic tests.
///
/// ```
/// use statkit_core::{Clock, ManualClock};
///
/// let clock = ManualClock::new();
/// clock.advance(5.0);
/// assert_eq!(clock.now(), 5.0);
/// ```
#[derive(Default)]
pub struct ManualClock {
    bits: AtomicU64,
}

impl ManualClock {
    /// Starts at `0.0`.
    pub fn new() -> Self {
        Self::at(0.0)
    }

    pub fn at(secs: f64) -> Self {
        Self {
            bits: AtomicU64::new(secs.to_bits()),
        }
    }

    pub fn set(&self, secs: f64) {
        self.bits.store(secs.to_bits(), Ordering::Release);
    }

    /// Move the clock forward by `secs`.
    pub fn advance(&self, secs: f64) {
        let _ = self
            .bits
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |b| {
                Some((f64::from_bits(b) + secs).to_bits())
            });
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }
}

impl fmt::Debug for ManualClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualClock").field("now", &self.now()).finish()
    }
}

/// Default clock shared by a registry and the metrics it creates.
pub fn default_clock() -> Arc<dyn Clock> {
    Arc::new(MonotonicClock::new())
}
