//! Distribution of values: exact moments plus a sampled quantile view.
//!
//! `count`, `sum`, `min`, `max` and the Welford mean/variance cover every
//! value ever added. Quantiles come from the reservoir, which only holds a
//! bounded, recency-biased sample.

use std::fmt;
use std::sync::{Arc, Mutex};

use serde::Serialize;

use super::{impl_sink_attachable, Clearable, SinkSlot};
use crate::clock::{default_clock, Clock};
use crate::sample::{ExpDecayingSample, Reservoir, Snapshot, DEFAULT_ALPHA, DEFAULT_SIZE};
use crate::sink::Sink;
use crate::sync::lock;

/// Parameters of the default decaying reservoir.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramOptions {
    pub size: usize,
    pub alpha: f64,
}

impl Default for HistogramOptions {
    fn default() -> Self {
        Self {
            size: DEFAULT_SIZE,
            alpha: DEFAULT_ALPHA,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Moments {
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
    // Welford state: running mean and sum of squared deviations.
    m: f64,
    s: f64,
}

impl Default for Moments {
    fn default() -> Self {
        Self {
            count: 0,
            sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            m: 0.0,
            s: 0.0,
        }
    }
}

impl Moments {
    fn add(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }

        if self.count == 1 {
            self.m = value;
            self.s = 0.0;
        } else {
            let delta = value - self.m;
            self.m += delta / self.count as f64;
            self.s += delta * (value - self.m);
        }
    }

    fn mean(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.sum / self.count as f64
    }

    fn variance(&self) -> f64 {
        if self.count <= 1 {
            return 0.0;
        }
        self.s / (self.count - 1) as f64
    }

    fn min(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.min
        }
    }

    fn max(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.max
        }
    }
}

/// Serialisable histogram reading taken under one lock.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramSummary {
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
}

impl HistogramSummary {
    fn from_parts(m: &Moments, snapshot: &Snapshot) -> Self {
        Self {
            count: m.count,
            sum: m.sum,
            min: m.min(),
            max: m.max(),
            mean: m.mean(),
            stddev: m.variance().sqrt(),
            median: snapshot.median(),
            p75: snapshot.percentile_75(),
            p95: snapshot.percentile_95(),
            p98: snapshot.percentile_98(),
            p99: snapshot.percentile_99(),
            p999: snapshot.percentile_999(),
        }
    }
}

/// Metric calculating the distribution of a value.
pub struct Histogram {
    moments: Mutex<Moments>,
    reservoir: Arc<dyn Reservoir>,
    sink: SinkSlot,
}

impl Histogram {
    /// Histogram over a default-sized decaying reservoir on the monotonic clock.
    pub fn new() -> Self {
        Self::with_options(HistogramOptions::default(), default_clock(), None)
    }

    pub fn with_options(
        opts: HistogramOptions,
        clock: Arc<dyn Clock>,
        sink: Option<Arc<dyn Sink>>,
    ) -> Self {
        let reservoir = ExpDecayingSample::new(opts.size, opts.alpha, clock);
        Self::with_reservoir(Arc::new(reservoir), sink)
    }

    /// Histogram sampling through any [`Reservoir`].
    pub fn with_reservoir(reservoir: Arc<dyn Reservoir>, sink: Option<Arc<dyn Sink>>) -> Self {
        Self {
            moments: Mutex::new(Moments::default()),
            reservoir,
            sink: SinkSlot::new(sink),
        }
    }

    pub fn add(&self, value: f64) {
        {
            let mut m = lock(&self.moments);
            m.add(value);
            // Held across the reservoir update so clear() never splits the two.
            self.reservoir.update(value);
        }
        self.sink.add(value);
    }

    pub fn count(&self) -> u64 {
        lock(&self.moments).count
    }

    pub fn sum(&self) -> f64 {
        lock(&self.moments).sum
    }

    /// Smallest value seen; 0 when empty.
    pub fn min(&self) -> f64 {
        lock(&self.moments).min()
    }

    /// Largest value seen; 0 when empty.
    pub fn max(&self) -> f64 {
        lock(&self.moments).max()
    }

    /// `sum / count`; 0 when empty.
    pub fn mean(&self) -> f64 {
        lock(&self.moments).mean()
    }

    /// Sample variance (Bessel-corrected); 0 with fewer than two values.
    pub fn variance(&self) -> f64 {
        lock(&self.moments).variance()
    }

    pub fn stddev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Sorted copy of the reservoir for quantile reads.
    pub fn snapshot(&self) -> Snapshot {
        self.reservoir.snapshot()
    }

    pub fn summary(&self) -> HistogramSummary {
        let m = lock(&self.moments);
        let snapshot = self.reservoir.snapshot();
        HistogramSummary::from_parts(&m, &snapshot)
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Clearable for Histogram {
    fn clear(&self) {
        {
            let mut m = lock(&self.moments);
            *m = Moments::default();
            self.reservoir.clear();
        }
        self.sink.clear();
    }
}

impl_sink_attachable!(Histogram);

impl fmt::Debug for Histogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = *lock(&self.moments);
        f.debug_struct("Histogram")
            .field("count", &m.count)
            .field("sum", &m.sum)
            .field("mean", &m.mean())
            .field("retained", &self.reservoir.len())
            .finish()
    }
}
