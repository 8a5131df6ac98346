//! Raw-value sinks attached to metrics.
//!
//! A sink sees every raw value a metric is fed, independently of the metric's
//! own aggregation. Reporters that export per-interval totals read a sink and
//! reset it after each export; the metric itself is left untouched.

use std::fmt;
use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::sync::lock;

/// Accumulator receiving raw metric values.
pub trait Sink: Send + Sync {
    fn add(&self, value: f64);

    /// Forget everything accumulated so far.
    fn clear(&self);

    /// Read the accumulated state and reset it in one step.
    ///
    /// Sinks that do not aggregate return `None`.
    fn take(&self) -> Option<SinkSummary> {
        None
    }
}

/// Builds one fresh sink per metric created by a registry.
pub type SinkFactory = Arc<dyn Fn() -> Arc<dyn Sink> + Send + Sync>;

/// Totals accumulated by an [`AggregateSink`] since its last reset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SinkSummary {
    pub total: f64,
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub sum_of_squares: f64,
}

impl Default for SinkSummary {
    fn default() -> Self {
        Self {
            total: 0.0,
            count: 0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            sum_of_squares: 0.0,
        }
    }
}

impl SinkSummary {
    fn add(&mut self, value: f64) {
        self.total += value;
        self.count += 1;
        self.sum_of_squares += value * value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    /// Min with the empty sentinel reported as 0.
    pub fn min_or_zero(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.min
        }
    }

    pub fn max_or_zero(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.max
        }
    }
}

/// Sink keeping total, count, min, max and sum of squares.
#[derive(Default)]
pub struct AggregateSink {
    inner: Mutex<SinkSummary>,
}

impl AggregateSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory for [`crate::MetricsRegistry::with_sink_factory`].
    pub fn factory() -> SinkFactory {
        Arc::new(|| Arc::new(AggregateSink::new()) as Arc<dyn Sink>)
    }

    /// Current totals without resetting.
    pub fn summary(&self) -> SinkSummary {
        *lock(&self.inner)
    }
}

impl Sink for AggregateSink {
    fn add(&self, value: f64) {
        lock(&self.inner).add(value);
    }

    fn clear(&self) {
        *lock(&self.inner) = SinkSummary::default();
    }

    fn take(&self) -> Option<SinkSummary> {
        Some(std::mem::take(&mut *lock(&self.inner)))
    }
}

impl fmt::Debug for AggregateSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AggregateSink").field(&self.summary()).finish()
    }
}
