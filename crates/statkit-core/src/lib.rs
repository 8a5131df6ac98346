//! statkit core: streaming statistics, metric kinds, and the metrics registry.
//!
//! This crate holds everything an application needs to record events inline:
//! counters, histograms backed by an exponentially decaying reservoir, meters
//! with lazily ticked EWMA rates, timers, gauges, and the registry that owns
//! them. It carries no runtime or I/O dependencies; exporting belongs to
//! `statkit-report` or any other collaborator speaking the read contract.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Poisoned locks are recovered instead of propagated, so a panicking caller
//! on one thread never takes instrumentation down on every other thread.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod clock;
pub mod error;
pub mod ewma;
pub mod metrics;
pub mod registry;
pub mod sample;
pub mod sink;

mod sync;

pub use clock::{Clock, ManualClock, MonotonicClock};
/// Shared result type.
pub use error::{ErrorCode, Result, StatkitError};
pub use metrics::{
    Clearable, Counter, CounterSummary, Gauge, GaugeValue, Histogram, HistogramOptions,
    HistogramSummary, Meter, MeterSummary, SinkAttachable, Timer, TimerContext, TimerSummary,
};
pub use registry::{Metric, MetricKind, MetricsRegistry};
pub use sample::{ExpDecayingSample, Reservoir, Snapshot};
pub use sink::{AggregateSink, Sink, SinkFactory, SinkSummary};
