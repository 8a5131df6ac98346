//! Metrics registry: `name -> instance`, one map per kind.
//!
//! Lookups are get-or-create. Creation happens inside the map entry's shard
//! lock, so concurrent callers asking for the same name always end up with
//! the same `Arc`. Construction parameters only matter for the first caller;
//! later calls get the existing instance unchanged.
//!
//! The registry never touches a metric's internals. Iteration returns sorted
//! copies of the maps so reporters can do slow I/O without holding any lock.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;

use crate::clock::{default_clock, Clock};
use crate::error::{Result, StatkitError};
use crate::metrics::{
    Clearable, Counter, Gauge, GaugeValue, Histogram, HistogramOptions, Meter, SinkAttachable,
    Timer,
};
use crate::sink::{Sink, SinkFactory};

/// Metric kinds; names are unique per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MetricKind {
    Counter,
    Histogram,
    Meter,
    Timer,
    Gauge,
}

impl MetricKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Histogram => "histogram",
            MetricKind::Meter => "meter",
            MetricKind::Timer => "timer",
            MetricKind::Gauge => "gauge",
        }
    }
}

/// Handle to a registered metric of any kind.
#[derive(Debug, Clone)]
pub enum Metric {
    Counter(Arc<Counter>),
    Histogram(Arc<Histogram>),
    Meter(Arc<Meter>),
    Timer(Arc<Timer>),
    Gauge(Arc<Gauge>),
}

impl Metric {
    pub fn kind(&self) -> MetricKind {
        match self {
            Metric::Counter(_) => MetricKind::Counter,
            Metric::Histogram(_) => MetricKind::Histogram,
            Metric::Meter(_) => MetricKind::Meter,
            Metric::Timer(_) => MetricKind::Timer,
            Metric::Gauge(_) => MetricKind::Gauge,
        }
    }

    pub fn as_clearable(&self) -> &dyn Clearable {
        match self {
            Metric::Counter(m) => m.as_ref(),
            Metric::Histogram(m) => m.as_ref(),
            Metric::Meter(m) => m.as_ref(),
            Metric::Timer(m) => m.as_ref(),
            Metric::Gauge(m) => m.as_ref(),
        }
    }

    pub fn as_sink_attachable(&self) -> &dyn SinkAttachable {
        match self {
            Metric::Counter(m) => m.as_ref(),
            Metric::Histogram(m) => m.as_ref(),
            Metric::Meter(m) => m.as_ref(),
            Metric::Timer(m) => m.as_ref(),
            Metric::Gauge(m) => m.as_ref(),
        }
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(StatkitError::InvalidName(name.to_string()));
    }
    Ok(())
}

fn get_or_create<T>(
    map: &DashMap<String, Arc<T>>,
    kind: MetricKind,
    name: &str,
    make: impl FnOnce() -> T,
) -> Result<Arc<T>> {
    validate_name(name)?;

    if let Some(existing) = map.get(name) {
        return Ok(Arc::clone(existing.value()));
    }

    let entry = map.entry(name.to_owned()).or_insert_with(|| {
        tracing::debug!(kind = kind.as_str(), %name, "metric registered");
        Arc::new(make())
    });
    Ok(Arc::clone(entry.value()))
}

fn lookup<T>(map: &DashMap<String, Arc<T>>, name: &str) -> Option<Arc<T>> {
    map.get(name).map(|e| Arc::clone(e.value()))
}

fn sorted_copy<T>(map: &DashMap<String, Arc<T>>) -> BTreeMap<String, Arc<T>> {
    map.iter()
        .map(|e| (e.key().clone(), Arc::clone(e.value())))
        .collect()
}

/// Owner of every named metric.
pub struct MetricsRegistry {
    clock: Arc<dyn Clock>,
    histogram_options: HistogramOptions,
    sink_factory: Option<SinkFactory>,

    counters: DashMap<String, Arc<Counter>>,
    histograms: DashMap<String, Arc<Histogram>>,
    meters: DashMap<String, Arc<Meter>>,
    timers: DashMap<String, Arc<Timer>>,
    gauges: DashMap<String, Arc<Gauge>>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            clock: default_clock(),
            histogram_options: HistogramOptions::default(),
            sink_factory: None,
            counters: DashMap::new(),
            histograms: DashMap::new(),
            meters: DashMap::new(),
            timers: DashMap::new(),
            gauges: DashMap::new(),
        }
    }

    /// Clock handed to every metric created from now on.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Reservoir parameters used by `histogram` and `timer`.
    pub fn with_histogram_options(mut self, opts: HistogramOptions) -> Self {
        self.histogram_options = opts;
        self
    }

    /// Attach a fresh sink from `factory` to every metric created from now on.
    pub fn with_sink_factory(mut self, factory: SinkFactory) -> Self {
        self.sink_factory = Some(factory);
        self
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    fn new_sink(&self) -> Option<Arc<dyn Sink>> {
        self.sink_factory.as_ref().map(|f| f())
    }

    pub fn counter(&self, name: &str) -> Result<Arc<Counter>> {
        get_or_create(&self.counters, MetricKind::Counter, name, || {
            Counter::with_sink(self.new_sink())
        })
    }

    pub fn histogram(&self, name: &str) -> Result<Arc<Histogram>> {
        self.histogram_with(name, self.histogram_options)
    }

    /// Like [`MetricsRegistry::histogram`]; `opts` only apply if `name` is new.
    pub fn histogram_with(&self, name: &str, opts: HistogramOptions) -> Result<Arc<Histogram>> {
        get_or_create(&self.histograms, MetricKind::Histogram, name, || {
            Histogram::with_options(opts, self.clock(), self.new_sink())
        })
    }

    pub fn meter(&self, name: &str) -> Result<Arc<Meter>> {
        get_or_create(&self.meters, MetricKind::Meter, name, || {
            Meter::with_clock(self.clock(), self.new_sink())
        })
    }

    pub fn timer(&self, name: &str) -> Result<Arc<Timer>> {
        self.timer_with(name, self.histogram_options)
    }

    /// Like [`MetricsRegistry::timer`]; `opts` only apply if `name` is new.
    pub fn timer_with(&self, name: &str, opts: HistogramOptions) -> Result<Arc<Timer>> {
        get_or_create(&self.timers, MetricKind::Timer, name, || {
            Timer::with_options(opts, self.clock(), self.new_sink())
        })
    }

    /// Settable gauge starting at `0.0`.
    pub fn gauge(&self, name: &str) -> Result<Arc<Gauge>> {
        self.gauge_with(name, Gauge::default)
    }

    /// Gauge built by `init` if `name` is new.
    pub fn gauge_with(&self, name: &str, init: impl FnOnce() -> Gauge) -> Result<Arc<Gauge>> {
        get_or_create(&self.gauges, MetricKind::Gauge, name, || {
            let gauge = init();
            if let Some(sink) = self.new_sink() {
                gauge.attach_sink(sink);
            }
            gauge
        })
    }

    /// Gauge reading `f` on every report, if `name` is new.
    pub fn gauge_fn<F, V>(&self, name: &str, f: F) -> Result<Arc<Gauge>>
    where
        F: Fn() -> V + Send + Sync + 'static,
        V: Into<GaugeValue>,
    {
        self.gauge_with(name, || Gauge::from_fn(f))
    }

    /// Look up an existing metric without creating it.
    pub fn get(&self, kind: MetricKind, name: &str) -> Option<Metric> {
        match kind {
            MetricKind::Counter => lookup(&self.counters, name).map(Metric::Counter),
            MetricKind::Histogram => lookup(&self.histograms, name).map(Metric::Histogram),
            MetricKind::Meter => lookup(&self.meters, name).map(Metric::Meter),
            MetricKind::Timer => lookup(&self.timers, name).map(Metric::Timer),
            MetricKind::Gauge => lookup(&self.gauges, name).map(Metric::Gauge),
        }
    }

    /// Deregister `name`; returns whether it existed. Outstanding handles stay usable.
    pub fn remove(&self, kind: MetricKind, name: &str) -> bool {
        let existed = match kind {
            MetricKind::Counter => self.counters.remove(name).is_some(),
            MetricKind::Histogram => self.histograms.remove(name).is_some(),
            MetricKind::Meter => self.meters.remove(name).is_some(),
            MetricKind::Timer => self.timers.remove(name).is_some(),
            MetricKind::Gauge => self.gauges.remove(name).is_some(),
        };
        if existed {
            tracing::debug!(kind = kind.as_str(), %name, "metric removed");
        }
        existed
    }

    pub fn counters(&self) -> BTreeMap<String, Arc<Counter>> {
        sorted_copy(&self.counters)
    }

    pub fn histograms(&self) -> BTreeMap<String, Arc<Histogram>> {
        sorted_copy(&self.histograms)
    }

    pub fn meters(&self) -> BTreeMap<String, Arc<Meter>> {
        sorted_copy(&self.meters)
    }

    pub fn timers(&self) -> BTreeMap<String, Arc<Timer>> {
        sorted_copy(&self.timers)
    }

    pub fn gauges(&self) -> BTreeMap<String, Arc<Gauge>> {
        sorted_copy(&self.gauges)
    }

    /// Every registered metric, ordered by kind then name.
    pub fn metrics(&self) -> Vec<(String, Metric)> {
        let mut out = Vec::with_capacity(self.len());
        out.extend(self.counters().into_iter().map(|(k, v)| (k, Metric::Counter(v))));
        out.extend(self.histograms().into_iter().map(|(k, v)| (k, Metric::Histogram(v))));
        out.extend(self.meters().into_iter().map(|(k, v)| (k, Metric::Meter(v))));
        out.extend(self.timers().into_iter().map(|(k, v)| (k, Metric::Timer(v))));
        out.extend(self.gauges().into_iter().map(|(k, v)| (k, Metric::Gauge(v))));
        out
    }

    pub fn len(&self) -> usize {
        self.counters.len()
            + self.histograms.len()
            + self.meters.len()
            + self.timers.len()
            + self.gauges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deregister every metric.
    pub fn clear(&self) {
        self.counters.clear();
        self.histograms.clear();
        self.meters.clear();
        self.timers.clear();
        self.gauges.clear();
        tracing::debug!("registry cleared");
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MetricsRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricsRegistry")
            .field("counters", &self.counters.len())
            .field("histograms", &self.histograms.len())
            .field("meters", &self.meters.len())
            .field("timers", &self.timers.len())
            .field("gauges", &self.gauges.len())
            .finish()
    }
}
