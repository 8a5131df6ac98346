//! Raw-sink aggregate payload.
//!
//! Built from the per-metric sinks a registry attaches through
//! [`statkit_core::AggregateSink::factory`]. Each counter and timer whose sink
//! saw at least one value since the last collection contributes its totals;
//! the sink is drained as it is read. Numeric gauges are reported by value.
//!
//! ```json
//! {
//!   "agent": { "host": "web-1", "pid": 4242, "version": "0.1.0" },
//!   "components": [{
//!     "guid": "io.statkit",
//!     "name": "statkit",
//!     "duration": 5,
//!     "metrics": {
//!       "Component/db/query": { "total": 1.5, "count": 3, "min": 0.25, "max": 1.0, "sum_of_squares": 1.125 },
//!       "Component/queue_depth": 10
//!     }
//!   }]
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::sync::Arc;

use serde::Serialize;
use statkit_core::error::{Result, StatkitError};
use statkit_core::{GaugeValue, MetricsRegistry, SinkAttachable, SinkSummary};

use crate::config::ReporterSection;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Payload {
    pub agent: Agent,
    pub components: Vec<Component>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Agent {
    pub host: String,
    pub pid: u32,
    pub version: String,
}

/// Host name of this machine, falling back to `localhost`.
pub fn hostname() -> String {
    ["/etc/hostname", "/proc/sys/kernel/hostname"]
        .iter()
        .filter_map(|path| fs::read_to_string(path).ok())
        .map(|s| s.trim().to_string())
        .chain(std::env::var("HOSTNAME").ok())
        .find(|h| !h.is_empty())
        .unwrap_or_else(|| "localhost".into())
}

impl Agent {
    pub fn current() -> Self {
        Self {
            host: hostname(),
            pid: std::process::id(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Component {
    pub guid: String,
    pub name: String,
    /// Reporting interval in seconds.
    pub duration: u64,
    /// Keyed `Component/{prefix}{name}` with `.` mapped to `/`; sorted.
    pub metrics: BTreeMap<String, MetricValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Aggregate(Totals),
    Value(GaugeValue),
}

/// Sink totals with empty min/max reported as 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Totals {
    pub total: f64,
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub sum_of_squares: f64,
}

impl From<SinkSummary> for Totals {
    fn from(s: SinkSummary) -> Self {
        Self {
            total: s.total,
            count: s.count,
            min: s.min_or_zero(),
            max: s.max_or_zero(),
            sum_of_squares: s.sum_of_squares,
        }
    }
}

pub fn metric_key(prefix: &str, name: &str) -> String {
    format!("Component/{prefix}{name}").replace('.', "/")
}

/// Drain the metric's sink; `None` when it has no aggregating sink or saw nothing.
fn drain(metric: &dyn SinkAttachable) -> Option<Totals> {
    let summary = metric.sink()?.take()?;
    (summary.count > 0).then(|| summary.into())
}

fn collect_metrics(registry: &MetricsRegistry, prefix: &str) -> BTreeMap<String, MetricValue> {
    let mut out = BTreeMap::new();

    let timers = registry.timers().into_iter().map(|(k, v)| (k, v as Arc<dyn SinkAttachable>));
    let counters = registry.counters().into_iter().map(|(k, v)| (k, v as Arc<dyn SinkAttachable>));
    for (name, metric) in timers.chain(counters) {
        if let Some(totals) = drain(metric.as_ref()) {
            out.insert(metric_key(prefix, &name), MetricValue::Aggregate(totals));
        }
    }

    for (name, gauge) in registry.gauges() {
        let value = gauge.value();
        if value.as_f64().is_some() {
            out.insert(metric_key(prefix, &name), MetricValue::Value(value));
        }
    }

    out
}

/// Build the payload for one reporting interval, draining every sink read.
pub fn collect(registry: &MetricsRegistry, cfg: &ReporterSection) -> Payload {
    Payload {
        agent: Agent::current(),
        components: vec![Component {
            guid: cfg.guid.clone(),
            name: cfg.name.clone(),
            duration: cfg.interval_secs,
            metrics: collect_metrics(registry, &cfg.prefix),
        }],
    }
}

pub fn to_json(payload: &Payload) -> Result<String> {
    serde_json::to_string(payload)
        .map_err(|e| StatkitError::Report(format!("payload serialization failed: {e}")))
}
