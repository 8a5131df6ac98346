use std::fmt;
use std::sync::Mutex;

use serde::Serialize;

use super::{impl_sink_attachable, Clearable, SinkSlot};
use crate::error::{Result, StatkitError};
use crate::sync::lock;

/// Value reported by a gauge.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GaugeValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl GaugeValue {
    /// Numeric view (`true` is 1); `None` for text.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            GaugeValue::Int(v) => Some(*v as f64),
            GaugeValue::Float(v) => Some(*v),
            GaugeValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            GaugeValue::Text(_) => None,
        }
    }
}

impl Default for GaugeValue {
    fn default() -> Self {
        GaugeValue::Float(0.0)
    }
}

impl From<i64> for GaugeValue {
    fn from(v: i64) -> Self {
        GaugeValue::Int(v)
    }
}

impl From<f64> for GaugeValue {
    fn from(v: f64) -> Self {
        GaugeValue::Float(v)
    }
}

impl From<bool> for GaugeValue {
    fn from(v: bool) -> Self {
        GaugeValue::Bool(v)
    }
}

impl From<String> for GaugeValue {
    fn from(v: String) -> Self {
        GaugeValue::Text(v)
    }
}

impl From<&str> for GaugeValue {
    fn from(v: &str) -> Self {
        GaugeValue::Text(v.to_string())
    }
}

type Accessor = Box<dyn Fn() -> GaugeValue + Send + Sync>;

enum Source {
    Accessor(Accessor),
    Cell(Mutex<GaugeValue>),
}

/// Externally supplied value: an accessor called on every read, or a settable cell.
pub struct Gauge {
    source: Source,
    sink: SinkSlot,
}

impl Gauge {
    /// Gauge re-evaluating `f` on every [`Gauge::value`] call.
    pub fn from_fn<F, V>(f: F) -> Self
    where
        F: Fn() -> V + Send + Sync + 'static,
        V: Into<GaugeValue>,
    {
        Self {
            source: Source::Accessor(Box::new(move || f().into())),
            sink: SinkSlot::default(),
        }
    }

    /// Settable gauge starting at `initial`.
    pub fn settable(initial: impl Into<GaugeValue>) -> Self {
        Self {
            source: Source::Cell(Mutex::new(initial.into())),
            sink: SinkSlot::default(),
        }
    }

    pub fn value(&self) -> GaugeValue {
        match &self.source {
            Source::Accessor(f) => f(),
            Source::Cell(cell) => lock(cell).clone(),
        }
    }

    /// Set the value of a settable gauge. Numeric values are forwarded to the sink.
    pub fn set_value(&self, value: impl Into<GaugeValue>) -> Result<()> {
        let Source::Cell(cell) = &self.source else {
            return Err(StatkitError::ReadOnlyGauge);
        };
        let value = value.into();
        let numeric = value.as_f64();
        *lock(cell) = value;
        if let Some(v) = numeric {
            self.sink.add(v);
        }
        Ok(())
    }

    pub fn is_settable(&self) -> bool {
        matches!(self.source, Source::Cell(_))
    }
}

impl Default for Gauge {
    fn default() -> Self {
        Self::settable(GaugeValue::default())
    }
}

// A gauge mirrors external state, so clearing leaves the value alone.
impl Clearable for Gauge {
    fn clear(&self) {
        self.sink.clear();
    }
}

impl_sink_attachable!(Gauge);

impl fmt::Debug for Gauge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_settable() { "settable" } else { "accessor" };
        f.debug_struct("Gauge").field("source", &kind).finish()
    }
}
