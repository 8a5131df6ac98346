use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use serde::Serialize;

use super::{impl_sink_attachable, Clearable, SinkSlot};
use crate::sink::Sink;

/// Incrementing and decrementing total.
#[derive(Default)]
pub struct Counter {
    value: AtomicI64,
    sink: SinkSlot,
}

/// Point-in-time counter reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CounterSummary {
    pub count: i64,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(sink: Option<Arc<dyn Sink>>) -> Self {
        Self {
            value: AtomicI64::new(0),
            sink: SinkSlot::new(sink),
        }
    }

    /// Add `delta` (may be negative). The sink receives the delta.
    pub fn inc_by(&self, delta: i64) {
        self.value.fetch_add(delta, Ordering::AcqRel);
        self.sink.add(delta as f64);
    }

    pub fn inc(&self) {
        self.inc_by(1);
    }

    pub fn dec_by(&self, delta: i64) {
        self.inc_by(delta.wrapping_neg());
    }

    pub fn dec(&self) {
        self.dec_by(1);
    }

    pub fn count(&self) -> i64 {
        self.value.load(Ordering::Acquire)
    }

    pub fn summary(&self) -> CounterSummary {
        CounterSummary {
            count: self.count(),
        }
    }
}

impl Clearable for Counter {
    fn clear(&self) {
        self.value.store(0, Ordering::Release);
        self.sink.clear();
    }
}

impl_sink_attachable!(Counter);

impl fmt::Debug for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Counter").field("count", &self.count()).finish()
    }
}
