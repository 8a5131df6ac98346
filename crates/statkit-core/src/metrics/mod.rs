//! The five metric kinds.
//!
//! Each kind keeps its mutable state behind one instance-local lock (or a
//! single atomic for the counter) and exposes two capabilities:
//! - [`Clearable`]: reset accumulated state, including the attached sink.
//! - [`SinkAttachable`]: attach a raw-value [`Sink`] fed on every write.
//!
//! Sinks are always invoked after the metric's own lock is released.

pub mod counter;
pub mod gauge;
pub mod histogram;
pub mod meter;
pub mod timer;

use std::sync::{Arc, RwLock};

use crate::sink::Sink;
use crate::sync::{read, write};

pub use counter::{Counter, CounterSummary};
pub use gauge::{Gauge, GaugeValue};
pub use histogram::{Histogram, HistogramOptions, HistogramSummary};
pub use meter::{Meter, MeterSummary};
pub use timer::{Timer, TimerContext, TimerSummary};

/// Metrics whose accumulated state can be reset.
pub trait Clearable {
    /// Reset the metric to its freshly created state. Irreversible.
    fn clear(&self);
}

/// Metrics that forward raw values to an optional [`Sink`].
pub trait SinkAttachable {
    /// Attach `sink`, replacing any previous one.
    fn attach_sink(&self, sink: Arc<dyn Sink>);
    fn sink(&self) -> Option<Arc<dyn Sink>>;
}

/// Optional sink shared by all kinds.
#[derive(Default)]
pub(crate) struct SinkSlot {
    slot: RwLock<Option<Arc<dyn Sink>>>,
}

impl SinkSlot {
    pub(crate) fn new(sink: Option<Arc<dyn Sink>>) -> Self {
        Self {
            slot: RwLock::new(sink),
        }
    }

    pub(crate) fn set(&self, sink: Arc<dyn Sink>) {
        *write(&self.slot) = Some(sink);
    }

    pub(crate) fn get(&self) -> Option<Arc<dyn Sink>> {
        read(&self.slot).clone()
    }

    pub(crate) fn add(&self, value: f64) {
        if let Some(sink) = self.get() {
            sink.add(value);
        }
    }

    pub(crate) fn clear(&self) {
        if let Some(sink) = self.get() {
            sink.clear();
        }
    }
}

macro_rules! impl_sink_attachable {
    ($ty:ty) => {
        impl $crate::metrics::SinkAttachable for $ty {
            fn attach_sink(&self, sink: ::std::sync::Arc<dyn $crate::sink::Sink>) {
                self.sink.set(sink);
            }

            fn sink(&self) -> Option<::std::sync::Arc<dyn $crate::sink::Sink>> {
                self.sink.get()
            }
        }
    };
}

pub(crate) use impl_sink_attachable;
