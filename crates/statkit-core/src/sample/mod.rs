//! Bounded samples of observed values (for quantile estimation).
//!
//! A [`Reservoir`] keeps a fixed-size, representative subset of a stream and
//! hands out sorted point-in-time [`Snapshot`]s. [`ExpDecayingSample`] is the
//! forward-decaying implementation every histogram uses by default.

pub mod exp_decay;
pub mod snapshot;

pub use exp_decay::{ExpDecayingSample, DEFAULT_ALPHA, DEFAULT_SIZE};
pub use snapshot::Snapshot;

/// Bounded sample of a value stream.
pub trait Reservoir: Send + Sync {
    /// Offer a new observation to the sample.
    fn update(&self, value: f64);
    /// Sorted copy of the retained values.
    fn snapshot(&self) -> Snapshot;
    /// Drop every retained value.
    fn clear(&self);
    /// Number of values currently retained.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
