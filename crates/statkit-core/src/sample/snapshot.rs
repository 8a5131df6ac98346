use serde::Serialize;

use crate::error::{Result, StatkitError};

/// Immutable, sorted copy of a reservoir's values.
///
/// Quantiles use nearest rank with linear interpolation: for `n` values the
/// position of quantile `q` is `q * (n + 1)`, clamped to the first and last
/// value. Every read on an empty snapshot returns `0.0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    values: Vec<f64>,
}

impl Snapshot {
    /// Build a snapshot; `values` need not be sorted.
    pub fn new(mut values: Vec<f64>) -> Self {
        values.sort_by(f64::total_cmp);
        Self { values }
    }

    /// Value at `quantile` (in `[0, 1]`).
    pub fn value(&self, quantile: f64) -> Result<f64> {
        if !(0.0..=1.0).contains(&quantile) {
            return Err(StatkitError::InvalidQuantile(quantile));
        }
        Ok(self.value_unchecked(quantile))
    }

    fn value_unchecked(&self, quantile: f64) -> f64 {
        let (Some(&first), Some(&last)) = (self.values.first(), self.values.last()) else {
            return 0.0;
        };

        let pos = quantile * (self.values.len() + 1) as f64;
        if pos < 1.0 {
            return first;
        }
        if pos >= self.values.len() as f64 {
            return last;
        }

        let rank = pos.floor();
        // 1 <= rank < len, so both ranks are in bounds.
        let idx = rank as usize;
        let lower = self.values[idx - 1];
        let upper = self.values[idx];
        lower + (pos - rank) * (upper - lower)
    }

    pub fn median(&self) -> f64 {
        self.value_unchecked(0.5)
    }

    pub fn percentile_75(&self) -> f64 {
        self.value_unchecked(0.75)
    }

    pub fn percentile_95(&self) -> f64 {
        self.value_unchecked(0.95)
    }

    pub fn percentile_98(&self) -> f64 {
        self.value_unchecked(0.98)
    }

    pub fn percentile_99(&self) -> f64 {
        self.value_unchecked(0.99)
    }

    pub fn percentile_999(&self) -> f64 {
        self.value_unchecked(0.999)
    }

    /// Number of values in the snapshot.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Sorted values, smallest first.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn min(&self) -> f64 {
        self.values.first().copied().unwrap_or(0.0)
    }

    pub fn max(&self) -> f64 {
        self.values.last().copied().unwrap_or(0.0)
    }

    /// Arithmetic mean of the retained values (not of the whole stream).
    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }
}
