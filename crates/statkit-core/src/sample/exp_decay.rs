//! Exponentially decaying reservoir (forward decay).
//!
//! Each observation gets the priority `exp(alpha * (t - landmark)) / u` with
//! `u` uniform in `(0, 1]`, and the reservoir keeps the `size` highest
//! priorities seen so far. Priorities are stored as their natural log,
//! `alpha * (t - landmark) - ln(u)`, which stays finite for any `alpha`.
//! Newer observations carry exponentially larger weights, so the sample
//! tracks roughly the last few minutes of data (`alpha = 0.015` biases toward
//! the last five) while memory stays bounded.
//!
//! Weights grow without bound as `t` moves away from the landmark, so once an
//! hour all priorities are rescaled against a fresh landmark. In log space a
//! rescale subtracts the same shift from every priority: retained values and
//! their relative order do not change.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::fmt;
use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{Reservoir, Snapshot};
use crate::clock::Clock;
use crate::sync::lock;

/// Default number of retained values.
pub const DEFAULT_SIZE: usize = 1028;
/// Default decay factor (biases the sample toward the last ~5 minutes).
pub const DEFAULT_ALPHA: f64 = 0.015;
/// Seconds between landmark rescales.
pub const RESCALE_THRESHOLD: f64 = 60.0 * 60.0;

#[derive(Debug, Clone, Copy)]
struct Weighted {
    // ln of the forward-decay priority
    priority: f64,
    value: f64,
}

impl PartialEq for Weighted {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Weighted {}

impl PartialOrd for Weighted {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Weighted {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority.total_cmp(&other.priority)
    }
}

struct State {
    // Min-heap on priority: the root is the next eviction candidate.
    heap: BinaryHeap<Reverse<Weighted>>,
    count: u64,
    start_time: f64,
    next_rescale: f64,
    rng: StdRng,
}

impl State {
    fn reset(&mut self, now: f64) {
        self.heap.clear();
        self.count = 0;
        self.start_time = now;
        self.next_rescale = now + RESCALE_THRESHOLD;
    }

    fn rescale(&mut self, now: f64, alpha: f64) {
        let shift = alpha * (now - self.start_time);
        let mut entries = std::mem::take(&mut self.heap).into_vec();
        for Reverse(w) in entries.iter_mut() {
            w.priority -= shift;
        }
        self.heap = BinaryHeap::from(entries);
        tracing::trace!(
            landmark = now,
            shift,
            retained = self.heap.len(),
            "reservoir landmark rescaled"
        );
        self.start_time = now;
        self.next_rescale = now + RESCALE_THRESHOLD;
    }
}

/// Forward-decaying weighted reservoir.
pub struct ExpDecayingSample {
    size: usize,
    alpha: f64,
    clock: Arc<dyn Clock>,
    state: Mutex<State>,
}

impl ExpDecayingSample {
    /// Reservoir holding at most `size` values, decaying with `alpha`.
    pub fn new(size: usize, alpha: f64, clock: Arc<dyn Clock>) -> Self {
        Self::with_rng(size, alpha, clock, StdRng::from_entropy())
    }

    /// Same as [`ExpDecayingSample::new`] with a fixed RNG seed (reproducible runs).
    pub fn seeded(size: usize, alpha: f64, clock: Arc<dyn Clock>, seed: u64) -> Self {
        Self::with_rng(size, alpha, clock, StdRng::seed_from_u64(seed))
    }

    fn with_rng(size: usize, alpha: f64, clock: Arc<dyn Clock>, rng: StdRng) -> Self {
        let size = size.max(1);
        let now = clock.now();
        Self {
            size,
            alpha,
            state: Mutex::new(State {
                heap: BinaryHeap::with_capacity(size),
                count: 0,
                start_time: now,
                next_rescale: now + RESCALE_THRESHOLD,
                rng,
            }),
            clock,
        }
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.size
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Observations offered since creation or the last clear (retained or not).
    pub fn count(&self) -> u64 {
        lock(&self.state).count
    }

    /// Current landmark, in clock seconds.
    pub fn landmark(&self) -> f64 {
        lock(&self.state).start_time
    }
}

impl Reservoir for ExpDecayingSample {
    fn update(&self, value: f64) {
        let now = self.clock.now();
        let mut st = lock(&self.state);

        if now >= st.next_rescale {
            st.rescale(now, self.alpha);
        }

        // gen() is in [0, 1); flip it so ln(u) is always finite.
        let u = 1.0 - st.rng.gen::<f64>();
        let priority = self.alpha * (now - st.start_time) - u.ln();
        let entry = Weighted { priority, value };
        st.count += 1;

        if st.heap.len() < self.size {
            st.heap.push(Reverse(entry));
        } else if let Some(mut lowest) = st.heap.peek_mut() {
            if lowest.0.priority < priority {
                *lowest = Reverse(entry);
            }
        }
    }

    fn snapshot(&self) -> Snapshot {
        let values: Vec<f64> = {
            let st = lock(&self.state);
            st.heap.iter().map(|Reverse(w)| w.value).collect()
        };
        Snapshot::new(values)
    }

    fn clear(&self) {
        let now = self.clock.now();
        lock(&self.state).reset(now);
    }

    fn len(&self) -> usize {
        lock(&self.state).heap.len()
    }
}

impl fmt::Debug for ExpDecayingSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpDecayingSample")
            .field("size", &self.size)
            .field("alpha", &self.alpha)
            .field("retained", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    #[test]
    fn rescale_keeps_values_and_order() {
        let clock = Arc::new(ManualClock::new());
        let sample = ExpDecayingSample::seeded(8, DEFAULT_ALPHA, clock.clone(), 7);
        for i in 0..8 {
            sample.update(i as f64);
            clock.advance(60.0);
        }

        let before: Vec<(f64, f64)> = {
            let st = lock(&sample.state);
            let mut v: Vec<_> = st.heap.iter().map(|Reverse(w)| (w.priority, w.value)).collect();
            v.sort_by(|a, b| a.0.total_cmp(&b.0));
            v
        };

        clock.set(RESCALE_THRESHOLD + 1.0);
        {
            let mut st = lock(&sample.state);
            st.rescale(clock.now(), DEFAULT_ALPHA);
        }

        let after: Vec<(f64, f64)> = {
            let st = lock(&sample.state);
            let mut v: Vec<_> = st.heap.iter().map(|Reverse(w)| (w.priority, w.value)).collect();
            v.sort_by(|a, b| a.0.total_cmp(&b.0));
            v
        };

        let order_before: Vec<f64> = before.iter().map(|p| p.1).collect();
        let order_after: Vec<f64> = after.iter().map(|p| p.1).collect();
        assert_eq!(order_before, order_after);
        assert!(after.iter().zip(&before).all(|(a, b)| a.0 < b.0));
        assert_eq!(sample.landmark(), RESCALE_THRESHOLD + 1.0);
    }

    fn priorities_by_rank(sample: &ExpDecayingSample) -> Vec<(f64, f64)> {
        let st = lock(&sample.state);
        let mut v: Vec<_> = st.heap.iter().map(|Reverse(w)| (w.priority, w.value)).collect();
        v.sort_by(|a, b| a.0.total_cmp(&b.0));
        v
    }

    #[test]
    fn rescale_after_long_idle_keeps_distinct_finite_priorities() {
        let clock = Arc::new(ManualClock::new());
        let sample = ExpDecayingSample::seeded(16, DEFAULT_ALPHA, clock.clone(), 11);
        for i in 0..16 {
            sample.update(i as f64);
        }
        let before = priorities_by_rank(&sample);

        // 20 hours idle: exp(-alpha * elapsed) would underflow to zero.
        clock.set(20.0 * RESCALE_THRESHOLD);
        lock(&sample.state).rescale(clock.now(), DEFAULT_ALPHA);

        let after = priorities_by_rank(&sample);
        assert!(after.iter().all(|(p, _)| p.is_finite()));
        assert!(after.windows(2).all(|w| w[0].0 < w[1].0));
        let values_before: Vec<f64> = before.iter().map(|p| p.1).collect();
        let values_after: Vec<f64> = after.iter().map(|p| p.1).collect();
        assert_eq!(values_before, values_after);
    }
}
