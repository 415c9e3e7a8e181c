//! Rolling-average windows (§3: short-term N_SHORT, long-term N_LONG).

use serde::{Deserialize, Serialize};

/// A capacity-bounded running average.
///
/// While the window has seen fewer than `capacity` samples, each new sample
/// is folded in with weight `1 / num_samples` — an ordinary cumulative
/// mean. Once `num_samples` reaches `capacity`, the weight stays pinned at
/// `1 / capacity`: every further sample is an exponential moving average
/// update, so the influence of the oldest samples decays geometrically
/// rather than being evicted explicitly (§3, §9 "exponential-style
/// displacement"). No sample history is ever stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RollingWindow {
    capacity: usize,
    num_samples: usize,
    average: f64,
}

impl RollingWindow {
    /// An empty window with the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            num_samples: 0,
            average: 0.0,
        }
    }

    /// A window hydrated as already-saturated with `average`, used when
    /// seeding from a legacy `ResourceQuota` (§6: marked saturated so the
    /// next real sample carries low weight).
    pub fn seeded_saturated(capacity: usize, average: f64) -> Self {
        Self {
            capacity,
            num_samples: capacity,
            average,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    pub fn average(&self) -> f64 {
        self.average
    }

    pub fn is_saturated(&self) -> bool {
        self.num_samples >= self.capacity
    }

    /// Fold in a new sample (§3 update contract).
    pub fn update(&mut self, sample: f64) {
        if self.num_samples < self.capacity {
            self.num_samples += 1;
        }
        self.average += (sample - self.average) / self.num_samples as f64;
    }
}
