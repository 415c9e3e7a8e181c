//! Per-bundle rolling statistics (§3 `BundleStats`).

use serde::{Deserialize, Serialize};

use super::window::RollingWindow;
use crate::config::{DEFAULT_SEED_MSG_RATE, DEFAULT_SEED_THROUGHPUT, N_LONG, N_SHORT};

/// A single as-reported sample for one bundle, taken from a broker's
/// `lastStats` (§4.3).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NamespaceBundleStats {
    pub msg_rate_in: f64,
    pub msg_rate_out: f64,
    pub msg_throughput_in: f64,
    pub msg_throughput_out: f64,
}

/// A short-term/long-term window pair tracking one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowPair {
    pub short_term: RollingWindow,
    pub long_term: RollingWindow,
}

impl WindowPair {
    fn new() -> Self {
        Self {
            short_term: RollingWindow::new(N_SHORT),
            long_term: RollingWindow::new(N_LONG),
        }
    }

    fn seeded_saturated(value: f64) -> Self {
        Self {
            short_term: RollingWindow::seeded_saturated(N_SHORT, value),
            long_term: RollingWindow::seeded_saturated(N_LONG, value),
        }
    }

    fn update(&mut self, sample: f64) {
        self.short_term.update(sample);
        self.long_term.update(sample);
    }
}

/// Rolling statistics for one bundle: message rate in/out, throughput
/// in/out, each tracked over both the short and long window (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleStats {
    pub msg_rate_in: WindowPair,
    pub msg_rate_out: WindowPair,
    pub msg_throughput_in: WindowPair,
    pub msg_throughput_out: WindowPair,
}

impl BundleStats {
    /// Initialize with the default seed (§4.3: rate=50 msg/s,
    /// throughput=50000 B/s) for a bundle with neither persisted state nor a
    /// legacy quota.
    pub fn default_seeded() -> Self {
        Self {
            msg_rate_in: WindowPair::seeded_saturated(DEFAULT_SEED_MSG_RATE),
            msg_rate_out: WindowPair::seeded_saturated(DEFAULT_SEED_MSG_RATE),
            msg_throughput_in: WindowPair::seeded_saturated(DEFAULT_SEED_THROUGHPUT),
            msg_throughput_out: WindowPair::seeded_saturated(DEFAULT_SEED_THROUGHPUT),
        }
    }

    /// Seed from a legacy `ResourceQuota` (§6 legacy seeding): both windows
    /// start saturated so the next real sample carries low weight.
    pub fn from_legacy_quota(quota: &ResourceQuota) -> Self {
        Self {
            msg_rate_in: WindowPair::seeded_saturated(quota.msg_rate_in),
            msg_rate_out: WindowPair::seeded_saturated(quota.msg_rate_out),
            msg_throughput_in: WindowPair::seeded_saturated(quota.bandwidth_in),
            msg_throughput_out: WindowPair::seeded_saturated(quota.bandwidth_out),
        }
    }

    /// An unseeded, empty set of windows (used only when hydrating from a
    /// persisted `BundleData` blob that carries its own window state).
    pub fn empty() -> Self {
        Self {
            msg_rate_in: WindowPair::new(),
            msg_rate_out: WindowPair::new(),
            msg_throughput_in: WindowPair::new(),
            msg_throughput_out: WindowPair::new(),
        }
    }

    /// Feed a new sample into all four metrics' short and long windows
    /// (§4.3 `updateBundleData`).
    pub fn feed(&mut self, sample: &NamespaceBundleStats) {
        self.msg_rate_in.update(sample.msg_rate_in);
        self.msg_rate_out.update(sample.msg_rate_out);
        self.msg_throughput_in.update(sample.msg_throughput_in);
        self.msg_throughput_out.update(sample.msg_throughput_out);
    }

    /// Sum of short-window message rate averages (in + out).
    pub fn short_term_msg_rate(&self) -> f64 {
        self.msg_rate_in.short_term.average() + self.msg_rate_out.short_term.average()
    }

    /// Sum of short-window throughput averages (in + out).
    pub fn short_term_throughput(&self) -> f64 {
        self.msg_throughput_in.short_term.average() + self.msg_throughput_out.short_term.average()
    }

    /// Sum of long-window message rate averages (in + out).
    pub fn long_term_msg_rate(&self) -> f64 {
        self.msg_rate_in.long_term.average() + self.msg_rate_out.long_term.average()
    }

    /// Sum of long-window throughput averages (in + out).
    pub fn long_term_throughput(&self) -> f64 {
        self.msg_throughput_in.long_term.average() + self.msg_throughput_out.long_term.average()
    }

    /// A persistable snapshot suitable for `/loadbalance/bundle-data/<bundle>` (§6).
    pub fn to_bundle_data(&self) -> BundleData {
        BundleData {
            stats: self.clone(),
        }
    }
}

/// Legacy per-namespace resource quota (§6 `resource-quota/namespace`),
/// kept only as a seeding source for bundles with no `bundle-data` entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceQuota {
    pub msg_rate_in: f64,
    pub msg_rate_out: f64,
    pub bandwidth_in: f64,
    pub bandwidth_out: f64,
}

/// The persisted/hydrated form of a bundle's statistics
/// (`/loadbalance/bundle-data/<bundle>`, §6), and the shape placement
/// materializes in step 2 of `selectBrokerForAssignment` (§4.4).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleData {
    pub stats: BundleStats,
}

impl BundleData {
    pub fn default_seeded() -> Self {
        Self {
            stats: BundleStats::default_seeded(),
        }
    }

    pub fn from_legacy_quota(quota: &ResourceQuota) -> Self {
        Self {
            stats: BundleStats::from_legacy_quota(quota),
        }
    }
}
