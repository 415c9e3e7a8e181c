//! Per-broker state (§3 `BrokerState`, `LocalBrokerData`).

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::bundle::BundleData;
use crate::ids::BundleId;

/// Host resource percentages sampled from the host probe (§4.1), each in
/// `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SystemResourceUsage {
    pub cpu: f64,
    pub memory: f64,
    pub direct_memory: f64,
    pub bandwidth_in: f64,
    pub bandwidth_out: f64,
}

impl SystemResourceUsage {
    /// The maximum of the tracked resource percentages, used by the publish
    /// predicate (§4.1) and the placement overload guard (§4.4).
    pub fn max_resource_usage(&self) -> f64 {
        [
            self.cpu,
            self.memory,
            self.direct_memory,
            self.bandwidth_in,
            self.bandwidth_out,
        ]
        .into_iter()
        .fold(0.0_f64, f64::max)
    }
}

/// A broker's self-reported data, as published to
/// `/loadbalance/brokers/<advertised>` (§6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalBrokerData {
    pub web_service_url: String,
    pub version: String,
    pub resource_usage: SystemResourceUsage,
    pub last_update: DateTime<Utc>,
    /// The bundle's last reported stats, keyed by bundle. A bundle present
    /// here is, by definition, currently hosted by this broker (§3
    /// invariant: at most one owner at a time).
    pub last_stats: HashMap<BundleId, super::bundle::NamespaceBundleStats>,
    /// Bundles gained since the previous publish (§4.1 delta tracking).
    pub last_bundle_gains: HashSet<BundleId>,
    /// Bundles lost since the previous publish (§4.1 delta tracking).
    pub last_bundle_losses: HashSet<BundleId>,
}

impl LocalBrokerData {
    pub fn new(web_service_url: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            web_service_url: web_service_url.into(),
            version: version.into(),
            resource_usage: SystemResourceUsage {
                cpu: 0.0,
                memory: 0.0,
                direct_memory: 0.0,
                bandwidth_in: 0.0,
                bandwidth_out: 0.0,
            },
            last_update: Utc::now(),
            last_stats: HashMap::new(),
            last_bundle_gains: HashSet::new(),
            last_bundle_losses: HashSet::new(),
        }
    }

    pub fn num_bundles(&self) -> usize {
        self.last_stats.len()
    }

    pub fn bundles(&self) -> impl Iterator<Item = &BundleId> {
        self.last_stats.keys()
    }

    /// Sum of `msgRateIn + msgRateOut` across all currently-owned bundles,
    /// used by the publish predicate (§4.1).
    pub fn total_msg_rate(&self) -> f64 {
        self.last_stats
            .values()
            .map(|s| s.msg_rate_in + s.msg_rate_out)
            .sum()
    }

    /// Sum of `msgThroughputIn + msgThroughputOut` across all currently-owned
    /// bundles, used by the publish predicate (§4.1).
    pub fn total_msg_throughput(&self) -> f64 {
        self.last_stats
            .values()
            .map(|s| s.msg_throughput_in + s.msg_throughput_out)
            .sum()
    }
}

/// Aggregated rate/throughput over short and long windows, derived from the
/// `BundleStats` of the bundles a broker hosts or has been preallocated
/// (§3 `timeAverageData`, §6 `TimeAverageBrokerData`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeAverageData {
    pub short_term_msg_rate: f64,
    pub short_term_throughput: f64,
    pub long_term_msg_rate: f64,
    pub long_term_throughput: f64,
}

impl TimeAverageData {
    /// Recompute from the per-bundle stats this broker is responsible for
    /// (§4.3 `updateAllBrokerData`/`updateBundleData`: sum over
    /// `lastStats ∪ preallocatedBundleData.keys`).
    pub fn from_bundle_data<'a>(bundles: impl Iterator<Item = &'a BundleData>) -> Self {
        let mut acc = Self::default();
        for data in bundles {
            acc.short_term_msg_rate += data.stats.short_term_msg_rate();
            acc.short_term_throughput += data.stats.short_term_throughput();
            acc.long_term_msg_rate += data.stats.long_term_msg_rate();
            acc.long_term_throughput += data.stats.long_term_throughput();
        }
        acc
    }
}

/// One entry per live broker in the load view (§3 `BrokerState`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerState {
    pub local_data: LocalBrokerData,
    /// Bundles the leader has promised to this broker but that have not yet
    /// been observed in `local_data.last_stats` (§3, §4.4 step 9).
    pub preallocated_bundle_data: HashMap<BundleId, BundleData>,
    pub time_average: TimeAverageData,
}

impl BrokerState {
    pub fn new(local_data: LocalBrokerData) -> Self {
        Self {
            local_data,
            preallocated_bundle_data: HashMap::new(),
            time_average: TimeAverageData::default(),
        }
    }
}
