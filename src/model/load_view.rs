//! The aggregator's root state (§3 `LoadView`, `PreallocationIndex`, namespace fanout).

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::broker::BrokerState;
use super::bundle::BundleStats;
use crate::ids::{BrokerId, BundleId, NamespaceName};

/// `{bundle → broker}` index of pending placements (§3).
///
/// Duplicates information also held in each broker's
/// `preallocated_bundle_data`; this is deliberate (§9 design notes) — it
/// gives placement an O(1) `bundle → broker` lookup without touching any
/// `BrokerState`. The invariant it must uphold: `index[bundle] == broker` iff
/// `bundle` is a key of `BrokerState[broker].preallocated_bundle_data`.
#[derive(Debug, Clone, Default)]
pub struct PreallocationIndex {
    index: HashMap<BundleId, BrokerId>,
}

impl PreallocationIndex {
    pub fn get(&self, bundle: &BundleId) -> Option<&BrokerId> {
        self.index.get(bundle)
    }

    pub fn insert(&mut self, bundle: BundleId, broker: BrokerId) {
        self.index.insert(bundle, broker);
    }

    pub fn remove(&mut self, bundle: &BundleId) -> Option<BrokerId> {
        self.index.remove(bundle)
    }

    /// Remove and return every bundle preallocated to `broker` (used when
    /// reaping a dead broker, §4.3).
    pub fn remove_broker(&mut self, broker: &BrokerId) -> Vec<BundleId> {
        let removed: Vec<BundleId> = self
            .index
            .iter()
            .filter(|(_, b)| *b == broker)
            .map(|(bundle, _)| bundle.clone())
            .collect();
        for bundle in &removed {
            self.index.remove(bundle);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

/// `{broker → {namespace → set<bundleRange>}}` used for anti-affinity
/// shaping in placement (§3, §4.4 step 4).
#[derive(Debug, Clone, Default)]
pub struct NamespaceFanout {
    data: HashMap<BrokerId, HashMap<NamespaceName, HashSet<String>>>,
}

impl NamespaceFanout {
    /// Number of bundles of `namespace` that `broker` already hosts or has
    /// been preallocated.
    pub fn count_for(&self, broker: &BrokerId, namespace: &NamespaceName) -> usize {
        self.data
            .get(broker)
            .and_then(|by_ns| by_ns.get(namespace))
            .map(HashSet::len)
            .unwrap_or(0)
    }

    /// Record that `broker` now owns or has been preallocated `bundle`
    /// (§4.4 step 9).
    pub fn insert(&mut self, broker: &BrokerId, bundle: &BundleId) {
        self.data
            .entry(broker.clone())
            .or_default()
            .entry(bundle.namespace())
            .or_default()
            .insert(bundle.range().to_string());
    }

    /// Rebuild `broker`'s fanout entirely from the union of its owned and
    /// preallocated bundles (§4.3 `updateBundleData`: "rebuild
    /// brokerToNamespaceToBundleRange[B]").
    pub fn rebuild_for_broker<'a>(
        &mut self,
        broker: &BrokerId,
        bundles: impl Iterator<Item = &'a BundleId>,
    ) {
        let mut by_ns: HashMap<NamespaceName, HashSet<String>> = HashMap::new();
        for bundle in bundles {
            by_ns
                .entry(bundle.namespace())
                .or_default()
                .insert(bundle.range().to_string());
        }
        self.data.insert(broker.clone(), by_ns);
    }

    pub fn remove_broker(&mut self, broker: &BrokerId) {
        self.data.remove(broker);
    }
}

/// The aggregator's root state (§3).
#[derive(Debug, Clone, Default)]
pub struct LoadView {
    pub brokers: HashMap<BrokerId, BrokerState>,
    pub bundle_stats: HashMap<BundleId, BundleStats>,
    pub recently_unloaded: HashMap<BundleId, DateTime<Utc>>,
    pub preallocations: PreallocationIndex,
    pub namespace_fanout: NamespaceFanout,
}

impl LoadView {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` if `bundle` was unloaded within the last `grace` (§4.5,
    /// Testable Property 6).
    pub fn is_within_shedding_grace(&self, bundle: &BundleId, now: DateTime<Utc>, grace: Duration) -> bool {
        match self.recently_unloaded.get(bundle) {
            Some(unloaded_at) => {
                let elapsed = now.signed_duration_since(*unloaded_at);
                elapsed
                    < chrono::Duration::from_std(grace).unwrap_or(chrono::Duration::MAX)
            }
            None => false,
        }
    }

    /// Drop `recently_unloaded` entries older than `grace` (§4.5).
    pub fn prune_recently_unloaded(&mut self, now: DateTime<Utc>, grace: Duration) {
        let grace = chrono::Duration::from_std(grace).unwrap_or(chrono::Duration::MAX);
        self.recently_unloaded
            .retain(|_, unloaded_at| now.signed_duration_since(*unloaded_at) < grace);
    }

    /// Remove every broker not present in `alive`, purging their
    /// preallocations and namespace fanout too (§4.3 `reapDeadBrokers`).
    ///
    /// Returns, for each reaped broker, how many of its preallocations were
    /// purged (for observability).
    pub fn reap_dead_brokers(&mut self, alive: &HashSet<BrokerId>) -> Vec<(BrokerId, usize)> {
        let dead: Vec<BrokerId> = self
            .brokers
            .keys()
            .filter(|b| !alive.contains(*b))
            .cloned()
            .collect();
        let mut reaped = Vec::with_capacity(dead.len());
        for broker in dead {
            self.brokers.remove(&broker);
            let purged = self.preallocations.remove_broker(&broker);
            self.namespace_fanout.remove_broker(&broker);
            reaped.push((broker, purged.len()));
        }
        reaped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn broker(name: &str) -> BrokerId {
        BrokerId::advertised(name, 8080)
    }

    fn bundle(range: &str) -> BundleId {
        BundleId::from_key(format!("tenant/ns1/{range}"))
    }

    #[test]
    fn preallocation_remove_broker_clears_only_its_entries() {
        let mut index = PreallocationIndex::default();
        index.insert(bundle("a"), broker("b1"));
        index.insert(bundle("b"), broker("b2"));

        let removed = index.remove_broker(&broker("b1"));
        assert_eq!(removed, vec![bundle("a")]);
        assert_eq!(index.get(&bundle("b")), Some(&broker("b2")));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn namespace_fanout_counts_per_broker_per_namespace() {
        let mut fanout = NamespaceFanout::default();
        fanout.insert(&broker("b1"), &bundle("0x0_0x1"));
        fanout.insert(&broker("b1"), &bundle("0x1_0x2"));
        fanout.insert(&broker("b2"), &bundle("0x2_0x3"));

        let ns = bundle("0x0_0x1").namespace();
        assert_eq!(fanout.count_for(&broker("b1"), &ns), 2);
        assert_eq!(fanout.count_for(&broker("b2"), &ns), 1);
        assert_eq!(fanout.count_for(&broker("b3"), &ns), 0);
    }

    #[test]
    fn reap_dead_brokers_purges_preallocations_and_fanout() {
        let mut view = LoadView::new();
        view.brokers.insert(
            broker("b1"),
            BrokerState::new(super::super::broker::LocalBrokerData::new(
                "http://b1:8080",
                "3.0.0",
            )),
        );
        view.preallocations.insert(bundle("a"), broker("b1"));
        view.namespace_fanout.insert(&broker("b1"), &bundle("a"));

        let alive = HashSet::new();
        let reaped = view.reap_dead_brokers(&alive);

        assert_eq!(reaped, vec![(broker("b1"), 1)]);
        assert!(!view.brokers.contains_key(&broker("b1")));
        assert!(view.preallocations.is_empty());
        assert_eq!(view.namespace_fanout.count_for(&broker("b1"), &bundle("a").namespace()), 0);
    }

    #[test]
    fn shedding_grace_period_expires() {
        let mut view = LoadView::new();
        let t0 = Utc::now();
        view.recently_unloaded.insert(bundle("a"), t0);

        let grace = Duration::from_secs(60);
        assert!(view.is_within_shedding_grace(&bundle("a"), t0 + chrono::Duration::seconds(30), grace));
        assert!(!view.is_within_shedding_grace(&bundle("a"), t0 + chrono::Duration::seconds(61), grace));

        view.prune_recently_unloaded(t0 + chrono::Duration::seconds(61), grace);
        assert!(view.recently_unloaded.is_empty());
    }
}
