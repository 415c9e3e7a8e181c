//! Aggregator (§4.3): builds the fleet-wide `LoadView` from per-broker
//! reports. Its three operations run serially on the single-worker
//! scheduler (§5) so the view is never torn by interleaved mutation.

// Layer 1: Standard library imports
use std::collections::HashSet;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

// Layer 3: Internal module imports
use crate::hydrate::hydrate_bundle_stats;
use crate::ids::{BrokerId, BundleId};
use crate::model::{BrokerState, BundleData, LoadView, NamespaceBundleStats, TimeAverageData};
use crate::observability::{LoadManagerEvent, Monitor};
use crate::scheduler::{SchedulerTask, SchedulerTaskHandler};
use crate::store::{paths, CoordinationStore};

mod error;
pub use error::AggregatorError;

/// Builds and maintains the fleet-wide [`LoadView`] (§4.3).
///
/// Shares `view` with the placement pipeline behind the same mutex — the
/// "placement mutex" of §5. The aggregator only holds it for the duration
/// of one of its three operations; placement holds it for the whole of
/// `selectBrokerForAssignment`.
pub struct Aggregator<S, M> {
    store: S,
    view: Arc<Mutex<LoadView>>,
    monitor: M,
}

impl<S: Clone, M: Clone> Clone for Aggregator<S, M> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            view: Arc::clone(&self.view),
            monitor: self.monitor.clone(),
        }
    }
}

impl<S, M> Aggregator<S, M>
where
    S: CoordinationStore,
    M: Monitor<LoadManagerEvent>,
{
    pub fn new(store: S, view: Arc<Mutex<LoadView>>, monitor: M) -> Self {
        Self { store, view, monitor }
    }

    /// `reapDeadBrokers(alive)` (§4.3).
    pub async fn reap_dead_brokers(&self, alive: &HashSet<BrokerId>) -> Result<(), AggregatorError> {
        let reaped = {
            let mut view = self.view.lock().await;
            view.reap_dead_brokers(alive)
        };
        for (broker, reaped_preallocations) in reaped {
            let _ = self
                .monitor
                .record(LoadManagerEvent::BrokerReaped {
                    timestamp: Utc::now(),
                    broker,
                    reaped_preallocations,
                })
                .await;
        }
        Ok(())
    }

    /// `updateAllBrokerData()` (§4.3): refresh each live broker's
    /// `LocalBrokerData` from the coordination store; brokers no longer in
    /// `alive` are dropped from the view.
    pub async fn update_all_broker_data(&self, alive: &HashSet<BrokerId>) -> Result<(), AggregatorError> {
        for broker in alive {
            // A membership entry that vanished mid-read is simply dropped
            // from this pass, not treated as an error (§7).
            let local_data = match self.store.get_json(&paths::broker_znode(broker)).await? {
                Some(data) => data,
                None => continue,
            };
            let mut view = self.view.lock().await;
            match view.brokers.get_mut(broker) {
                Some(state) => state.local_data = local_data,
                None => {
                    view.brokers.insert(broker.clone(), BrokerState::new(local_data));
                }
            }
        }

        let mut view = self.view.lock().await;
        view.brokers.retain(|broker, _| alive.contains(broker));
        Ok(())
    }

    /// `updateBundleData()` (§4.3): fold each broker's `lastStats` samples
    /// into the fleet-wide bundle stats, settle preallocations that now
    /// appear in `lastStats`, recompute each broker's `timeAverageData`, and
    /// rebuild its namespace fanout entry.
    pub async fn update_bundle_data(&self) -> Result<(), AggregatorError> {
        let mut view = self.view.lock().await;
        let broker_ids: Vec<BrokerId> = view.brokers.keys().cloned().collect();
        drop(view);

        for broker in &broker_ids {
            self.update_bundle_data_for_broker(broker).await?;
        }
        Ok(())
    }

    async fn update_bundle_data_for_broker(&self, broker: &BrokerId) -> Result<(), AggregatorError> {
        let last_stats: Vec<(BundleId, NamespaceBundleStats)> = {
            let view = self.view.lock().await;
            match view.brokers.get(broker) {
                Some(state) => state
                    .local_data
                    .last_stats
                    .iter()
                    .map(|(bundle, sample)| (bundle.clone(), *sample))
                    .collect(),
                None => return Ok(()),
            }
        };

        for (bundle, sample) in &last_stats {
            let needs_hydration = {
                let view = self.view.lock().await;
                !view.bundle_stats.contains_key(bundle)
            };
            if needs_hydration {
                let hydrated = hydrate_bundle_stats(&self.store, bundle).await?;
                self.view.lock().await.bundle_stats.insert(bundle.clone(), hydrated);
            }
            let mut view = self.view.lock().await;
            if let Some(stats) = view.bundle_stats.get_mut(bundle) {
                stats.feed(sample);
            }
        }

        // A bundle settles once it's observed in *any* broker's `lastStats`,
        // not only the preallocated broker's — the namespace layer is free
        // to hand it to a different broker than the one placement picked
        // (§3 invariant, S3), so the owner to clear is whatever
        // `PreallocationIndex` currently names, not `broker` itself.
        let settled: Vec<(BundleId, BrokerId)> = {
            let view = self.view.lock().await;
            last_stats
                .iter()
                .filter_map(|(bundle, _)| view.preallocations.get(bundle).map(|owner| (bundle.clone(), owner.clone())))
                .collect()
        };

        for (bundle, owner) in &settled {
            let mut view = self.view.lock().await;
            if let Some(state) = view.brokers.get_mut(owner) {
                state.preallocated_bundle_data.remove(bundle);
            }
            view.preallocations.remove(bundle);
            drop(view);
            let _ = self
                .monitor
                .record(LoadManagerEvent::BundleSettled {
                    timestamp: Utc::now(),
                    bundle: bundle.clone(),
                    broker: broker.clone(),
                })
                .await;
        }

        let mut view = self.view.lock().await;
        let Some(state) = view.brokers.get(broker) else {
            return Ok(());
        };
        let bundle_ids: HashSet<BundleId> = state
            .local_data
            .last_stats
            .keys()
            .cloned()
            .chain(state.preallocated_bundle_data.keys().cloned())
            .collect();

        let bundle_data: Vec<BundleData> = bundle_ids
            .iter()
            .map(|bundle| {
                view.bundle_stats
                    .get(bundle)
                    .cloned()
                    .map(|stats| BundleData { stats })
                    .unwrap_or_else(BundleData::default_seeded)
            })
            .collect();
        let time_average = TimeAverageData::from_bundle_data(bundle_data.iter());

        if let Some(state) = view.brokers.get_mut(broker) {
            state.time_average = time_average;
        }
        view.namespace_fanout.rebuild_for_broker(broker, bundle_ids.iter());
        Ok(())
    }

    /// Persist aggregated bundle stats and time-averaged broker stats back
    /// to the coordination store, so a successor leader starts with warm
    /// history (§2, §4.7).
    pub async fn persist_aggregates(&self) -> Result<(), AggregatorError> {
        let (bundles, broker_averages) = {
            let view = self.view.lock().await;
            let bundles: Vec<(BundleId, BundleData)> = view
                .bundle_stats
                .iter()
                .map(|(bundle, stats)| (bundle.clone(), BundleData { stats: stats.clone() }))
                .collect();
            let broker_averages: Vec<(BrokerId, TimeAverageData)> = view
                .brokers
                .iter()
                .map(|(broker, state)| (broker.clone(), state.time_average))
                .collect();
            (bundles, broker_averages)
        };

        for (bundle, data) in bundles {
            self.store.set_json(&paths::bundle_data_path(bundle.as_str()), &data).await?;
        }
        for (broker, average) in broker_averages {
            self.store
                .set_json(&paths::broker_time_average_path(&broker), &average)
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl<S, M> SchedulerTaskHandler for Aggregator<S, M>
where
    S: CoordinationStore,
    M: Monitor<LoadManagerEvent>,
{
    /// Dispatches scheduled work onto the aggregator's three operations plus
    /// periodic persistence (§4.2, §4.7). Errors are swallowed here: each is
    /// either a transient store failure (retried on the next scheduled
    /// pass, §7) or already reported through `monitor`.
    async fn handle(&self, task: SchedulerTask) {
        match task {
            SchedulerTask::MembershipChanged(alive) => {
                let _ = self.reap_dead_brokers(&alive).await;
                let _ = self.update_all_broker_data(&alive).await;
                let _ = self.update_bundle_data().await;
            }
            SchedulerTask::BrokerDataChanged(_) => {
                let _ = self.update_bundle_data().await;
            }
            SchedulerTask::RunAggregation => {
                let alive: HashSet<BrokerId> = self.view.lock().await.brokers.keys().cloned().collect();
                let _ = self.update_all_broker_data(&alive).await;
                let _ = self.update_bundle_data().await;
            }
            SchedulerTask::PersistAggregates => {
                let _ = self.persist_aggregates().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::NamespaceName;
    use crate::model::SystemResourceUsage;
    use crate::observability::NoopMonitor;
    use crate::store::MemoryCoordinationStore;

    fn broker_data(num_bundles: usize) -> crate::model::LocalBrokerData {
        let mut data = crate::model::LocalBrokerData::new("http://b1:8080", "3.0.0");
        data.resource_usage = SystemResourceUsage {
            cpu: 0.3,
            memory: 0.0,
            direct_memory: 0.0,
            bandwidth_in: 0.0,
            bandwidth_out: 0.0,
        };
        for i in 0..num_bundles {
            data.last_stats.insert(
                BundleId::new(&NamespaceName::new("tenant/ns1"), format!("bundle-{i}")),
                NamespaceBundleStats {
                    msg_rate_in: 1.0,
                    msg_rate_out: 1.0,
                    msg_throughput_in: 1.0,
                    msg_throughput_out: 1.0,
                },
            );
        }
        data
    }

    #[tokio::test]
    async fn update_all_broker_data_ingests_store_state() {
        let store = MemoryCoordinationStore::new();
        let broker = BrokerId::advertised("b1", 8080);
        store
            .set_json(&paths::broker_znode(&broker), &broker_data(2))
            .await
            .unwrap();

        let view = Arc::new(Mutex::new(LoadView::new()));
        let aggregator = Aggregator::new(store, view.clone(), NoopMonitor::<LoadManagerEvent>::new());

        let mut alive = HashSet::new();
        alive.insert(broker.clone());
        aggregator.update_all_broker_data(&alive).await.unwrap();

        let view = view.lock().await;
        assert_eq!(view.brokers.get(&broker).unwrap().local_data.num_bundles(), 2);
    }

    #[tokio::test]
    async fn update_bundle_data_hydrates_and_feeds_new_bundles() {
        let store = MemoryCoordinationStore::new();
        let broker = BrokerId::advertised("b1", 8080);
        let view = Arc::new(Mutex::new(LoadView::new()));
        {
            let mut view = view.lock().await;
            view.brokers
                .insert(broker.clone(), BrokerState::new(broker_data(1)));
        }

        let aggregator = Aggregator::new(store, view.clone(), NoopMonitor::<LoadManagerEvent>::new());
        aggregator.update_bundle_data().await.unwrap();

        let view = view.lock().await;
        assert_eq!(view.bundle_stats.len(), 1);
        let bundle = BundleId::new(&NamespaceName::new("tenant/ns1"), "bundle-0");
        assert!(view.bundle_stats.contains_key(&bundle));
        assert_eq!(
            view.brokers.get(&broker).unwrap().time_average.short_term_msg_rate,
            view.bundle_stats.get(&bundle).unwrap().short_term_msg_rate()
        );
    }

    #[tokio::test]
    async fn update_bundle_data_settles_preallocation_once_observed() {
        let store = MemoryCoordinationStore::new();
        let broker = BrokerId::advertised("b1", 8080);
        let bundle = BundleId::new(&NamespaceName::new("tenant/ns1"), "bundle-0");
        let view = Arc::new(Mutex::new(LoadView::new()));
        {
            let mut view = view.lock().await;
            let mut state = BrokerState::new(broker_data(1));
            state
                .preallocated_bundle_data
                .insert(bundle.clone(), BundleData::default_seeded());
            view.brokers.insert(broker.clone(), state);
            view.preallocations.insert(bundle.clone(), broker.clone());
        }

        let aggregator = Aggregator::new(store, view.clone(), NoopMonitor::<LoadManagerEvent>::new());
        aggregator.update_bundle_data().await.unwrap();

        let view = view.lock().await;
        assert!(view.preallocations.get(&bundle).is_none());
        assert!(!view
            .brokers
            .get(&broker)
            .unwrap()
            .preallocated_bundle_data
            .contains_key(&bundle));
    }

    #[tokio::test]
    async fn update_bundle_data_settles_preallocation_reported_by_a_different_broker() {
        let store = MemoryCoordinationStore::new();
        let preallocated_to = BrokerId::advertised("a", 8080);
        let actual_owner = BrokerId::advertised("b", 8080);
        let bundle = BundleId::new(&NamespaceName::new("tenant/ns1"), "bundle-0");
        let view = Arc::new(Mutex::new(LoadView::new()));
        {
            let mut view = view.lock().await;
            let mut a_state = BrokerState::new(broker_data(0));
            a_state
                .preallocated_bundle_data
                .insert(bundle.clone(), BundleData::default_seeded());
            view.brokers.insert(preallocated_to.clone(), a_state);
            view.brokers.insert(actual_owner.clone(), BrokerState::new(broker_data(1)));
            view.preallocations.insert(bundle.clone(), preallocated_to.clone());
        }

        let aggregator = Aggregator::new(store, view.clone(), NoopMonitor::<LoadManagerEvent>::new());
        aggregator.update_bundle_data().await.unwrap();

        let view = view.lock().await;
        assert!(view.preallocations.get(&bundle).is_none());
        assert!(!view
            .brokers
            .get(&preallocated_to)
            .unwrap()
            .preallocated_bundle_data
            .contains_key(&bundle));
    }

    #[tokio::test]
    async fn reap_dead_brokers_reports_purged_count() {
        let store = MemoryCoordinationStore::new();
        let broker = BrokerId::advertised("b1", 8080);
        let bundle = BundleId::new(&NamespaceName::new("tenant/ns1"), "bundle-0");
        let view = Arc::new(Mutex::new(LoadView::new()));
        {
            let mut view = view.lock().await;
            view.brokers
                .insert(broker.clone(), BrokerState::new(broker_data(0)));
            view.preallocations.insert(bundle, broker.clone());
        }

        let aggregator = Aggregator::new(store, view.clone(), NoopMonitor::<LoadManagerEvent>::new());
        aggregator.reap_dead_brokers(&HashSet::new()).await.unwrap();

        let view = view.lock().await;
        assert!(!view.brokers.contains_key(&broker));
        assert!(view.preallocations.is_empty());
    }
}
