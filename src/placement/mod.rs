//! Placement pipeline (§4.4): `selectBrokerForAssignment`.

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
use chrono::Utc;
use tokio::sync::Mutex;

// Layer 3: Internal module imports
use crate::config::LoadManagerConfig;
use crate::hydrate::hydrate_bundle_stats;
use crate::ids::{BrokerId, BundleId, NamespaceName};
use crate::model::{BundleData, LoadView};
use crate::observability::{LoadManagerEvent, Monitor};
use crate::store::CoordinationStore;

mod error;
pub mod filters;
pub mod strategy;
mod traits;

pub use error::{FilterError, PlacementError};
pub use traits::{BrokerFilter, NamespacePolicy, PlacementStrategy};

/// `selectBrokerForAssignment` (§4.4), holding the single placement mutex
/// for its whole body (§5).
pub struct PlacementPipeline<S, P, T, M> {
    store: S,
    view: Arc<Mutex<LoadView>>,
    policy: P,
    filters: Vec<Box<dyn BrokerFilter>>,
    strategy: T,
    monitor: M,
    config: LoadManagerConfig,
}

impl<S, P, T, M> PlacementPipeline<S, P, T, M>
where
    S: CoordinationStore,
    P: NamespacePolicy,
    T: PlacementStrategy,
    M: Monitor<LoadManagerEvent>,
{
    pub fn new(
        store: S,
        view: Arc<Mutex<LoadView>>,
        policy: P,
        filters: Vec<Box<dyn BrokerFilter>>,
        strategy: T,
        monitor: M,
        config: LoadManagerConfig,
    ) -> Self {
        Self {
            store,
            view,
            policy,
            filters,
            strategy,
            monitor,
            config,
        }
    }

    /// Removes brokers tying for the maximum bundle count of `namespace`
    /// among `candidates` (§4.4 step 4). Returns an empty vec if this would
    /// remove every candidate — the caller treats that as "skip this step".
    fn anti_affinity_shaped(&self, candidates: &[BrokerId], namespace: &NamespaceName, view: &LoadView) -> Vec<BrokerId> {
        if candidates.is_empty() {
            return Vec::new();
        }
        let counts: Vec<(BrokerId, usize)> = candidates
            .iter()
            .map(|broker| (broker.clone(), view.namespace_fanout.count_for(broker, namespace)))
            .collect();
        let max_count = counts.iter().map(|(_, count)| *count).max().unwrap_or(0);
        counts
            .into_iter()
            .filter(|(_, count)| *count != max_count)
            .map(|(broker, _)| broker)
            .collect()
    }

    /// `selectBrokerForAssignment(serviceUnit) → broker` (§4.4).
    pub async fn select_broker_for_assignment(&self, bundle: &BundleId) -> Result<BrokerId, PlacementError> {
        let mut view = self.view.lock().await;

        // Step 1: idempotency.
        if let Some(existing) = view.preallocations.get(bundle) {
            return Ok(existing.clone());
        }

        // Step 2: materialize BundleData.
        let bundle_data = match view.bundle_stats.get(bundle) {
            Some(stats) => BundleData { stats: stats.clone() },
            None => {
                let stats = hydrate_bundle_stats(&self.store, bundle).await?;
                view.bundle_stats.insert(bundle.clone(), stats.clone());
                BundleData { stats }
            }
        };

        // Step 3: namespace/tenant policy.
        let all_brokers: Vec<BrokerId> = view.brokers.keys().cloned().collect();
        let policy_compliant = self.policy.candidate_brokers(bundle, &all_brokers).await?;
        if policy_compliant.is_empty() {
            return Err(PlacementError::NoBrokerAvailable { bundle: bundle.clone() });
        }

        // Step 4: anti-affinity shaping.
        let namespace = bundle.namespace();
        let shaped = self.anti_affinity_shaped(&policy_compliant, &namespace, &view);
        let mut working_set = if shaped.is_empty() { policy_compliant.clone() } else { shaped };

        // Steps 5-6: filter pipeline, with local recovery on error or on an
        // empty result.
        for filter in &self.filters {
            match filter.filter(&working_set, &bundle_data, &view) {
                Ok(next) => working_set = next,
                Err(_) => {
                    working_set = policy_compliant.clone();
                    break;
                }
            }
        }
        if working_set.is_empty() {
            working_set = policy_compliant.clone();
        }

        // Step 7: scoring.
        let mut chosen = self
            .strategy
            .select_broker(&working_set, &bundle_data, &view)
            .ok_or_else(|| PlacementError::NoBrokerAvailable { bundle: bundle.clone() })?;

        // Step 8: overload guard, re-score once on the full policy-compliant
        // set and accept unconditionally.
        let overloaded = view
            .brokers
            .get(&chosen)
            .map(|state| {
                state.local_data.resource_usage.max_resource_usage()
                    > self.config.broker_overloaded_threshold_percentage / 100.0
            })
            .unwrap_or(false);
        if overloaded {
            chosen = self
                .strategy
                .select_broker(&policy_compliant, &bundle_data, &view)
                .ok_or_else(|| PlacementError::NoBrokerAvailable { bundle: bundle.clone() })?;
        }

        // Step 9: record the preallocation.
        view.preallocations.insert(bundle.clone(), chosen.clone());
        if let Some(state) = view.brokers.get_mut(&chosen) {
            state
                .preallocated_bundle_data
                .insert(bundle.clone(), bundle_data.clone());
        }
        view.namespace_fanout.insert(&chosen, bundle);
        drop(view);

        let _ = self
            .monitor
            .record(LoadManagerEvent::BundleAssigned {
                timestamp: Utc::now(),
                bundle: bundle.clone(),
                broker: chosen.clone(),
            })
            .await;

        // Step 10.
        Ok(chosen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BrokerState, LocalBrokerData, SystemResourceUsage};
    use crate::observability::NoopMonitor;
    use crate::placement::filters::VersionFilter;
    use crate::placement::strategy::LeastResourceUsageStrategy;
    use crate::store::MemoryCoordinationStore;
    use async_trait::async_trait;

    struct AllowAll;

    #[async_trait]
    impl NamespacePolicy for AllowAll {
        async fn candidate_brokers(
            &self,
            _bundle: &BundleId,
            all_brokers: &[BrokerId],
        ) -> Result<Vec<BrokerId>, PlacementError> {
            Ok(all_brokers.to_vec())
        }
    }

    fn broker_with_usage(name: &str, max: f64) -> (BrokerId, BrokerState) {
        let id = BrokerId::advertised(name, 8080);
        let mut data = LocalBrokerData::new(format!("http://{name}:8080"), "3.0.0");
        data.resource_usage = SystemResourceUsage {
            cpu: max,
            memory: 0.0,
            direct_memory: 0.0,
            bandwidth_in: 0.0,
            bandwidth_out: 0.0,
        };
        (id, BrokerState::new(data))
    }

    fn pipeline(
        view: Arc<Mutex<LoadView>>,
    ) -> PlacementPipeline<MemoryCoordinationStore, AllowAll, LeastResourceUsageStrategy, NoopMonitor<LoadManagerEvent>> {
        PlacementPipeline::new(
            MemoryCoordinationStore::new(),
            view,
            AllowAll,
            vec![Box::new(VersionFilter)],
            LeastResourceUsageStrategy,
            NoopMonitor::new(),
            LoadManagerConfig::default(),
        )
    }

    fn bundle() -> BundleId {
        BundleId::new(&NamespaceName::new("tenant/ns1"), "0x00000000_0x80000000")
    }

    #[tokio::test]
    async fn s1_first_time_placement_picks_lowest_usage() {
        let view = Arc::new(Mutex::new(LoadView::new()));
        {
            let mut view = view.lock().await;
            let (a, sa) = broker_with_usage("a", 0.3);
            let (b, sb) = broker_with_usage("b", 0.5);
            view.brokers.insert(a, sa);
            view.brokers.insert(b, sb);
        }
        let pipeline = pipeline(view.clone());

        let chosen = pipeline.select_broker_for_assignment(&bundle()).await.unwrap();
        assert_eq!(chosen, BrokerId::advertised("a", 8080));

        let view = view.lock().await;
        assert_eq!(
            view.preallocations.get(&bundle()),
            Some(&BrokerId::advertised("a", 8080))
        );
    }

    #[tokio::test]
    async fn idempotent_repeat_lookup_returns_same_broker() {
        let view = Arc::new(Mutex::new(LoadView::new()));
        {
            let mut view = view.lock().await;
            let (a, sa) = broker_with_usage("a", 0.3);
            view.brokers.insert(a, sa);
        }
        let pipeline = pipeline(view.clone());

        let first = pipeline.select_broker_for_assignment(&bundle()).await.unwrap();
        let second = pipeline.select_broker_for_assignment(&bundle()).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn s2_overload_fallback_rescoring_picks_other_broker() {
        let view = Arc::new(Mutex::new(LoadView::new()));
        {
            let mut view = view.lock().await;
            let (a, sa) = broker_with_usage("a", 0.95);
            let (b, sb) = broker_with_usage("b", 0.5);
            view.brokers.insert(a, sa);
            view.brokers.insert(b, sb);
        }

        // A filter keeping only A, to exercise the overload guard's
        // re-score over the full policy-compliant set (not just the
        // filtered one).
        struct OnlyA;
        impl BrokerFilter for OnlyA {
            fn name(&self) -> &'static str {
                "only_a"
            }
            fn filter(
                &self,
                candidates: &[BrokerId],
                _bundle_data: &BundleData,
                _view: &LoadView,
            ) -> Result<Vec<BrokerId>, FilterError> {
                Ok(candidates
                    .iter()
                    .filter(|b| **b == BrokerId::advertised("a", 8080))
                    .cloned()
                    .collect())
            }
        }

        let pipeline = PlacementPipeline::new(
            MemoryCoordinationStore::new(),
            view.clone(),
            AllowAll,
            vec![Box::new(OnlyA)],
            LeastResourceUsageStrategy,
            NoopMonitor::<LoadManagerEvent>::new(),
            LoadManagerConfig::builder()
                .broker_overloaded_threshold_percentage(85.0)
                .build()
                .unwrap(),
        );

        let chosen = pipeline.select_broker_for_assignment(&bundle()).await.unwrap();
        assert_eq!(chosen, BrokerId::advertised("b", 8080));
    }
}
