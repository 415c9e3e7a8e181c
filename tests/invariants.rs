//! Property tests for the six testable invariants (§8), each quantifying
//! over a generated sequence of operations rather than one fixed input.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use proptest::prelude::*;
use tokio::sync::Mutex;

use broker_loadmgr::config::LoadManagerConfig;
use broker_loadmgr::ids::{BrokerId, BundleId, NamespaceName};
use broker_loadmgr::model::{BrokerState, LoadView, LocalBrokerData, RollingWindow, SystemResourceUsage};
use broker_loadmgr::observability::NoopMonitor;
use broker_loadmgr::placement::filters::VersionFilter;
use broker_loadmgr::placement::strategy::LeastResourceUsageStrategy;
use broker_loadmgr::placement::{BrokerFilter, NamespacePolicy, PlacementError, PlacementPipeline};
use broker_loadmgr::store::MemoryCoordinationStore;

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

fn broker_id(i: usize) -> BrokerId {
    BrokerId::advertised(format!("broker-{i}"), 8080)
}

fn bundle_id(i: usize) -> BundleId {
    BundleId::new(&NamespaceName::new("tenant/ns1"), format!("bundle-{i}"))
}

/// One operation in a generated sequence exercising placement and
/// membership together.
#[derive(Debug, Clone)]
enum Op {
    /// Assign `bundle_idx` (mod bundle universe) via the placement pipeline.
    Place(usize),
    /// Drop `broker_idx` (mod broker universe) from membership.
    DropBroker(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..6).prop_map(Op::Place),
        (0usize..4).prop_map(Op::DropBroker),
    ]
}

async fn fresh_view(num_brokers: usize) -> Arc<Mutex<LoadView>> {
    let mut view = LoadView::new();
    for i in 0..num_brokers {
        let mut data = LocalBrokerData::new(format!("http://broker-{i}:8080"), "3.0.0");
        data.resource_usage = SystemResourceUsage {
            cpu: (i as f64) / (num_brokers as f64 + 1.0),
            memory: 0.0,
            direct_memory: 0.0,
            bandwidth_in: 0.0,
            bandwidth_out: 0.0,
        };
        view.brokers.insert(broker_id(i), BrokerState::new(data));
    }
    Arc::new(Mutex::new(view))
}

proptest! {
    /// Invariant 1 + 2 + 3: preallocation consistency, idempotent placement,
    /// and dead-broker reaping hold after any interleaving of placement
    /// calls and membership drops.
    #[test]
    fn invariants_hold_across_operation_sequences(ops in proptest::collection::vec(op_strategy(), 1..30)) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let view = fresh_view(4).await;
            let pipeline = PlacementPipeline::new(
                MemoryCoordinationStore::new(),
                view.clone(),
                AllowAll,
                vec![Box::new(VersionFilter) as Box<dyn BrokerFilter>],
                LeastResourceUsageStrategy,
                NoopMonitor::new(),
                LoadManagerConfig::default(),
            );

            let mut last_assignment: Option<BrokerId> = None;
            let mut dead: HashSet<BrokerId> = HashSet::new();

            for op in ops {
                match op {
                    Op::Place(idx) => {
                        let bundle = bundle_id(idx % 6);
                        let result = pipeline.select_broker_for_assignment(&bundle).await;

                        if let Ok(chosen) = result {
                            // Invariant 3: never returns a reaped broker.
                            prop_assert!(!dead.contains(&chosen));

                            // Invariant 2: a second call with no intervening
                            // `lastStats` observation returns the same broker.
                            let repeat = pipeline.select_broker_for_assignment(&bundle).await.unwrap();
                            prop_assert_eq!(&repeat, &chosen);
                            last_assignment = Some(chosen);
                        }
                    }
                    Op::DropBroker(idx) => {
                        let broker = broker_id(idx % 4);
                        dead.insert(broker.clone());
                        let mut view = view.lock().await;
                        let alive: HashSet<BrokerId> = view
                            .brokers
                            .keys()
                            .filter(|b| **b != broker)
                            .cloned()
                            .collect();
                        let reaped = view.reap_dead_brokers(&alive);
                        for (reaped_broker, _) in &reaped {
                            prop_assert_eq!(reaped_broker, &broker);
                        }
                    }
                }
            }

            // Invariant 1: PreallocationIndex[bundle] = B iff B's
            // preallocatedBundleData contains bundle, for every bundle ever
            // observed.
            let view = view.lock().await;
            for i in 0..6 {
                let bundle = bundle_id(i);
                match view.preallocations.get(&bundle) {
                    Some(owner) => {
                        prop_assert!(view
                            .brokers
                            .get(owner)
                            .map(|state| state.preallocated_bundle_data.contains_key(&bundle))
                            .unwrap_or(false));
                    }
                    None => {
                        for state in view.brokers.values() {
                            prop_assert!(!state.preallocated_bundle_data.contains_key(&bundle));
                        }
                    }
                }
            }
            let _ = last_assignment;
            Ok(())
        })?;
    }

    /// Invariant 4: after feeding k samples, the short window saturates
    /// exactly at N_SHORT and the long window exactly at N_LONG, for any k.
    #[test]
    fn window_saturates_at_exactly_its_capacity(capacity in 1usize..200, k in 0usize..500) {
        let mut window = RollingWindow::new(capacity);
        for i in 0..k {
            window.update(i as f64);
        }
        prop_assert_eq!(window.num_samples(), k.min(capacity));
        prop_assert_eq!(window.is_saturated(), k >= capacity);
    }

    /// Invariant 6: a bundle unloaded at `t` is not eligible for re-proposal
    /// (it remains in `recently_unloaded`) until `t + grace`, for any grace
    /// period and elapsed time.
    #[test]
    fn grace_period_boundary_is_exact(grace_secs in 1u64..3600, elapsed_secs in 0u64..7200) {
        let mut view = LoadView::new();
        let bundle = bundle_id(0);
        let t0 = chrono::DateTime::<chrono::Utc>::UNIX_EPOCH;
        view.recently_unloaded.insert(bundle.clone(), t0);

        let grace = Duration::from_secs(grace_secs);
        let now = t0 + chrono::Duration::seconds(elapsed_secs as i64);
        let within_grace = view.is_within_shedding_grace(&bundle, now, grace);

        prop_assert_eq!(within_grace, elapsed_secs < grace_secs);
    }
}

mod publish_monotonicity {
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use parking_lot::Mutex as SyncMutex;
    use proptest::prelude::*;

    use broker_loadmgr::config::LoadManagerConfig;
    use broker_loadmgr::ids::{BrokerId, BundleId};
    use broker_loadmgr::model::{NamespaceBundleStats, SystemResourceUsage};
    use broker_loadmgr::observability::NoopMonitor;
    use broker_loadmgr::reporter::{HostResourceProbe, LocalBundleStatsSource, LocalReporter, ReporterError};
    use broker_loadmgr::store::MemoryCoordinationStore;

    #[derive(Clone)]
    struct VariableProbe(Arc<SyncMutex<f64>>);

    #[async_trait]
    impl HostResourceProbe for VariableProbe {
        async fn sample(&self) -> Result<SystemResourceUsage, ReporterError> {
            Ok(SystemResourceUsage {
                cpu: *self.0.lock(),
                memory: 0.0,
                direct_memory: 0.0,
                bandwidth_in: 0.0,
                bandwidth_out: 0.0,
            })
        }
    }

    struct EmptyBundles;

    #[async_trait]
    impl LocalBundleStatsSource for EmptyBundles {
        async fn snapshot(&self) -> Result<HashMap<BundleId, NamespaceBundleStats>, ReporterError> {
            Ok(HashMap::new())
        }
    }

    proptest! {
        /// Invariant 5: the publish predicate's usage-gap term is monotone
        /// in the absolute percentage-point gap — it fires iff that gap
        /// exceeds the configured threshold, for any baseline/threshold
        /// pair (with the max-interval ceiling held well out of reach).
        #[test]
        fn publish_fires_iff_usage_gap_exceeds_threshold(
            base_cpu in 0.0f64..1.0,
            new_cpu in 0.0f64..1.0,
            threshold_pct in 1.0f64..99.0,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            rt.block_on(async {
                let config = LoadManagerConfig::builder()
                    .report_update_threshold_percentage(threshold_pct)
                    .build()
                    .unwrap();
                let current_cpu = Arc::new(SyncMutex::new(base_cpu));
                let reporter = LocalReporter::new(
                    BrokerId::advertised("b1", 8080),
                    "http://b1:8080",
                    "3.0.0",
                    MemoryCoordinationStore::new(),
                    VariableProbe(current_cpu.clone()),
                    EmptyBundles,
                    NoopMonitor::new(),
                    config,
                );

                // Establish a baseline publish.
                reporter.write_broker_data_if_needed().await.unwrap();

                *current_cpu.lock() = new_cpu;
                let gap_points = (base_cpu - new_cpu).abs() * 100.0;
                let published = reporter.write_broker_data_if_needed().await.unwrap();

                prop_assert_eq!(published, gap_points > threshold_pct);
            })?;
        }
    }
}
