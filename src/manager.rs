//! Top-level load manager (§4.7, §6): wires the reporter, aggregator,
//! scheduler, watchers, placement pipeline, and shedder around one shared
//! `LoadView`, and exposes the operations a broker process drives directly.
//!
//! Grounded on `system/actor_system.rs`'s `ActorSystem`: an `Arc`-shared
//! inner state with a lifecycle (`spawn`/`shutdown`) distinct from the
//! per-operation API surface, with background `JoinHandle`s held for
//! graceful teardown rather than detached.

// Layer 1: Standard library imports
use std::collections::HashSet;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

// Layer 3: Internal module imports
use crate::aggregator::Aggregator;
use crate::config::LoadManagerConfig;
use crate::error::LoadManagerError;
use crate::ids::{BrokerId, BundleId};
use crate::model::{LoadView, TimeAverageData};
use crate::observability::{LoadManagerEvent, Monitor};
use crate::placement::{BrokerFilter, NamespacePolicy, PlacementPipeline, PlacementStrategy};
use crate::reporter::{HostResourceProbe, LocalBundleStatsSource, LocalReporter};
use crate::scheduler::Scheduler;
use crate::shedding::{AdminClient, LoadShedder, LoadSheddingStrategy};
use crate::store::{paths, CoordinationStore, CreateMode};
use crate::watch::{spawn_membership_watcher, BrokerDataWatcherPool};

fn start_failed(broker: &BrokerId, err: impl std::fmt::Display) -> LoadManagerError {
    LoadManagerError::StartFailed {
        broker: broker.to_string(),
        message: err.to_string(),
    }
}

/// Background tasks spawned by [`LoadManager::start`]. Held so
/// [`LoadManager::stop`] can tear them down in one place.
struct Running<S> {
    scheduler_worker: JoinHandle<()>,
    membership_watcher: JoinHandle<()>,
    broker_data_watchers: Arc<BrokerDataWatcherPool<S>>,
}

/// Wires every component of the load manager around the shared placement
/// mutex (§5) and exposes the operations a broker process drives directly
/// (§6's "Exposed operations").
pub struct LoadManager<S, M, P, B, NP, PS, AC> {
    broker_id: BrokerId,
    store: S,
    reporter: LocalReporter<S, P, B, M>,
    aggregator: Aggregator<S, M>,
    placement: PlacementPipeline<S, NP, PS, M>,
    shedder: LoadShedder<AC, M>,
    running: Mutex<Option<Running<S>>>,
}

impl<S, M, P, B, NP, PS, AC> LoadManager<S, M, P, B, NP, PS, AC>
where
    S: CoordinationStore,
    M: Monitor<LoadManagerEvent>,
    P: HostResourceProbe,
    B: LocalBundleStatsSource,
    NP: NamespacePolicy,
    PS: PlacementStrategy,
    AC: AdminClient,
{
    /// Assembles a manager for `broker_id`, advertising itself at
    /// `web_service_url` once started. None of the background work begins
    /// until [`Self::start`] is called.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        broker_id: BrokerId,
        web_service_url: impl Into<String>,
        version: impl Into<String>,
        store: S,
        probe: P,
        bundle_source: B,
        namespace_policy: NP,
        broker_filters: Vec<Box<dyn BrokerFilter>>,
        placement_strategy: PS,
        shedding_strategies: Vec<Box<dyn LoadSheddingStrategy>>,
        admin: AC,
        monitor: M,
        config: LoadManagerConfig,
    ) -> Self {
        let view = Arc::new(Mutex::new(LoadView::new()));
        let reporter = LocalReporter::new(
            broker_id.clone(),
            web_service_url,
            version,
            store.clone(),
            probe,
            bundle_source,
            monitor.clone(),
            config.clone(),
        );
        let aggregator = Aggregator::new(store.clone(), view.clone(), monitor.clone());
        let placement = PlacementPipeline::new(
            store.clone(),
            view.clone(),
            namespace_policy,
            broker_filters,
            placement_strategy,
            monitor.clone(),
            config.clone(),
        );
        let shedder = LoadShedder::new(view.clone(), admin, monitor, shedding_strategies, config);

        Self {
            broker_id,
            store,
            reporter,
            aggregator,
            placement,
            shedder,
            running: Mutex::new(None),
        }
    }

    /// `start()` (§4.7): registers this broker in the coordination store,
    /// runs one synchronous aggregation pass so the view is warm before
    /// anyone calls `selectBrokerForAssignment`, then spawns the scheduler
    /// and the watchers that keep the view current afterward.
    ///
    /// Any failure here other than the swallowed `NodeExists` condition
    /// already handled by `exists_or_create` is fatal and surfaced as
    /// [`LoadManagerError::StartFailed`] (§7).
    pub async fn start(&self) -> Result<(), LoadManagerError> {
        self.store
            .exists_or_create(paths::BROKERS_ROOT, Vec::new(), CreateMode::Persistent)
            .await
            .map_err(|err| start_failed(&self.broker_id, err))?;

        self.reporter.update_local_broker_data().await?;
        let local_data = self.reporter.current().await;

        // Create-then-overwrite gives "NodeExists ⇒ overwrite" (§7) without a
        // separate branch: whether this call created the node or found it
        // already there, the following `set_json` makes it current.
        let znode = paths::broker_znode(&self.broker_id);
        self.store
            .exists_or_create(&znode, Vec::new(), CreateMode::Ephemeral)
            .await
            .map_err(|err| start_failed(&self.broker_id, err))?;
        self.store
            .set_json(&znode, &local_data)
            .await
            .map_err(|err| start_failed(&self.broker_id, err))?;

        // Left untouched if it already exists: that's a successor leader
        // picking up warm history from a prior incarnation of this broker
        // (§2).
        self.store
            .exists_or_create(
                &paths::broker_time_average_path(&self.broker_id),
                serde_json::to_vec(&TimeAverageData::default()).unwrap_or_default(),
                CreateMode::Persistent,
            )
            .await
            .map_err(|err| start_failed(&self.broker_id, err))?;

        let children = self
            .store
            .children_with_watch(paths::BROKERS_ROOT)
            .await
            .map_err(|err| start_failed(&self.broker_id, err))?;
        let alive: HashSet<BrokerId> = children
            .borrow()
            .iter()
            .map(|name| BrokerId::from_advertised(name.clone()))
            .collect();

        self.aggregator.update_all_broker_data(&alive).await?;
        self.aggregator.update_bundle_data().await?;

        let (scheduler, scheduler_worker) = Scheduler::spawn(self.aggregator.clone(), 256);
        let broker_data_watchers = Arc::new(BrokerDataWatcherPool::new(self.store.clone(), scheduler.clone()));
        broker_data_watchers.reconcile(&alive);
        let membership_watcher = spawn_membership_watcher(
            self.store.clone(),
            scheduler,
            broker_data_watchers.clone(),
        )
        .await
        .map_err(|err| start_failed(&self.broker_id, err))?;

        *self.running.lock().await = Some(Running {
            scheduler_worker,
            membership_watcher,
            broker_data_watchers,
        });

        Ok(())
    }

    /// `stop()` (§4.7): aborts the background scheduler worker and every
    /// watcher task. Leaves the broker znode in place — an ephemeral node
    /// tied to session loss is the normal way peers notice a crashed
    /// process; [`Self::disable_broker`] is the voluntary-drain path.
    pub async fn stop(&self) {
        if let Some(running) = self.running.lock().await.take() {
            running.scheduler_worker.abort();
            running.membership_watcher.abort();
            drop(running.broker_data_watchers);
        }
    }

    /// `disableBroker()` (§4.7): voluntary drain. Deletes the broker znode
    /// immediately rather than waiting for peers to notice via session
    /// timeout.
    pub async fn disable_broker(&self) -> Result<(), LoadManagerError> {
        self.store.delete(&paths::broker_znode(&self.broker_id)).await?;
        Ok(())
    }

    /// `updateLocalBrokerData()` (§4.1).
    pub async fn update_local_broker_data(&self) -> Result<(), LoadManagerError> {
        self.reporter.update_local_broker_data().await?;
        Ok(())
    }

    /// `writeBrokerDataOnZooKeeper()` (§4.1). Returns whether a publish
    /// actually happened.
    pub async fn write_broker_data_on_zoo_keeper(&self) -> Result<bool, LoadManagerError> {
        Ok(self.reporter.write_broker_data_if_needed().await?)
    }

    /// `writeBundleDataOnZooKeeper()` (§4.3, §4.7).
    pub async fn write_bundle_data_on_zoo_keeper(&self) -> Result<(), LoadManagerError> {
        Ok(self.aggregator.persist_aggregates().await?)
    }

    /// `selectBrokerForAssignment(serviceUnit)` (§4.4).
    pub async fn select_broker_for_assignment(&self, bundle: &BundleId) -> Result<BrokerId, LoadManagerError> {
        Ok(self.placement.select_broker_for_assignment(bundle).await?)
    }

    /// `doLoadShedding()` (§4.5). Leader-only; the caller decides whether to
    /// invoke it.
    pub async fn do_load_shedding(&self) {
        self.shedder.do_load_shedding().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::NamespaceName;
    use crate::model::{NamespaceBundleStats, SystemResourceUsage};
    use crate::observability::NoopMonitor;
    use crate::placement::filters::VersionFilter;
    use crate::placement::strategy::LeastResourceUsageStrategy;
    use crate::reporter::ReporterError;
    use crate::shedding::{SheddingError, OverloadedBrokerStrategy};
    use crate::store::MemoryCoordinationStore;
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct FixedProbe;

    #[async_trait]
    impl HostResourceProbe for FixedProbe {
        async fn sample(&self) -> Result<SystemResourceUsage, ReporterError> {
            Ok(SystemResourceUsage {
                cpu: 0.2,
                memory: 0.1,
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

    struct AllowAll;

    #[async_trait]
    impl NamespacePolicy for AllowAll {
        async fn candidate_brokers(
            &self,
            _bundle: &BundleId,
            all_brokers: &[BrokerId],
        ) -> Result<Vec<BrokerId>, crate::placement::PlacementError> {
            Ok(all_brokers.to_vec())
        }
    }

    struct NoopAdmin;

    #[async_trait]
    impl AdminClient for NoopAdmin {
        async fn unload_namespace_bundle(&self, _bundle: &BundleId, _broker: &BrokerId) -> Result<(), SheddingError> {
            Ok(())
        }
    }

    type TestManager =
        LoadManager<MemoryCoordinationStore, NoopMonitor<LoadManagerEvent>, FixedProbe, EmptyBundles, AllowAll, LeastResourceUsageStrategy, NoopAdmin>;

    fn manager(broker_id: BrokerId) -> TestManager {
        LoadManager::new(
            broker_id,
            "http://a:8080",
            "3.0.0",
            MemoryCoordinationStore::new(),
            FixedProbe,
            EmptyBundles,
            AllowAll,
            vec![Box::new(VersionFilter)],
            LeastResourceUsageStrategy,
            vec![Box::new(OverloadedBrokerStrategy)],
            NoopAdmin,
            NoopMonitor::new(),
            LoadManagerConfig::default(),
        )
    }

    #[tokio::test]
    async fn start_registers_broker_znode_and_seeds_view() {
        let broker_id = BrokerId::advertised("a", 8080);
        let manager = manager(broker_id.clone());

        manager.start().await.unwrap();

        let published: Option<crate::model::LocalBrokerData> = manager
            .store
            .get_json(&paths::broker_znode(&broker_id))
            .await
            .unwrap();
        assert!(published.is_some());

        let time_average: Option<TimeAverageData> = manager
            .store
            .get_json(&paths::broker_time_average_path(&broker_id))
            .await
            .unwrap();
        assert_eq!(time_average, Some(TimeAverageData::default()));

        manager.stop().await;
    }

    #[tokio::test]
    async fn disable_broker_removes_znode() {
        let broker_id = BrokerId::advertised("a", 8080);
        let manager = manager(broker_id.clone());
        manager.start().await.unwrap();

        manager.disable_broker().await.unwrap();

        let published: Option<crate::model::LocalBrokerData> = manager
            .store
            .get_json(&paths::broker_znode(&broker_id))
            .await
            .unwrap();
        assert!(published.is_none());

        manager.stop().await;
    }

    #[tokio::test]
    async fn select_broker_for_assignment_works_after_start() {
        let broker_id = BrokerId::advertised("a", 8080);
        let manager = manager(broker_id.clone());
        manager.start().await.unwrap();

        let ns = NamespaceName::new("tenant/ns1");
        let bundle = BundleId::new(&ns, "0x00000000_0x80000000");
        let chosen = manager.select_broker_for_assignment(&bundle).await.unwrap();
        assert_eq!(chosen, broker_id);

        manager.stop().await;
    }
}
