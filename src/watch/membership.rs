//! Membership watcher (§4.2): observes `/loadbalance/brokers` children and
//! hands the alive set to the scheduler.

// Layer 1: Standard library imports
use std::collections::HashSet;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use tokio::task::JoinHandle;

// Layer 3: Internal module imports
use crate::ids::BrokerId;
use crate::scheduler::{Scheduler, SchedulerTask};
use crate::store::{paths, CoordinationStore, StoreError};
use crate::watch::BrokerDataWatcherPool;

/// Subscribe to `/loadbalance/brokers` and submit a `MembershipChanged` task
/// to `scheduler` for the current set and every subsequent change.
///
/// Also reconciles `broker_data_watchers` against each observed alive set, so
/// a broker joining after startup gets its per-broker data watcher spawned
/// without waiting for some unrelated later aggregation pass to notice it.
///
/// The watcher never mutates the shared `LoadView` itself (§4.2): it only
/// decodes child names into `BrokerId`s, enqueues, and reconciles the data
/// watcher pool, which tracks its own `JoinHandle`s independently of the view.
pub async fn spawn_membership_watcher<S: CoordinationStore>(
    store: S,
    scheduler: Scheduler,
    broker_data_watchers: Arc<BrokerDataWatcherPool<S>>,
) -> Result<JoinHandle<()>, StoreError> {
    let mut receiver = store.children_with_watch(paths::BROKERS_ROOT).await?;

    Ok(tokio::spawn(async move {
        loop {
            let alive: HashSet<BrokerId> = receiver
                .borrow_and_update()
                .iter()
                .map(|name| BrokerId::from_advertised(name.clone()))
                .collect();

            broker_data_watchers.reconcile(&alive);

            if scheduler
                .submit(SchedulerTask::MembershipChanged(alive))
                .await
                .is_err()
            {
                return;
            }

            if receiver.changed().await.is_err() {
                return;
            }
        }
    }))
}
