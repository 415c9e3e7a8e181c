//! Per-broker data watcher (§4.2): observes each broker's published report
//! and enqueues an aggregation pass on change.

// Layer 1: Standard library imports
use std::collections::HashSet;

// Layer 2: Third-party crate imports
use dashmap::DashMap;
use tokio::task::JoinHandle;

// Layer 3: Internal module imports
use crate::ids::BrokerId;
use crate::scheduler::{Scheduler, SchedulerTask};
use crate::store::{paths, CoordinationStore, StoreError};

/// Owns one watcher task per currently-live broker, spawning new ones and
/// aborting stale ones as membership changes.
pub struct BrokerDataWatcherPool<S> {
    store: S,
    scheduler: Scheduler,
    tasks: DashMap<BrokerId, JoinHandle<()>>,
}

impl<S: CoordinationStore> BrokerDataWatcherPool<S> {
    pub fn new(store: S, scheduler: Scheduler) -> Self {
        Self {
            store,
            scheduler,
            tasks: DashMap::new(),
        }
    }

    /// Spawn watchers for brokers newly present in `alive`, and abort
    /// watchers for brokers no longer present.
    pub fn reconcile(&self, alive: &HashSet<BrokerId>) {
        for broker in alive {
            if self.tasks.contains_key(broker) {
                continue;
            }
            let handle = self.spawn_one(broker.clone());
            self.tasks.insert(broker.clone(), handle);
        }

        self.tasks.retain(|broker, handle| {
            let keep = alive.contains(broker);
            if !keep {
                handle.abort();
            }
            keep
        });
    }

    fn spawn_one(&self, broker: BrokerId) -> JoinHandle<()> {
        let store = self.store.clone();
        let scheduler = self.scheduler.clone();
        tokio::spawn(async move {
            let path = paths::broker_znode(&broker);
            let mut receiver = match store.data_with_watch(&path).await {
                Ok(receiver) => receiver,
                Err(_) => return,
            };
            loop {
                // Initial value and every subsequent change both trigger an
                // aggregation pass; a `None` (node deleted) is handled by
                // the membership watcher's next reap, not here.
                if scheduler
                    .submit(SchedulerTask::BrokerDataChanged(broker.clone()))
                    .await
                    .is_err()
                {
                    return;
                }
                if receiver.changed().await.is_err() {
                    return;
                }
            }
        })
    }
}

impl<S> Drop for BrokerDataWatcherPool<S> {
    fn drop(&mut self) {
        for entry in self.tasks.iter() {
            entry.value().abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::SchedulerTaskHandler;
    use crate::store::MemoryCoordinationStore;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    struct RecordingHandler {
        seen: Arc<Mutex<Vec<BrokerId>>>,
    }

    #[async_trait]
    impl SchedulerTaskHandler for RecordingHandler {
        async fn handle(&self, task: SchedulerTask) {
            if let SchedulerTask::BrokerDataChanged(broker) = task {
                self.seen.lock().unwrap().push(broker);
            }
        }
    }

    #[tokio::test]
    async fn reconcile_spawns_and_aborts_watchers() {
        let store = MemoryCoordinationStore::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (scheduler, _worker) = Scheduler::spawn(
            RecordingHandler {
                seen: seen.clone(),
            },
            16,
        );
        let pool = BrokerDataWatcherPool::new(store, scheduler);

        let b1 = BrokerId::advertised("b1", 8080);
        let mut alive = HashSet::new();
        alive.insert(b1.clone());
        pool.reconcile(&alive);

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(seen.lock().unwrap().contains(&b1));
        assert_eq!(pool.tasks.len(), 1);

        pool.reconcile(&HashSet::new());
        assert_eq!(pool.tasks.len(), 0);
    }
}
