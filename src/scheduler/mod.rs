//! Single-worker scheduler (§5): one dedicated task drives every aggregator
//! reaction so the `LoadView` is never mutated from two places at once,
//! without per-field locking.
//!
//! Grounded on the fleet's bounded mailbox (`mailbox/bounded.rs`): the same
//! `tokio::sync::mpsc` bounded-channel shape, specialized to a single
//! always-live consumer instead of an actor inbox.

// Layer 1: Standard library imports
use std::collections::HashSet;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

// Layer 3: Internal module imports
use crate::ids::BrokerId;

mod error;
pub use error::SchedulerError;

/// Work submitted to the scheduler. Watcher callbacks enqueue these and
/// return immediately (§4.2) — they never mutate shared state on the
/// delivery thread.
#[derive(Debug, Clone)]
pub enum SchedulerTask {
    /// The set of live brokers changed (§4.2 membership watcher).
    MembershipChanged(HashSet<BrokerId>),
    /// One broker's published report changed (§4.2 broker-data watcher).
    BrokerDataChanged(BrokerId),
    /// Run a full aggregation pass (used by `start()`'s initial `updateAll`,
    /// §4.7, and by periodic re-aggregation).
    RunAggregation,
    /// Persist aggregated bundle stats and time-averaged broker stats back
    /// to the coordination store (§2: "so a successor leader starts with
    /// warm history").
    PersistAggregates,
}

/// Implemented by whatever drains the scheduler's queue — in practice, the
/// aggregator.
#[async_trait]
pub trait SchedulerTaskHandler: Send + Sync + 'static {
    async fn handle(&self, task: SchedulerTask);
}

/// Handle to the running scheduler. Cheap to clone; all clones share the
/// same queue.
#[derive(Clone)]
pub struct Scheduler {
    sender: mpsc::Sender<SchedulerTask>,
}

impl Scheduler {
    /// Spawn the single worker task draining `handler`'s queue. `capacity`
    /// bounds the queue; submitters block (rather than drop tasks) under
    /// backpressure, matching the spec's "no aggregation pass is lost"
    /// intent.
    pub fn spawn<H: SchedulerTaskHandler>(handler: H, capacity: usize) -> (Self, JoinHandle<()>) {
        let (sender, mut receiver) = mpsc::channel(capacity);
        let handler = Arc::new(handler);
        let worker = tokio::spawn(async move {
            while let Some(task) = receiver.recv().await {
                handler.handle(task).await;
            }
        });
        (Self { sender }, worker)
    }

    /// Enqueue a task; returns once it is queued, not once it is handled.
    pub async fn submit(&self, task: SchedulerTask) -> Result<(), SchedulerError> {
        self.sender.send(task).await.map_err(|_| SchedulerError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingHandler {
        count: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl SchedulerTaskHandler for CountingHandler {
        async fn handle(&self, _task: SchedulerTask) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn submitted_tasks_are_drained_serially() {
        let count = Arc::new(AtomicUsize::new(0));
        let (scheduler, _worker) = Scheduler::spawn(
            CountingHandler {
                count: count.clone(),
            },
            16,
        );

        for _ in 0..5 {
            scheduler.submit(SchedulerTask::RunAggregation).await.unwrap();
        }

        // Give the worker a chance to drain; in real use the manager holds
        // the JoinHandle for the process lifetime.
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(count.load(Ordering::SeqCst), 5);
    }
}
