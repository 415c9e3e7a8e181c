//! Scheduler error types.

// Layer 2: Third-party crate imports
use thiserror::Error;

/// Errors raised submitting work to the scheduler (§5).
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The scheduler's single worker task has stopped (e.g. after `stop()`).
    #[error("scheduler is closed")]
    Closed,
}
