//! Crate-level error, unioning every component's error type (§7).

// Layer 2: Third-party crate imports
use thiserror::Error;

// Layer 3: Internal module imports
use crate::aggregator::AggregatorError;
use crate::config::ConfigError;
use crate::placement::PlacementError;
use crate::reporter::ReporterError;
use crate::scheduler::SchedulerError;
use crate::store::StoreError;

/// Everything that can go wrong running a [`crate::manager::LoadManager`].
#[derive(Debug, Error)]
pub enum LoadManagerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Reporter(#[from] ReporterError),

    #[error(transparent)]
    Aggregator(#[from] AggregatorError),

    #[error(transparent)]
    Placement(#[from] PlacementError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    /// The manager could not create its own broker znode at start time for
    /// any reason other than `NodeExists` (§7: "fatal, surfaced to the
    /// caller as a server-start error").
    #[error("failed to start load manager for broker {broker}: {message}")]
    StartFailed { broker: String, message: String },
}
