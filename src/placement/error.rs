//! Placement error types.

// Layer 2: Third-party crate imports
use thiserror::Error;

// Layer 3: Internal module imports
use crate::ids::BundleId;
use crate::store::StoreError;

/// Errors raised by `selectBrokerForAssignment` (§4.4, §7).
///
/// Filter errors never reach this type — they're recovered locally within
/// the pipeline (§7) — and transient store errors only surface here when
/// hydration itself fails, not as a general placement failure mode.
#[derive(Debug, Error)]
pub enum PlacementError {
    /// No broker survived policy, filtering, and scoring, even after both
    /// points of local recovery (§7: "the strategy must return *some*
    /// broker or the placement call raises a fatal no-broker-available
    /// error").
    #[error("no broker available to host bundle {bundle}")]
    NoBrokerAvailable { bundle: BundleId },

    /// The namespace/tenant policy collaborator failed outright (distinct
    /// from it legitimately returning an empty set).
    #[error("namespace policy failed for bundle {bundle}: {message}")]
    PolicyFailed { bundle: BundleId, message: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A filter's failure (§4.4 step 5, §7): recovered locally by the pipeline,
/// which restores the full policy-compliant candidate set and continues —
/// this type never escapes `selectBrokerForAssignment`.
#[derive(Debug, Error)]
#[error("broker filter {filter} failed: {message}")]
pub struct FilterError {
    pub filter: &'static str,
    pub message: String,
}
