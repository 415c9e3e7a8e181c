//! Aggregator error types.

// Layer 2: Third-party crate imports
use thiserror::Error;

// Layer 3: Internal module imports
use crate::store::StoreError;

/// Errors raised while reaping dead brokers or refreshing the load view
/// (§4.3). Store failures are transient by convention (§7): the caller logs
/// and the next scheduled pass retries.
#[derive(Debug, Error)]
pub enum AggregatorError {
    #[error(transparent)]
    Store(#[from] StoreError),
}
