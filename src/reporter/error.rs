//! Local reporter error types.

// Layer 2: Third-party crate imports
use thiserror::Error;

// Layer 3: Internal module imports
use crate::store::StoreError;

/// Errors raised while sampling, publishing, or probing local broker state
/// (§4.1). Transient-store failures are logged at warn by the caller and
/// retried on the next scheduled pass (§7) — they're represented here
/// rather than swallowed so the caller can decide how to log them.
#[derive(Debug, Error)]
pub enum ReporterError {
    #[error("host resource probe failed: {0}")]
    Probe(String),

    #[error("local bundle stats source failed: {0}")]
    BundleSource(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
