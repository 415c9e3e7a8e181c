//! Coordination-store error types with context.

// Layer 2: Third-party crate imports
use thiserror::Error;

/// Errors raised by a [`super::CoordinationStore`] implementation (§4.6, §7).
///
/// Every variant carries the path it failed against so a caller logging the
/// error (the store adapter's writes are best-effort, §4.6) doesn't need to
/// reconstruct context from a bare string.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store rejected or failed a read/write. Transient by
    /// convention (§7): callers log at warn and let the next scheduled pass
    /// retry, they never propagate this to placement.
    #[error("store operation failed at {path}: {message}")]
    Transient { path: String, message: String },

    /// A value existed at `path` but couldn't be decoded as the requested
    /// type.
    #[error("failed to decode JSON at {path}: {message}")]
    Decode { path: String, message: String },

    /// A value couldn't be encoded to JSON before a write.
    #[error("failed to encode JSON for {path}: {message}")]
    Encode { path: String, message: String },

    /// `existsOrCreate` with `CreateMode::Persistent` attempted to create a
    /// node below a parent that does not exist.
    #[error("parent of {path} does not exist")]
    NoParent { path: String },
}
