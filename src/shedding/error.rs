//! Shedding error types.

// Layer 2: Third-party crate imports
use thiserror::Error;

/// Errors raised by `doLoadShedding` (§4.5, §7).
///
/// Individual admin-RPC failures are *not* represented here: they're logged
/// and skipped inline (§7: "log and move on"), never propagated.
#[derive(Debug, Error)]
pub enum SheddingError {
    #[error("admin client failed to unload {namespace}/{range} on {broker}: {message}")]
    Unload {
        namespace: String,
        range: String,
        broker: String,
        message: String,
    },
}
