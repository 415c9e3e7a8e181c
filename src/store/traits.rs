//! Typed coordination-store adapter (§4.6).
//!
//! The store itself — a hierarchical, watchable, session-ephemeral
//! key-value service — is an external collaborator (§1). This trait is the
//! thin typed wrapper the core depends on; production deployments back it
//! with whatever the surrounding broker already uses to talk to its
//! coordination service.

// Layer 1: Standard library imports
use std::collections::HashSet;
use std::error::Error as StdError;

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::watch;

// Layer 3: Internal module imports
use super::error::StoreError;

/// Node persistence mode (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateMode {
    /// Survives store restarts; must be explicitly deleted.
    Persistent,
    /// Tied to the creating session; disappears automatically on session
    /// loss (used for `/loadbalance/brokers/<advertised>`, §6).
    Ephemeral,
}

/// Typed wrapper over the coordination store (§4.6).
///
/// Implementations must make `exists_or_create` idempotent: a `NodeExists`
/// condition on create is swallowed, never surfaced as an error (§7).
#[async_trait]
pub trait CoordinationStore: Send + Sync + Clone + 'static {
    /// Error type for store operations, distinct from [`StoreError`] so a
    /// real backend (its own client library) can report its own error
    /// detail; the core only ever sees [`StoreError`] once wrapped.
    type BackendError: StdError + Send + Sync + 'static;

    /// Create `path` with `payload` if it does not already exist. Swallows
    /// `NodeExists` (§7): the call succeeds whether or not this node was
    /// the one that created it.
    async fn exists_or_create(
        &self,
        path: &str,
        payload: Vec<u8>,
        mode: CreateMode,
    ) -> Result<(), StoreError>;

    /// Read and JSON-decode the value at `path`, or `None` if absent
    /// (treated as "unseen", §7).
    async fn get_json<T: DeserializeOwned + Send>(&self, path: &str) -> Result<Option<T>, StoreError>;

    /// JSON-encode `value` and write it to `path`, creating it if absent.
    async fn set_json<T: Serialize + Sync>(&self, path: &str, value: &T) -> Result<(), StoreError>;

    /// Delete `path`. Used by `disableBroker` (§4.7) for voluntary drain.
    async fn delete(&self, path: &str) -> Result<(), StoreError>;

    /// Subscribe to the child-name set of `path`, delivered on every change
    /// (§4.2 membership watcher).
    async fn children_with_watch(&self, path: &str) -> Result<watch::Receiver<HashSet<String>>, StoreError>;

    /// Subscribe to the raw bytes at `path`, delivered on every change
    /// (§4.2 broker-data watcher). `None` once the node is deleted or has
    /// never existed.
    async fn data_with_watch(&self, path: &str) -> Result<watch::Receiver<Option<Vec<u8>>>, StoreError>;
}
