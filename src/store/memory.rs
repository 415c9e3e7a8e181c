//! In-process [`CoordinationStore`] backed by lock-free concurrent maps.
//!
//! Grounded on the fleet's in-memory broker registry
//! (`broker/in_memory.rs`): the same `DashMap` + `Arc` clone-is-cheap shape,
//! specialized to a watchable hierarchical key-value tree instead of a
//! message-routing table. Useful for tests and for a single-process
//! deployment with no external coordination service.

// Layer 1: Standard library imports
use std::collections::HashSet;
use std::convert::Infallible;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::watch;

// Layer 3: Internal module imports
use super::error::StoreError;
use super::traits::{CoordinationStore, CreateMode};

struct Inner {
    nodes: DashMap<String, Vec<u8>>,
    data_watches: DashMap<String, watch::Sender<Option<Vec<u8>>>>,
    children_watches: DashMap<String, watch::Sender<HashSet<String>>>,
}

fn direct_children(nodes: &DashMap<String, Vec<u8>>, parent: &str) -> HashSet<String> {
    let prefix = format!("{parent}/");
    nodes
        .iter()
        .filter_map(|entry| {
            entry
                .key()
                .strip_prefix(&prefix)
                .and_then(|rest| rest.split('/').next())
                .map(str::to_string)
        })
        .collect()
}

impl Inner {
    fn notify_data(&self, path: &str, value: Option<Vec<u8>>) {
        if let Some(sender) = self.data_watches.get(path) {
            let _ = sender.send(value);
        }
    }

    fn notify_parent_children(&self, path: &str) {
        let Some((parent, _)) = path.rsplit_once('/') else {
            return;
        };
        if let Some(sender) = self.children_watches.get(parent) {
            let _ = sender.send(direct_children(&self.nodes, parent));
        }
    }
}

/// An in-memory coordination store. Cheap to clone: all clones share the
/// same underlying maps via `Arc`.
#[derive(Clone)]
pub struct MemoryCoordinationStore {
    inner: Arc<Inner>,
}

impl MemoryCoordinationStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                nodes: DashMap::new(),
                data_watches: DashMap::new(),
                children_watches: DashMap::new(),
            }),
        }
    }
}

impl Default for MemoryCoordinationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CoordinationStore for MemoryCoordinationStore {
    type BackendError = Infallible;

    async fn exists_or_create(
        &self,
        path: &str,
        payload: Vec<u8>,
        _mode: CreateMode,
    ) -> Result<(), StoreError> {
        // Idempotent: NodeExists is swallowed (§7).
        if self.inner.nodes.contains_key(path) {
            return Ok(());
        }
        self.inner.nodes.insert(path.to_string(), payload.clone());
        self.inner.notify_data(path, Some(payload));
        self.inner.notify_parent_children(path);
        Ok(())
    }

    async fn get_json<T: DeserializeOwned + Send>(&self, path: &str) -> Result<Option<T>, StoreError> {
        match self.inner.nodes.get(path) {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| StoreError::Decode {
                    path: path.to_string(),
                    message: e.to_string(),
                }),
            None => Ok(None),
        }
    }

    async fn set_json<T: Serialize + Sync>(&self, path: &str, value: &T) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(value).map_err(|e| StoreError::Encode {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        let is_new = !self.inner.nodes.contains_key(path);
        self.inner.nodes.insert(path.to_string(), bytes.clone());
        self.inner.notify_data(path, Some(bytes));
        if is_new {
            self.inner.notify_parent_children(path);
        }
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        self.inner.nodes.remove(path);
        self.inner.notify_data(path, None);
        self.inner.notify_parent_children(path);
        Ok(())
    }

    async fn children_with_watch(&self, path: &str) -> Result<watch::Receiver<HashSet<String>>, StoreError> {
        if let Some(sender) = self.inner.children_watches.get(path) {
            return Ok(sender.subscribe());
        }
        let initial = direct_children(&self.inner.nodes, path);
        let (sender, receiver) = watch::channel(initial);
        self.inner.children_watches.insert(path.to_string(), sender);
        Ok(receiver)
    }

    async fn data_with_watch(&self, path: &str) -> Result<watch::Receiver<Option<Vec<u8>>>, StoreError> {
        if let Some(sender) = self.inner.data_watches.get(path) {
            return Ok(sender.subscribe());
        }
        let initial = self.inner.nodes.get(path).map(|bytes| bytes.clone());
        let (sender, receiver) = watch::channel(initial);
        self.inner.data_watches.insert(path.to_string(), sender);
        Ok(receiver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Payload {
        value: u32,
    }

    #[tokio::test]
    async fn exists_or_create_is_idempotent() {
        let store = MemoryCoordinationStore::new();
        store
            .exists_or_create("/loadbalance/brokers", Vec::new(), CreateMode::Persistent)
            .await
            .unwrap();
        store
            .exists_or_create("/loadbalance/brokers", b"ignored".to_vec(), CreateMode::Persistent)
            .await
            .unwrap();
        let raw = store.inner.nodes.get("/loadbalance/brokers").unwrap();
        assert!(raw.is_empty(), "second create must not overwrite");
    }

    #[tokio::test]
    async fn set_json_then_get_json_round_trips() {
        let store = MemoryCoordinationStore::new();
        let payload = Payload { value: 42 };
        store.set_json("/x", &payload).await.unwrap();
        let decoded: Option<Payload> = store.get_json("/x").await.unwrap();
        assert_eq!(decoded, Some(payload));
    }

    #[tokio::test]
    async fn get_json_on_missing_path_is_none() {
        let store = MemoryCoordinationStore::new();
        let decoded: Option<Payload> = store.get_json("/missing").await.unwrap();
        assert_eq!(decoded, None);
    }

    #[tokio::test]
    async fn children_watch_observes_new_child() {
        let store = MemoryCoordinationStore::new();
        let mut rx = store.children_with_watch("/loadbalance/brokers").await.unwrap();
        assert!(rx.borrow().is_empty());

        store
            .exists_or_create(
                "/loadbalance/brokers/broker-1:8080",
                b"{}".to_vec(),
                CreateMode::Ephemeral,
            )
            .await
            .unwrap();

        rx.changed().await.unwrap();
        assert!(rx.borrow().contains("broker-1:8080"));
    }

    #[tokio::test]
    async fn data_watch_observes_delete_as_none() {
        let store = MemoryCoordinationStore::new();
        let payload = Payload { value: 1 };
        store.set_json("/x", &payload).await.unwrap();

        let mut rx = store.data_with_watch("/x").await.unwrap();
        assert!(rx.borrow().is_some());

        store.delete("/x").await.unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_none());
    }
}
