//! Shedding loop (§4.5): periodically detects overloaded brokers and
//! unloads bundles via the admin client.

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
use chrono::Utc;
use tokio::sync::Mutex;

// Layer 3: Internal module imports
use crate::config::LoadManagerConfig;
use crate::model::LoadView;
use crate::observability::{LoadManagerEvent, Monitor};

mod error;
mod strategy;
mod traits;

pub use error::SheddingError;
pub use strategy::OverloadedBrokerStrategy;
pub use traits::{AdminClient, LoadSheddingStrategy};

/// Runs `doLoadShedding()` (§4.5) against the shared placement mutex.
pub struct LoadShedder<A, M> {
    view: Arc<Mutex<LoadView>>,
    admin: A,
    monitor: M,
    strategies: Vec<Box<dyn LoadSheddingStrategy>>,
    config: LoadManagerConfig,
}

impl<A, M> LoadShedder<A, M>
where
    A: AdminClient,
    M: Monitor<LoadManagerEvent>,
{
    pub fn new(
        view: Arc<Mutex<LoadView>>,
        admin: A,
        monitor: M,
        strategies: Vec<Box<dyn LoadSheddingStrategy>>,
        config: LoadManagerConfig,
    ) -> Self {
        Self {
            view,
            admin,
            monitor,
            strategies,
            config,
        }
    }

    /// `doLoadShedding()` (§4.5). Leader-only; the caller decides whether to
    /// invoke it.
    pub async fn do_load_shedding(&self) {
        if !self.config.shedding_enabled {
            return;
        }

        let now = Utc::now();
        let proposals = {
            let mut view = self.view.lock().await;
            view.prune_recently_unloaded(now, self.config.shedding_grace_period);

            if view.brokers.len() < 2 {
                return;
            }

            self.strategies
                .iter()
                .map(|strategy| strategy.find_bundles_for_unloading(&view, &self.config, now))
                .find(|proposal| !proposal.is_empty())
        };

        let Some(proposals) = proposals else {
            return;
        };

        for (bundle, broker) in proposals {
            match self.admin.unload_namespace_bundle(&bundle, &broker).await {
                Ok(()) => {
                    let mut view = self.view.lock().await;
                    view.recently_unloaded.insert(bundle.clone(), now);
                    drop(view);
                    let _ = self
                        .monitor
                        .record(LoadManagerEvent::BundleShed {
                            timestamp: now,
                            bundle,
                            broker,
                        })
                        .await;
                }
                Err(err) => {
                    let _ = self
                        .monitor
                        .record(LoadManagerEvent::ShedFailed {
                            timestamp: now,
                            bundle,
                            broker,
                            message: err.to_string(),
                        })
                        .await;
                }
            }
        }
    }
}
