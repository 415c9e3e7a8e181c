//! Pluggable shedding capability and the admin-client collaborator (§4.5,
//! §9: "findBundlesForUnloading(loadView, cfg) → {bundle → broker}").

// Layer 1: Standard library imports
use std::collections::HashMap;

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use chrono::{DateTime, Utc};

// Layer 3: Internal module imports
use crate::config::LoadManagerConfig;
use crate::ids::{BrokerId, BundleId};
use crate::model::LoadView;

use super::error::SheddingError;

/// One step of the ordered strategy list (§4.5). The **first** strategy to
/// return a non-empty map wins; the shedding loop never merges results from
/// more than one. `now` is threaded through explicitly (rather than read
/// from the clock here) so a strategy's grace-period check is testable
/// without a running clock.
pub trait LoadSheddingStrategy: Send + Sync {
    fn find_bundles_for_unloading(
        &self,
        view: &LoadView,
        config: &LoadManagerConfig,
        now: DateTime<Utc>,
    ) -> HashMap<BundleId, BrokerId>;
}

/// Issues the actual "unload bundle" RPC (§1 out-of-scope external).
#[async_trait]
pub trait AdminClient: Send + Sync {
    async fn unload_namespace_bundle(&self, bundle: &BundleId, broker: &BrokerId) -> Result<(), SheddingError>;
}
