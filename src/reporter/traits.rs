//! Collaborators sampled by the local reporter (§1 out-of-scope externals,
//! §4.1).

// Layer 1: Standard library imports
use std::collections::HashMap;

// Layer 2: Third-party crate imports
use async_trait::async_trait;

// Layer 3: Internal module imports
use super::error::ReporterError;
use crate::ids::BundleId;
use crate::model::{NamespaceBundleStats, SystemResourceUsage};

/// Samples CPU / memory / bandwidth of the local machine (§1: "the host
/// probe"). Implemented by the surrounding broker; never by the core.
#[async_trait]
pub trait HostResourceProbe: Send + Sync {
    async fn sample(&self) -> Result<SystemResourceUsage, ReporterError>;
}

/// Reads the current per-bundle traffic stats from the local serving layer
/// (§4.1: "the current bundle-stats snapshot taken from the local serving
/// layer").
#[async_trait]
pub trait LocalBundleStatsSource: Send + Sync {
    async fn snapshot(&self) -> Result<HashMap<BundleId, NamespaceBundleStats>, ReporterError>;
}
