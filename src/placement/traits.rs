//! Pluggable placement capabilities (§9: "filter(candidates, bundleData,
//! loadView, cfg) → candidates'", "selectBroker(...) → broker").

// Layer 2: Third-party crate imports
use async_trait::async_trait;

// Layer 3: Internal module imports
use super::error::{FilterError, PlacementError};
use crate::ids::{BrokerId, BundleId};
use crate::model::{BundleData, LoadView};

/// Restricts the candidate broker set for a bundle by tenant/namespace
/// policy (§4.4 step 3): primary, secondary, shared fallback order,
/// delegated to the surrounding namespace service (§1 out-of-scope
/// external).
#[async_trait]
pub trait NamespacePolicy: Send + Sync {
    async fn candidate_brokers(
        &self,
        bundle: &BundleId,
        all_brokers: &[BrokerId],
    ) -> Result<Vec<BrokerId>, PlacementError>;
}

/// One step of the ordered filter pipeline (§4.4 step 5). A filter that
/// fails is handled by the pipeline, not by the filter: it restores the
/// full policy-compliant set and moves on (§7).
pub trait BrokerFilter: Send + Sync {
    fn name(&self) -> &'static str;

    fn filter(
        &self,
        candidates: &[BrokerId],
        bundle_data: &BundleData,
        view: &LoadView,
    ) -> Result<Vec<BrokerId>, FilterError>;
}

/// Scores and picks one broker from a non-empty candidate set (§4.4 step
/// 7). Implementations must return a broker present in `candidates`.
pub trait PlacementStrategy: Send + Sync {
    fn select_broker(
        &self,
        candidates: &[BrokerId],
        bundle_data: &BundleData,
        view: &LoadView,
    ) -> Option<BrokerId>;
}
