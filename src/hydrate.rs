//! Bundle-stats hydration shared by the aggregator and the placement
//! pipeline (§4.3 step 2, §4.4 step 2): persisted `BundleData`, else a
//! legacy `ResourceQuota`, else the default seed.

use crate::ids::BundleId;
use crate::model::{BundleStats, ResourceQuota};
use crate::store::{paths, CoordinationStore, StoreError};

/// Materialize a bundle's `BundleStats` for a bundle not yet present in the
/// `LoadView`, in the order the spec prescribes (§6 legacy seeding).
pub async fn hydrate_bundle_stats<S: CoordinationStore>(
    store: &S,
    bundle: &BundleId,
) -> Result<BundleStats, StoreError> {
    if let Some(data) = store
        .get_json::<crate::model::BundleData>(&paths::bundle_data_path(bundle.as_str()))
        .await?
    {
        return Ok(data.stats);
    }
    if let Some(quota) = store
        .get_json::<ResourceQuota>(&paths::resource_quota_path(bundle.as_str()))
        .await?
    {
        return Ok(BundleStats::from_legacy_quota(&quota));
    }
    Ok(BundleStats::default_seeded())
}
