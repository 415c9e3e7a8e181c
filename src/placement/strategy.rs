//! Standard placement scoring strategies (§4.4 step 7).

// Layer 3: Internal module imports
use super::traits::PlacementStrategy;
use crate::ids::BrokerId;
use crate::model::{BundleData, LoadView};

/// Picks the candidate with the lowest `maxResourceUsage`, breaking ties by
/// advertised name for determinism (§8 S1: "strategy prefers lowest
/// maxResourceUsage").
#[derive(Debug, Default, Clone, Copy)]
pub struct LeastResourceUsageStrategy;

impl PlacementStrategy for LeastResourceUsageStrategy {
    fn select_broker(
        &self,
        candidates: &[BrokerId],
        _bundle_data: &BundleData,
        view: &LoadView,
    ) -> Option<BrokerId> {
        candidates
            .iter()
            .filter_map(|broker| {
                view.brokers
                    .get(broker)
                    .map(|state| (broker, state.local_data.resource_usage.max_resource_usage()))
            })
            .min_by(|(a_id, a_usage), (b_id, b_usage)| {
                a_usage
                    .partial_cmp(b_usage)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a_id.cmp(b_id))
            })
            .map(|(broker, _)| broker.clone())
    }
}
