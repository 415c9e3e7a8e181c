//! Standard shedding strategy: unload the busiest bundle on each overloaded
//! broker (§4.5, §8 S6).

// Layer 1: Standard library imports
use std::collections::HashMap;

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc};

// Layer 3: Internal module imports
use super::traits::LoadSheddingStrategy;
use crate::config::LoadManagerConfig;
use crate::ids::{BrokerId, BundleId};
use crate::model::LoadView;

/// For every broker whose `maxResourceUsage` exceeds the overload
/// threshold, proposes unloading the single bundle it hosts with the
/// largest short-term `msgRate + throughput`, skipping bundles still
/// within the shedding grace period (§4.5: "must consult
/// recentlyUnloadedBundles").
#[derive(Debug, Default, Clone, Copy)]
pub struct OverloadedBrokerStrategy;

impl LoadSheddingStrategy for OverloadedBrokerStrategy {
    fn find_bundles_for_unloading(
        &self,
        view: &LoadView,
        config: &LoadManagerConfig,
        now: DateTime<Utc>,
    ) -> HashMap<BundleId, BrokerId> {
        let mut proposals = HashMap::new();

        for (broker, state) in &view.brokers {
            let overloaded = state.local_data.resource_usage.max_resource_usage()
                > config.broker_overloaded_threshold_percentage / 100.0;
            if !overloaded {
                continue;
            }

            let busiest = state
                .local_data
                .last_stats
                .keys()
                .filter(|bundle| !view.is_within_shedding_grace(bundle, now, config.shedding_grace_period))
                .filter_map(|bundle| {
                    view.bundle_stats
                        .get(bundle)
                        .map(|stats| (bundle.clone(), stats.short_term_msg_rate() + stats.short_term_throughput()))
                })
                .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

            if let Some((bundle, _)) = busiest {
                proposals.insert(bundle, broker.clone());
            }
        }

        proposals
    }
}
