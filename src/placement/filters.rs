//! Standard broker filters (§4.4 step 5: "at minimum a version filter").

// Layer 1: Standard library imports
use std::collections::HashMap;

// Layer 3: Internal module imports
use super::error::FilterError;
use super::traits::BrokerFilter;
use crate::ids::BrokerId;
use crate::model::{BundleData, LoadView};

/// Excludes brokers whose running version differs from the majority among
/// the candidates. Ties are broken by the lexicographically smallest
/// version, for determinism.
#[derive(Debug, Default, Clone, Copy)]
pub struct VersionFilter;

impl BrokerFilter for VersionFilter {
    fn name(&self) -> &'static str {
        "version_filter"
    }

    fn filter(
        &self,
        candidates: &[BrokerId],
        _bundle_data: &BundleData,
        view: &LoadView,
    ) -> Result<Vec<BrokerId>, FilterError> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for broker in candidates {
            if let Some(state) = view.brokers.get(broker) {
                *counts.entry(state.local_data.version.as_str()).or_insert(0) += 1;
            }
        }
        if counts.is_empty() {
            return Ok(candidates.to_vec());
        }

        let max_count = *counts.values().max().unwrap_or(&0);
        let majority_version = counts
            .into_iter()
            .filter(|(_, count)| *count == max_count)
            .map(|(version, _)| version)
            .min()
            .expect("at least one candidate has a version");

        Ok(candidates
            .iter()
            .filter(|broker| {
                view.brokers
                    .get(*broker)
                    .map(|state| state.local_data.version == majority_version)
                    .unwrap_or(false)
            })
            .cloned()
            .collect())
    }
}
