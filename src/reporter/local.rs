//! Local reporter (§4.1): produces and publishes this broker's
//! `LocalBrokerData`.

// Layer 1: Standard library imports
use std::collections::HashSet;

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

// Layer 3: Internal module imports
use super::error::ReporterError;
use super::traits::{HostResourceProbe, LocalBundleStatsSource};
use crate::config::LoadManagerConfig;
use crate::ids::BrokerId;
use crate::model::LocalBrokerData;
use crate::observability::{LoadManagerEvent, Monitor};
use crate::store::{paths, CoordinationStore};

/// `percentChange(old, new)` (§4.1): `100 · |old−new|/old` when `old≠0`;
/// `0` if both are zero; `+∞` otherwise.
fn percent_change(old: f64, new: f64) -> f64 {
    if old == 0.0 {
        if new == 0.0 {
            0.0
        } else {
            f64::INFINITY
        }
    } else {
        100.0 * (old - new).abs() / old
    }
}

/// The publish predicate (§4.1). Kept as a free function over the two
/// `LocalBrokerData` snapshots so it's testable without a running reporter.
fn needs_publish(
    last_published: &LocalBrokerData,
    current: &LocalBrokerData,
    last_publish_at: DateTime<Utc>,
    now: DateTime<Utc>,
    config: &LoadManagerConfig,
) -> bool {
    let max_interval = chrono::Duration::from_std(config.report_update_max_interval)
        .unwrap_or(chrono::Duration::MAX);
    if now.signed_duration_since(last_publish_at) >= max_interval {
        return true;
    }

    // Absolute percentage-point gap, not a percent change (§9: load-bearing).
    let usage_delta_points = (last_published.resource_usage.max_resource_usage()
        - current.resource_usage.max_resource_usage())
    .abs()
        * 100.0;
    let rate_change = percent_change(last_published.total_msg_rate(), current.total_msg_rate());
    let throughput_change = percent_change(
        last_published.total_msg_throughput(),
        current.total_msg_throughput(),
    );
    let bundles_change = percent_change(
        last_published.num_bundles() as f64,
        current.num_bundles() as f64,
    );

    [usage_delta_points, rate_change, throughput_change, bundles_change]
        .into_iter()
        .fold(0.0_f64, f64::max)
        > config.report_update_threshold_percentage
}

struct ReporterState {
    local_data: LocalBrokerData,
    last_published: LocalBrokerData,
    last_publish_at: DateTime<Utc>,
}

/// Produces and conditionally publishes `LocalBrokerData` for this broker
/// (§4.1).
pub struct LocalReporter<S, P, B, M> {
    broker_id: BrokerId,
    store: S,
    probe: P,
    bundle_source: B,
    monitor: M,
    config: LoadManagerConfig,
    state: Mutex<ReporterState>,
}

impl<S, P, B, M> LocalReporter<S, P, B, M>
where
    S: CoordinationStore,
    P: HostResourceProbe,
    B: LocalBundleStatsSource,
    M: Monitor<LoadManagerEvent>,
{
    pub fn new(
        broker_id: BrokerId,
        web_service_url: impl Into<String>,
        version: impl Into<String>,
        store: S,
        probe: P,
        bundle_source: B,
        monitor: M,
        config: LoadManagerConfig,
    ) -> Self {
        let local_data = LocalBrokerData::new(web_service_url, version);
        let state = ReporterState {
            last_published: local_data.clone(),
            local_data,
            // Far enough in the past that the very first
            // `write_broker_data_if_needed` always publishes.
            last_publish_at: DateTime::<Utc>::UNIX_EPOCH,
        };
        Self {
            broker_id,
            store,
            probe,
            bundle_source,
            monitor,
            config,
            state: Mutex::new(state),
        }
    }

    /// A clone of the current in-memory `LocalBrokerData` (for diagnostics
    /// and for the aggregator's self-view on the leader's own broker).
    pub async fn current(&self) -> LocalBrokerData {
        self.state.lock().await.local_data.clone()
    }

    /// Sample the host probe and local serving layer, updating in-memory
    /// `localData` including gain/loss deltas (§4.1).
    pub async fn update_local_broker_data(&self) -> Result<(), ReporterError> {
        let usage = self.probe.sample().await?;
        let bundles = self.bundle_source.snapshot().await?;

        let mut state = self.state.lock().await;
        let gains: HashSet<_> = bundles
            .keys()
            .filter(|b| !state.local_data.last_stats.contains_key(*b))
            .cloned()
            .collect();
        let losses: HashSet<_> = state
            .local_data
            .last_stats
            .keys()
            .filter(|b| !bundles.contains_key(*b))
            .cloned()
            .collect();

        let num_bundles = bundles.len();
        state.local_data.resource_usage = usage;
        state.local_data.last_stats = bundles;
        state.local_data.last_bundle_gains = gains;
        state.local_data.last_bundle_losses = losses;
        state.local_data.last_update = Utc::now();
        drop(state);

        let _ = self
            .monitor
            .record(LoadManagerEvent::BrokerReported {
                timestamp: Utc::now(),
                broker: self.broker_id.clone(),
                num_bundles,
            })
            .await;
        Ok(())
    }

    /// `writeBrokerDataIfNeeded` (§4.1): update, evaluate the publish
    /// predicate, and publish to `/loadbalance/brokers/<advertised>` if it
    /// holds. Returns whether a publish happened.
    pub async fn write_broker_data_if_needed(&self) -> Result<bool, ReporterError> {
        self.update_local_broker_data().await?;

        let mut state = self.state.lock().await;
        let now = Utc::now();
        if !needs_publish(
            &state.last_published,
            &state.local_data,
            state.last_publish_at,
            now,
            &self.config,
        ) {
            let _ = self
                .monitor
                .record(LoadManagerEvent::PublishSkipped {
                    timestamp: now,
                    broker: self.broker_id.clone(),
                })
                .await;
            return Ok(false);
        }

        self.store
            .set_json(&paths::broker_znode(&self.broker_id), &state.local_data)
            .await?;

        state.local_data.last_bundle_gains.clear();
        state.local_data.last_bundle_losses.clear();
        state.last_published = state.local_data.clone();
        state.last_publish_at = now;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SystemResourceUsage;

    fn usage(max: f64) -> SystemResourceUsage {
        SystemResourceUsage {
            cpu: max,
            memory: 0.0,
            direct_memory: 0.0,
            bandwidth_in: 0.0,
            bandwidth_out: 0.0,
        }
    }

    #[test]
    fn percent_change_zero_to_zero_is_zero() {
        assert_eq!(percent_change(0.0, 0.0), 0.0);
    }

    #[test]
    fn percent_change_zero_to_nonzero_is_infinite() {
        assert_eq!(percent_change(0.0, 5.0), f64::INFINITY);
    }

    #[test]
    fn s5_publish_predicate_fires_on_usage_gap() {
        let mut last = LocalBrokerData::new("http://b", "1.0");
        last.resource_usage = usage(0.50);
        let mut current = last.clone();
        current.resource_usage = usage(0.58);

        let config = LoadManagerConfig::builder()
            .report_update_threshold_percentage(5.0)
            .build()
            .unwrap();
        let now = Utc::now();
        assert!(needs_publish(&last, &current, now, now, &config));
    }

    #[test]
    fn publish_predicate_false_when_deltas_small_and_interval_not_elapsed() {
        let last = LocalBrokerData::new("http://b", "1.0");
        let current = last.clone();
        let config = LoadManagerConfig::default();
        let now = Utc::now();
        assert!(!needs_publish(&last, &current, now, now, &config));
    }

    #[test]
    fn publish_predicate_true_once_max_interval_elapsed() {
        let last = LocalBrokerData::new("http://b", "1.0");
        let current = last.clone();
        let config = LoadManagerConfig::default();
        let last_publish_at = DateTime::<Utc>::UNIX_EPOCH;
        let now = Utc::now();
        assert!(needs_publish(&last, &current, last_publish_at, now, &config));
    }
}
