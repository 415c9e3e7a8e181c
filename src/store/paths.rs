//! Coordination-store path layout (§6 — paths are exact).

use crate::ids::BrokerId;

pub const BROKERS_ROOT: &str = "/loadbalance/brokers";
pub const BUNDLE_DATA_ROOT: &str = "/loadbalance/bundle-data";
pub const BROKER_TIME_AVERAGE_ROOT: &str = "/loadbalance/broker-time-average";
pub const RESOURCE_QUOTA_ROOT: &str = "/loadbalance/resource-quota/namespace";

/// `/loadbalance/brokers/<advertised>` (ephemeral, `LocalBrokerData`).
pub fn broker_znode(broker: &BrokerId) -> String {
    format!("{BROKERS_ROOT}/{broker}")
}

/// `/loadbalance/bundle-data/<bundle>` (persistent, `BundleData`).
pub fn bundle_data_path(bundle_key: &str) -> String {
    format!("{BUNDLE_DATA_ROOT}/{bundle_key}")
}

/// `/loadbalance/broker-time-average/<advertised>` (persistent, `TimeAverageBrokerData`).
pub fn broker_time_average_path(broker: &BrokerId) -> String {
    format!("{BROKER_TIME_AVERAGE_ROOT}/{broker}")
}

/// `/loadbalance/resource-quota/namespace/<bundle>` (persistent, legacy).
pub fn resource_quota_path(bundle_key: &str) -> String {
    format!("{RESOURCE_QUOTA_ROOT}/{bundle_key}")
}
