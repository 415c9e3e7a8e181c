//! Data model (§3): rolling windows, per-bundle and per-broker state, and
//! the aggregator's root view.

mod broker;
mod bundle;
mod load_view;
mod window;

pub use broker::{BrokerState, LocalBrokerData, SystemResourceUsage, TimeAverageData};
pub use bundle::{BundleData, BundleStats, NamespaceBundleStats, ResourceQuota, WindowPair};
pub use load_view::{LoadView, NamespaceFanout, PreallocationIndex};
pub use window::RollingWindow;
