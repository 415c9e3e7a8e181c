//! Convenience re-exports of the types most call sites need.
//!
//! ```rust,ignore
//! use broker_loadmgr::prelude::*;
//! ```

// Core
pub use crate::config::{ConfigError, LoadManagerConfig};
pub use crate::error::LoadManagerError;
pub use crate::ids::{BrokerId, BundleId, NamespaceName};
pub use crate::manager::LoadManager;
pub use crate::model::{
    BrokerState, BundleData, BundleStats, LoadView, LocalBrokerData, SystemResourceUsage, TimeAverageData,
};

// Reporting and aggregation
pub use crate::aggregator::{Aggregator, AggregatorError};
pub use crate::reporter::{HostResourceProbe, LocalBundleStatsSource, LocalReporter, ReporterError};
pub use crate::scheduler::{Scheduler, SchedulerError, SchedulerTask, SchedulerTaskHandler};

// Placement
pub use crate::placement::filters::VersionFilter;
pub use crate::placement::strategy::LeastResourceUsageStrategy;
pub use crate::placement::{BrokerFilter, FilterError, NamespacePolicy, PlacementError, PlacementStrategy};

// Shedding
pub use crate::shedding::{AdminClient, LoadSheddingStrategy, LoadShedder, OverloadedBrokerStrategy, SheddingError};

// Store
pub use crate::store::{CoordinationStore, CreateMode, MemoryCoordinationStore, StoreError};

// Observability
pub use crate::observability::{
    InMemoryMonitor, LoadManagerEvent, Monitor, MonitoringError, MonitoringSnapshot, NoopMonitor,
};
