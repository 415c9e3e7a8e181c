//! The load manager's own event vocabulary.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::traits::{EventSeverity, MonitoringEvent};
use crate::ids::{BrokerId, BundleId};

/// Every observable state transition the load manager produces.
///
/// Each variant corresponds to a decision point named in the spec (§2, §4):
/// a broker publishing a report, a bundle being placed or settling, a dead
/// broker being reaped, a bundle being shed, or a publish being skipped.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind")]
pub enum LoadManagerEvent {
    /// A broker's `LocalBrokerData` was published to the coordination store.
    BrokerReported {
        timestamp: DateTime<Utc>,
        broker: BrokerId,
        num_bundles: usize,
    },

    /// Placement recorded a new preallocation for `bundle`.
    BundleAssigned {
        timestamp: DateTime<Utc>,
        bundle: BundleId,
        broker: BrokerId,
    },

    /// A previously preallocated bundle was observed in its owner's
    /// `lastStats`, i.e. the assignment took effect.
    BundleSettled {
        timestamp: DateTime<Utc>,
        bundle: BundleId,
        broker: BrokerId,
    },

    /// A broker was removed from the load view after dropping out of
    /// membership.
    BrokerReaped {
        timestamp: DateTime<Utc>,
        broker: BrokerId,
        reaped_preallocations: usize,
    },

    /// The shedding loop unloaded a bundle from an overloaded broker.
    BundleShed {
        timestamp: DateTime<Utc>,
        bundle: BundleId,
        broker: BrokerId,
    },

    /// The admin client failed to unload a bundle the shedding loop
    /// selected; shedding continues with the next pair (§7).
    ShedFailed {
        timestamp: DateTime<Utc>,
        bundle: BundleId,
        broker: BrokerId,
        message: String,
    },

    /// The local reporter evaluated the publish predicate and chose not to
    /// publish.
    PublishSkipped {
        timestamp: DateTime<Utc>,
        broker: BrokerId,
    },
}

impl MonitoringEvent for LoadManagerEvent {
    const EVENT_TYPE: &'static str = "load_manager";

    fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::BrokerReported { timestamp, .. }
            | Self::BundleAssigned { timestamp, .. }
            | Self::BundleSettled { timestamp, .. }
            | Self::BrokerReaped { timestamp, .. }
            | Self::BundleShed { timestamp, .. }
            | Self::ShedFailed { timestamp, .. }
            | Self::PublishSkipped { timestamp, .. } => *timestamp,
        }
    }

    fn severity(&self) -> EventSeverity {
        match self {
            Self::BrokerReported { .. } | Self::PublishSkipped { .. } => EventSeverity::Trace,
            Self::BundleAssigned { .. } | Self::BundleSettled { .. } => EventSeverity::Info,
            Self::BrokerReaped { .. } | Self::BundleShed { .. } => EventSeverity::Warning,
            Self::ShedFailed { .. } => EventSeverity::Error,
        }
    }
}
