//! Snapshot type shared by all `Monitor<E>` implementations.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::traits::MonitoringEvent;

/// A point-in-time view of everything a monitor has recorded.
#[derive(Debug, Clone, Serialize)]
pub struct MonitoringSnapshot<E: MonitoringEvent> {
    pub taken_at: DateTime<Utc>,
    pub total_events: u64,
    pub warning_count: u64,
    pub error_count: u64,
    pub critical_count: u64,
    pub recent_events: Vec<E>,
}
