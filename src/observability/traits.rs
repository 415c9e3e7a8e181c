//! Core observability traits: a generic event, and a generic sink for it.

// Layer 1: Standard library imports
use std::fmt::Debug;

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

// Layer 3: Internal module imports
use super::error::MonitoringError;
use super::types::MonitoringSnapshot;

/// Severity levels for filtering and categorizing monitoring events.
///
/// Ordered from lowest to highest for filtering purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum EventSeverity {
    Trace,
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

/// Trait for events that can be observed through a `Monitor`.
///
/// Mirrors the coordination-store's own typed-payload discipline: every
/// event type is known at compile time, so recording one never requires
/// runtime type checks or downcasting.
pub trait MonitoringEvent: Send + Sync + Clone + Debug + Serialize + 'static {
    /// Static event type identifier, used for snapshot categorization.
    const EVENT_TYPE: &'static str;

    /// When the event occurred.
    fn timestamp(&self) -> DateTime<Utc>;

    /// The event's severity.
    fn severity(&self) -> EventSeverity;
}

/// A generic sink for monitoring events.
///
/// The load manager never depends on a concrete logging backend: every
/// component that can emit events is generic over (or holds a handle to) a
/// `Monitor<E>`. Production wiring plugs in [`super::noop::NoopMonitor`];
/// tests plug in [`super::memory::InMemoryMonitor`].
#[async_trait]
pub trait Monitor<E: MonitoringEvent>: Send + Sync + Clone {
    /// Records an event. Never blocks on I/O — implementations that need to
    /// ship events elsewhere must buffer and flush asynchronously.
    async fn record(&self, event: E) -> Result<(), MonitoringError>;

    /// Produces a point-in-time snapshot of recorded events.
    async fn snapshot(&self) -> Result<MonitoringSnapshot<E>, MonitoringError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_orders_trace_below_critical() {
        assert!(EventSeverity::Trace < EventSeverity::Debug);
        assert!(EventSeverity::Debug < EventSeverity::Info);
        assert!(EventSeverity::Info < EventSeverity::Warning);
        assert!(EventSeverity::Warning < EventSeverity::Error);
        assert!(EventSeverity::Error < EventSeverity::Critical);
    }
}
