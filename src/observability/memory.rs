//! History-tracking monitor, suitable for tests and operator introspection.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use super::error::MonitoringError;
use super::traits::{EventSeverity, Monitor, MonitoringEvent};
use super::types::MonitoringSnapshot;

/// Keeps the last `capacity` events in memory plus running counters by
/// severity, behind a single `parking_lot::Mutex` — recording is rare enough
/// per load-manager decision that lock-free structures would be overkill.
#[derive(Clone)]
pub struct InMemoryMonitor<E: MonitoringEvent> {
    inner: Arc<Mutex<Inner<E>>>,
    capacity: usize,
}

struct Inner<E: MonitoringEvent> {
    total: u64,
    warning: u64,
    error: u64,
    critical: u64,
    recent: VecDeque<E>,
}

impl<E: MonitoringEvent> InMemoryMonitor<E> {
    /// Create a monitor retaining at most `capacity` recent events.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                total: 0,
                warning: 0,
                error: 0,
                critical: 0,
                recent: VecDeque::with_capacity(capacity),
            })),
            capacity,
        }
    }
}

impl<E: MonitoringEvent> Default for InMemoryMonitor<E> {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[async_trait]
impl<E: MonitoringEvent> Monitor<E> for InMemoryMonitor<E> {
    async fn record(&self, event: E) -> Result<(), MonitoringError> {
        let mut inner = self.inner.lock();
        inner.total += 1;
        match event.severity() {
            EventSeverity::Warning => inner.warning += 1,
            EventSeverity::Error => inner.error += 1,
            EventSeverity::Critical => inner.critical += 1,
            _ => {}
        }
        if inner.recent.len() == self.capacity {
            inner.recent.pop_front();
        }
        inner.recent.push_back(event);
        Ok(())
    }

    async fn snapshot(&self) -> Result<MonitoringSnapshot<E>, MonitoringError> {
        let inner = self.inner.lock();
        Ok(MonitoringSnapshot {
            taken_at: Utc::now(),
            total_events: inner.total,
            warning_count: inner.warning,
            error_count: inner.error,
            critical_count: inner.critical,
            recent_events: inner.recent.iter().cloned().collect(),
        })
    }
}
