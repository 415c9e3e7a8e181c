//! Errors raised by the observability channel itself.

use thiserror::Error;

/// Errors that can occur while recording or snapshotting monitoring events.
#[derive(Debug, Error)]
pub enum MonitoringError {
    /// The monitor could not record an event.
    #[error("failed to record event: {message}")]
    Record { message: String },

    /// The monitor could not produce a snapshot.
    #[error("failed to snapshot monitor state: {message}")]
    Snapshot { message: String },
}

impl MonitoringError {
    pub fn record(message: impl Into<String>) -> Self {
        Self::Record {
            message: message.into(),
        }
    }

    pub fn snapshot(message: impl Into<String>) -> Self {
        Self::Snapshot {
            message: message.into(),
        }
    }
}
