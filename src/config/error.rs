//! Configuration validation errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be greater than zero, got {value}")]
    MustBePositive { field: &'static str, value: f64 },

    #[error("{field} must be within 0..=100, got {value}")]
    NotAPercentage { field: &'static str, value: f64 },
}
