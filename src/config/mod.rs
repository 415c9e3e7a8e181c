//! Load manager configuration with sensible defaults.

// Layer 1: Standard library
use std::time::Duration;

// Layer 2: Third-party
use serde::{Deserialize, Serialize};

// Layer 3: Internal
pub mod error;
pub use error::ConfigError;

/// Short-window sample capacity (§3): `N_SHORT`.
pub const N_SHORT: usize = 10;

/// Long-window sample capacity (§3): `N_LONG`.
pub const N_LONG: usize = 1000;

/// Default message rate (msg/s) seeded for a bundle with no persisted or
/// legacy-quota history (§4.3).
pub const DEFAULT_SEED_MSG_RATE: f64 = 50.0;

/// Default throughput (bytes/s) seeded for a bundle with no persisted or
/// legacy-quota history (§4.3).
pub const DEFAULT_SEED_THROUGHPUT: f64 = 50_000.0;

const DEFAULT_REPORT_UPDATE_MAX_INTERVAL: Duration = Duration::from_secs(5 * 60);
const DEFAULT_REPORT_UPDATE_THRESHOLD_PCT: f64 = 10.0;
const DEFAULT_BROKER_OVERLOADED_THRESHOLD_PCT: f64 = 85.0;
const DEFAULT_SHEDDING_GRACE_PERIOD: Duration = Duration::from_secs(30 * 60);
const DEFAULT_SHEDDING_ENABLED: bool = true;

/// System-wide configuration for the load manager.
///
/// Constructed either via [`Default`] or fluently via
/// [`LoadManagerConfig::builder`]; either way, call [`Self::validate`]
/// before starting the manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadManagerConfig {
    /// Publish ceiling: a broker publishes its report at least this often
    /// regardless of how small the observed deltas are (§4.1).
    #[serde(with = "crate::util::duration_secs")]
    pub report_update_max_interval: Duration,

    /// Percentage-point / percent-change threshold that triggers an
    /// out-of-cycle publish (§4.1).
    pub report_update_threshold_percentage: f64,

    /// A broker whose `maxResourceUsage` exceeds this percentage is
    /// considered overloaded by the placement overload guard (§4.4) and is
    /// eligible for shedding (§4.5).
    pub broker_overloaded_threshold_percentage: f64,

    /// A bundle unloaded by the shedder is not re-proposed until this long
    /// after the unload (§4.5).
    #[serde(with = "crate::util::duration_secs")]
    pub shedding_grace_period: Duration,

    /// Master switch for the shedding loop (§4.5).
    pub shedding_enabled: bool,
}

impl Default for LoadManagerConfig {
    fn default() -> Self {
        Self {
            report_update_max_interval: DEFAULT_REPORT_UPDATE_MAX_INTERVAL,
            report_update_threshold_percentage: DEFAULT_REPORT_UPDATE_THRESHOLD_PCT,
            broker_overloaded_threshold_percentage: DEFAULT_BROKER_OVERLOADED_THRESHOLD_PCT,
            shedding_grace_period: DEFAULT_SHEDDING_GRACE_PERIOD,
            shedding_enabled: DEFAULT_SHEDDING_ENABLED,
        }
    }
}

impl LoadManagerConfig {
    pub fn builder() -> LoadManagerConfigBuilder {
        LoadManagerConfigBuilder::default()
    }

    /// Reject nonsensical configuration before the manager starts (§6).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.report_update_max_interval.is_zero() {
            return Err(ConfigError::MustBePositive {
                field: "report_update_max_interval",
                value: 0.0,
            });
        }
        if !(0.0..=100.0).contains(&self.report_update_threshold_percentage) {
            return Err(ConfigError::NotAPercentage {
                field: "report_update_threshold_percentage",
                value: self.report_update_threshold_percentage,
            });
        }
        if !(0.0..=100.0).contains(&self.broker_overloaded_threshold_percentage) {
            return Err(ConfigError::NotAPercentage {
                field: "broker_overloaded_threshold_percentage",
                value: self.broker_overloaded_threshold_percentage,
            });
        }
        if self.shedding_grace_period.is_zero() {
            return Err(ConfigError::MustBePositive {
                field: "shedding_grace_period",
                value: 0.0,
            });
        }
        Ok(())
    }
}

/// Fluent builder for [`LoadManagerConfig`].
#[derive(Debug, Default)]
pub struct LoadManagerConfigBuilder {
    config: LoadManagerConfig,
}

impl LoadManagerConfigBuilder {
    pub fn report_update_max_interval(mut self, interval: Duration) -> Self {
        self.config.report_update_max_interval = interval;
        self
    }

    pub fn report_update_threshold_percentage(mut self, pct: f64) -> Self {
        self.config.report_update_threshold_percentage = pct;
        self
    }

    pub fn broker_overloaded_threshold_percentage(mut self, pct: f64) -> Self {
        self.config.broker_overloaded_threshold_percentage = pct;
        self
    }

    pub fn shedding_grace_period(mut self, period: Duration) -> Self {
        self.config.shedding_grace_period = period;
        self
    }

    pub fn shedding_enabled(mut self, enabled: bool) -> Self {
        self.config.shedding_enabled = enabled;
        self
    }

    pub fn build(self) -> Result<LoadManagerConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
