//! # Engine Configuration
//!
//! Thresholds the aggregation engine works with. Every field has a default,
//! so an empty TOML table (or no file at all) gives the stock behaviour.
//!
//! ```toml
//! low_stock_threshold = 50
//! collection_horizon_days = 7
//! cache_bucket_secs = 60
//!
//! [debt]
//! warning_change_count = 3
//! recovery_change_count = 4
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::{DEFAULT_LOW_STOCK_THRESHOLD, DEFAULT_RECOVERY_CHANGE_COUNT, DEFAULT_WARNING_CHANGE_COUNT};

/// Thresholds for the aggregation engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Stock at or below this is `LOW_STOCK`.
    pub low_stock_threshold: i64,

    /// Due-date extension thresholds.
    pub debt: DebtPolicy,

    /// How far ahead the upcoming-collections report looks.
    pub collection_horizon_days: u32,

    /// Width of the cache time bucket.
    pub cache_bucket_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            debt: DebtPolicy::default(),
            collection_horizon_days: 7,
            cache_bucket_secs: 60,
        }
    }
}

impl EngineConfig {
    /// Checks that the thresholds are consistent.
    pub fn validate(&self) -> CoreResult<()> {
        if self.cache_bucket_secs == 0 {
            return Err(CoreError::InvalidConfig(
                "cache_bucket_secs must be greater than zero".to_string(),
            ));
        }

        self.debt.validate()
    }
}

/// Change-count thresholds for debt classification.
///
/// An unpaid order whose due date was pushed back exactly
/// `warning_change_count` times is `WARNING`; at `recovery_change_count`
/// or more it is `RECOVERY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct DebtPolicy {
    pub warning_change_count: u32,
    pub recovery_change_count: u32,
}

impl Default for DebtPolicy {
    fn default() -> Self {
        Self {
            warning_change_count: DEFAULT_WARNING_CHANGE_COUNT,
            recovery_change_count: DEFAULT_RECOVERY_CHANGE_COUNT,
        }
    }
}

impl DebtPolicy {
    pub fn validate(&self) -> CoreResult<()> {
        if self.warning_change_count >= self.recovery_change_count {
            return Err(CoreError::InvalidConfig(format!(
                "warning_change_count ({}) must be below recovery_change_count ({})",
                self.warning_change_count, self.recovery_change_count
            )));
        }
        Ok(())
    }
}
