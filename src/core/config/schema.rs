//! core::config::schema
//!
//! Configuration schema types.
//!
//! The same schema is used for the global file and the enlistment file;
//! every value is optional so that a later scope only overrides what it
//! names.
//!
//! # Example
//!
//! ```toml
//! [lock]
//! retry_interval_ms = 250
//! max_attempts = 2400
//!
//! [service]
//! pipe_path = "/repos/os/.gvfs/GVFS_NetCorePipe"
//!
//! [output]
//! progress = true
//! release_display_threshold = 100
//!
//! [upgrade]
//! reminder = true
//! reminder_frequency = 5
//! ```
//!
//! # Validation
//!
//! Values are checked after parsing. Unknown keys are rejected at parse
//! time.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Longest retry interval accepted, in milliseconds.
pub const MAX_RETRY_INTERVAL_MS: u64 = 60_000;

/// One configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct HooksConfig {
    /// Acquire retry behaviour
    pub lock: Option<LockSection>,

    /// Service endpoint override
    pub service: Option<ServiceSection>,

    /// User-facing output
    pub output: Option<OutputSection>,

    /// Upgrade reminder
    pub upgrade: Option<UpgradeSection>,
}

impl HooksConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(lock) = &self.lock {
            lock.validate()?;
        }
        if let Some(upgrade) = &self.upgrade {
            if upgrade.reminder_frequency == Some(0) {
                return Err(ConfigError::InvalidValue(
                    "upgrade.reminder_frequency must be at least 1".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// `[lock]`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LockSection {
    /// Delay between Acquire retries while the lock is held elsewhere.
    pub retry_interval_ms: Option<u64>,

    /// Give up after this many Acquire attempts. Unset means never.
    pub max_attempts: Option<u32>,
}

impl LockSection {
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(interval) = self.retry_interval_ms {
            if interval == 0 || interval > MAX_RETRY_INTERVAL_MS {
                return Err(ConfigError::InvalidValue(format!(
                    "lock.retry_interval_ms must be between 1 and {}, got {}",
                    MAX_RETRY_INTERVAL_MS, interval
                )));
            }
        }
        if self.max_attempts == Some(0) {
            return Err(ConfigError::InvalidValue(
                "lock.max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// `[service]`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceSection {
    pub pipe_path: Option<PathBuf>,
}

/// `[output]`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSection {
    /// Show a spinner while waiting for the lock (interactive sessions only).
    pub progress: Option<bool>,

    /// Above this many failed files, print counts instead of paths.
    pub release_display_threshold: Option<usize>,
}

/// `[upgrade]`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct UpgradeSection {
    pub reminder: Option<bool>,

    /// Remind on roughly one in this many post-command runs.
    pub reminder_frequency: Option<u32>,

    pub marker_path: Option<PathBuf>,
}
