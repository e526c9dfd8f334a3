//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! The hooks have two configuration scopes:
//! - **Global**: User-level settings
//! - **Enlistment**: Per-enlistment overrides
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Enlistment config file
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$GVFS_HOOKS_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/gvfs/hooks.toml`
//! 3. `~/.gvfs/hooks.toml`
//!
//! # Enlistment Config Location
//!
//! `<enlistment>/.gvfs/hooks.toml`
//!
//! # Example
//!
//! ```no_run
//! use gvfs_hooks::core::config::Config;
//!
//! let config = Config::load(None).unwrap();
//! println!("retry every {:?}", config.retry_interval());
//! ```

pub mod schema;

pub use schema::{HooksConfig, LockSection, OutputSection, ServiceSection, UpgradeSection};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::core::paths::EnlistmentPaths;

/// Environment variable naming an explicit global config file.
pub const CONFIG_ENV: &str = "GVFS_HOOKS_CONFIG";

/// Default delay between Acquire retries.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(250);

/// Default number of failed files listed individually after a Release.
pub const DEFAULT_RELEASE_DISPLAY_THRESHOLD: usize = 100;

/// Default upgrade reminder odds (one in N).
pub const DEFAULT_REMINDER_FREQUENCY: u32 = 5;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Merged configuration from all sources.
///
/// Accessors apply precedence: enlistment values override global values,
/// which override defaults.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: HooksConfig,
    /// Enlistment configuration (if inside an enlistment that has one)
    pub enlistment: Option<HooksConfig>,
    /// Enlistment the config was loaded for
    enlistment_paths: Option<EnlistmentPaths>,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read, parsed,
    /// or validated. Missing files are not an error.
    pub fn load(enlistment: Option<&EnlistmentPaths>) -> Result<Self, ConfigError> {
        let global_path = Self::find_global();
        let mut config = Self::load_from(
            global_path.as_deref(),
            enlistment.map(EnlistmentPaths::config_path).as_deref(),
        )?;
        config.enlistment_paths = enlistment.cloned();
        Ok(config)
    }

    /// Load from explicit file locations; absent files are skipped.
    pub fn load_from(
        global_path: Option<&Path>,
        enlistment_path: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let global = match global_path {
            Some(path) if path.exists() => Self::read_config(path)?,
            _ => HooksConfig::default(),
        };
        let enlistment = match enlistment_path {
            Some(path) if path.exists() => Some(Self::read_config(path)?),
            _ => None,
        };

        global.validate()?;
        if let Some(ref e) = enlistment {
            e.validate()?;
        }

        Ok(Config {
            global,
            enlistment,
            enlistment_paths: None,
        })
    }

    /// Locate the global config file, if any exists.
    fn find_global() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("gvfs/hooks.toml");
            if path.exists() {
                return Some(path);
            }
        }

        dirs::home_dir()
            .map(|home| home.join(".gvfs/hooks.toml"))
            .filter(|path| path.exists())
    }

    fn read_config(path: &Path) -> Result<HooksConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// First value found walking enlistment then global scope.
    fn lookup<T>(&self, get: impl Fn(&HooksConfig) -> Option<T>) -> Option<T> {
        self.enlistment
            .as_ref()
            .and_then(&get)
            .or_else(|| get(&self.global))
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Delay between Acquire retries.
    ///
    /// Defaults to 250ms.
    pub fn retry_interval(&self) -> Duration {
        self.lookup(|c| c.lock.as_ref().and_then(|l| l.retry_interval_ms))
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_RETRY_INTERVAL)
    }

    /// Maximum Acquire attempts.
    ///
    /// Defaults to `None`: retry until the service grants or refuses.
    pub fn max_attempts(&self) -> Option<u32> {
        self.lookup(|c| c.lock.as_ref().and_then(|l| l.max_attempts))
    }

    /// Service endpoint, from config or derived from the enlistment.
    pub fn pipe_path(&self) -> Option<PathBuf> {
        self.lookup(|c| c.service.as_ref().and_then(|s| s.pipe_path.clone()))
            .or_else(|| self.enlistment_paths.as_ref().map(|p| p.pipe_path()))
    }

    /// Whether to render a spinner while waiting.
    ///
    /// Defaults to `true`.
    pub fn progress(&self) -> bool {
        self.lookup(|c| c.output.as_ref().and_then(|o| o.progress))
            .unwrap_or(true)
    }

    /// Defaults to 100.
    pub fn release_display_threshold(&self) -> usize {
        self.lookup(|c| c.output.as_ref().and_then(|o| o.release_display_threshold))
            .unwrap_or(DEFAULT_RELEASE_DISPLAY_THRESHOLD)
    }

    /// Defaults to `true`.
    pub fn upgrade_reminder(&self) -> bool {
        self.lookup(|c| c.upgrade.as_ref().and_then(|u| u.reminder))
            .unwrap_or(true)
    }

    /// Defaults to 5.
    pub fn reminder_frequency(&self) -> u32 {
        self.lookup(|c| c.upgrade.as_ref().and_then(|u| u.reminder_frequency))
            .unwrap_or(DEFAULT_REMINDER_FREQUENCY)
    }

    /// Marker file whose presence means an upgrade is staged.
    pub fn upgrade_marker_path(&self) -> Option<PathBuf> {
        self.lookup(|c| c.upgrade.as_ref().and_then(|u| u.marker_path.clone()))
            .or_else(|| {
                self.enlistment_paths
                    .as_ref()
                    .map(|p| p.upgrade_marker_path())
            })
    }
}
