//! Experiment configuration
//!
//! Settings can come from JSON text or from `EXLAB_*` environment variables
//! layered over the defaults:
//!
//! | Variable             | Field          | Default        |
//! |----------------------|----------------|----------------|
//! | `EXLAB_ID`           | `id`           | `"Experiment"` |
//! | `EXLAB_EPOCHS`       | `epochs`       | `100`          |
//! | `EXLAB_PRINT_REPORT` | `print_report` | `true`         |
//! | `EXLAB_SNAPSHOT`     | `snapshot`     | `true`         |
//! | `EXLAB_LOG`          | `log_level`    | `"info"`       |
//!
//! Malformed values fail fast with `Error::Config`; they never fall back
//! to the default silently.

use std::env;

use serde::{Deserialize, Serialize};

use crate::experiment::{DEFAULT_EPOCHS, DEFAULT_ID};
use crate::{Error, Result};

/// Environment variable for [`ExperimentConfig::id`].
pub const ENV_ID: &str = "EXLAB_ID";
/// Environment variable for [`ExperimentConfig::epochs`].
pub const ENV_EPOCHS: &str = "EXLAB_EPOCHS";
/// Environment variable for [`ExperimentConfig::print_report`].
pub const ENV_PRINT_REPORT: &str = "EXLAB_PRINT_REPORT";
/// Environment variable for [`ExperimentConfig::snapshot`].
pub const ENV_SNAPSHOT: &str = "EXLAB_SNAPSHOT";
/// Environment variable for [`ExperimentConfig::log_level`].
pub const ENV_LOG: &str = "EXLAB_LOG";

/// Run settings for an experiment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Experiment identifier (save-folder prefix)
    #[serde(default = "default_id")]
    pub id: String,

    /// Number of epochs per run
    #[serde(default = "default_epochs")]
    pub epochs: u64,

    /// Emit per-epoch reports
    #[serde(default = "default_true")]
    pub print_report: bool,

    /// Write the whole-experiment snapshot at the end of a run
    #[serde(default = "default_true")]
    pub snapshot: bool,

    /// Default log filter (overridden by `RUST_LOG`)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_id() -> String {
    DEFAULT_ID.to_string()
}

const fn default_epochs() -> u64 {
    DEFAULT_EPOCHS
}

const fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            id: default_id(),
            epochs: default_epochs(),
            print_report: default_true(),
            snapshot: default_true(),
            log_level: default_log_level(),
        }
    }
}

impl ExperimentConfig {
    /// Parse a configuration from JSON; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if `json` is not a valid configuration
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(format!("invalid config JSON: {e}")))
    }

    /// Load the configuration from `EXLAB_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if a variable holds a malformed value
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load the configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if a variable holds a malformed value
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(id) = lookup(ENV_ID) {
            if id.is_empty() {
                return Err(Error::Config(format!("{ENV_ID} must not be empty")));
            }
            config.id = id;
        }
        if let Some(epochs) = lookup(ENV_EPOCHS) {
            config.epochs = epochs.trim().parse().map_err(|_| {
                Error::Config(format!("{ENV_EPOCHS} must be a non-negative integer, got {epochs:?}"))
            })?;
        }
        if let Some(flag) = lookup(ENV_PRINT_REPORT) {
            config.print_report = parse_flag(ENV_PRINT_REPORT, &flag)?;
        }
        if let Some(flag) = lookup(ENV_SNAPSHOT) {
            config.snapshot = parse_flag(ENV_SNAPSHOT, &flag)?;
        }
        if let Some(level) = lookup(ENV_LOG) {
            config.log_level = level;
        }

        Ok(config)
    }
}

fn parse_flag(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::Config(format!("{name} must be a boolean, got {raw:?}"))),
    }
}
