//! Settings stored in `config.yaml`
//!
//! ```yaml
//! output_path: /data/experiments
//! log_level: debug
//! sobol:
//!   num_resamples: 200
//!   conf_level: 0.9
//!   seed: 7
//! ```
//!
//! Every field is optional. Command-line flags win over the file.

use std::fs;
use std::path::{Path, PathBuf};

use color_eyre::eyre::{WrapErr, eyre};
use serde::{Deserialize, Serialize};
use simdata_core::SobolOptions;

pub const CONFIG_FILE: &str = "config.yaml";

/// Where experiments live when neither the flag nor the config names a path
pub const DEFAULT_OUTPUT_PATH: &str = "ap_output";

pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Directory holding `{name}_{id}` experiment folders
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Bootstrap settings for `sobol`
    pub sobol: SobolOptions,
}

impl Config {
    /// Load the config file.
    ///
    /// An explicit path must exist. Without one, `{data_dir}/config.yaml` is
    /// read if present and defaults are used otherwise.
    pub fn resolve(explicit: Option<&Path>, data_dir: &Path) -> color_eyre::Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let path = data_dir.join(CONFIG_FILE);
                if path.exists() {
                    Self::load(&path)
                } else {
                    tracing::debug!(path = %path.display(), "No config file, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn load(path: &Path) -> color_eyre::Result<Self> {
        let content = fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read config {}", path.display()))?;
        let config: Config = serde_saphyr::from_str(&content)
            .map_err(|e| eyre!("failed to parse config {}: {e}", path.display()))?;
        config.sobol.validate()?;
        tracing::debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_PATH))
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }
}
