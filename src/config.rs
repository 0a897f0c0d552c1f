//! Overlay configuration, read from a TOML file. Every field has a default so
//! an empty (or missing) file is a valid configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{QuestError, QuestResult};
use crate::kinds::scythe::ScytheConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayConfig {
    /// Namespace for persisted quest slots ("{prefix}.{quest kind}")
    #[serde(default = "default_state_key_prefix")]
    pub state_key_prefix: String,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Tuning for the scythe attachment quest
    #[serde(default)]
    pub scythe: ScytheConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default `tracing` directive, used alongside `RUST_LOG`
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_state_key_prefix() -> String {
    "QuestOverlay".to_string()
}

fn default_log_filter() -> String {
    "quest_overlay=info".to_string()
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            state_key_prefix: default_state_key_prefix(),
            logging: LoggingConfig::default(),
            scythe: ScytheConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl OverlayConfig {
    pub fn from_toml_str(text: &str) -> QuestResult<Self> {
        toml::from_str(text).map_err(|source| QuestError::Parse {
            what: "overlay config".to_string(),
            source,
        })
    }

    pub fn load(path: &Path) -> QuestResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| QuestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        info!("Loaded overlay config from {:?}", path);
        Ok(config)
    }
}
