use std::path::Path;

use serde::{Deserialize, Serialize};

use super::dns::DnsConfig;
use super::errors::ConfigError;
use super::logging::LoggingConfig;

/// Top-level configuration, loaded from a TOML file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub dns: DnsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        toml::from_str(&raw).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}
