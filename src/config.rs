//! Tool configuration, read from a JSON file. Every field has a default.
use std::path::Path;

use anyhow::{Context as _, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::protocol::Session;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// connections opened for the analysis client
    pub pool_size: usize,
    /// module generated TypeScript imports external types from
    pub import_source: String,
    pub session: Session,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pool_size: 1,
            import_source: "edgedb".to_string(),
            session: Session::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_json(&source).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_json(source: &str) -> Result<Self> {
        let config = crate::path_de::from_str_with_path::<Config>(source).map_err(|e| anyhow!(e))?;
        if config.pool_size == 0 {
            return Err(anyhow!("pool_size must be at least 1"));
        }
        Ok(config)
    }
}
