//! ConfigLoader facade delegating to merge service.

use super::merge::service::MergeService;
use super::DocGenConfig;
use crate::error::DocGenError;
use std::path::{Path, PathBuf};

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Path of the global config file (e.g. ~/.config/docgen/config.toml)
    pub fn global_config_path() -> Option<PathBuf> {
        super::sources::global_file::path()
    }

    /// Load and validate configuration from standard sources, with `explicit`
    /// layered above the global file when given.
    pub fn load(explicit: Option<&Path>) -> Result<DocGenConfig, DocGenError> {
        let config = match explicit {
            Some(path) => MergeService::load_from_file(path)?,
            None => MergeService::load()?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Create default configuration.
    pub fn default() -> DocGenConfig {
        DocGenConfig::default()
    }
}
