//! Global config file source: <platform config dir>/docgen/config.toml

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File};
use std::path::PathBuf;

pub fn path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "docgen", "docgen")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Add the global file to builder when it exists.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    match path() {
        Some(path) => Ok(builder.add_source(File::from(path).required(false))),
        None => Ok(builder),
    }
}
