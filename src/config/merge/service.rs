//! MergeService: orchestrates sources and deserializes to DocGenConfig.

use crate::config::sources::{environment, global_file};
use crate::config::DocGenConfig;
use crate::transport::http::DEFAULT_SERVICE_URI;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File};
use std::path::Path;

/// Merge service for config composition.
pub struct MergeService;

fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("service.service_uri", DEFAULT_SERVICE_URI)?
        .set_default("service.timeout_secs", 100)
}

impl MergeService {
    /// Load config from standard sources.
    /// Precedence: defaults (lowest) -> global file -> environment (highest).
    pub fn load() -> Result<DocGenConfig, ConfigError> {
        let builder = builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = environment::add_to_builder(builder)?;
        builder.build()?.try_deserialize()
    }

    /// Load config with `path` layered between the global file and the
    /// environment. The file must exist.
    pub fn load_from_file(path: &Path) -> Result<DocGenConfig, ConfigError> {
        let builder = builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = builder.add_source(File::from(path).required(true));
        let builder = environment::add_to_builder(builder)?;
        builder.build()?.try_deserialize()
    }

    /// Load a single file over the defaults, ignoring other sources.
    pub fn load_isolated(path: &Path) -> Result<DocGenConfig, ConfigError> {
        builder_with_defaults()?
            .add_source(File::from(path).required(true))
            .build()?
            .try_deserialize()
    }
}
