//! Client configuration
//!
//! Layered with the `config` crate: built-in defaults, the global config
//! file, an optional explicit file, then `DOCGEN__*` environment variables.

pub mod facade;
pub mod merge;
pub mod sources;

pub use facade::ConfigLoader;

use crate::error::DocGenError;
use crate::logging::LoggingConfig;
use crate::transport::http::DEFAULT_SERVICE_URI;
use crate::types::SubscriptionId;
use serde::{Deserialize, Serialize};

/// Top-level configuration file contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocGenConfig {
    #[serde(default)]
    pub service: DocumentGenerationOptions,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where and as whom to call the document generation service.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentGenerationOptions {
    #[serde(default = "default_service_uri")]
    pub service_uri: String,

    /// Used whenever a call does not name a subscription
    #[serde(default)]
    pub subscription_id: Option<SubscriptionId>,

    /// Bearer token sent with every request
    #[serde(default)]
    pub access_token: Option<String>,

    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_service_uri() -> String {
    DEFAULT_SERVICE_URI.to_string()
}

fn default_timeout_secs() -> u64 {
    100
}

impl Default for DocumentGenerationOptions {
    fn default() -> Self {
        Self {
            service_uri: default_service_uri(),
            subscription_id: None,
            access_token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for DocumentGenerationOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentGenerationOptions")
            .field("service_uri", &self.service_uri)
            .field("subscription_id", &self.subscription_id)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl DocumentGenerationOptions {
    pub fn validate(&self) -> Result<(), DocGenError> {
        let uri = reqwest::Url::parse(&self.service_uri).map_err(|e| {
            DocGenError::ConfigError(format!("Invalid service_uri '{}': {}", self.service_uri, e))
        })?;
        if uri.scheme() != "http" && uri.scheme() != "https" {
            return Err(DocGenError::ConfigError(format!(
                "service_uri must use http or https, got '{}'",
                uri.scheme()
            )));
        }
        if self.timeout_secs == 0 {
            return Err(DocGenError::ConfigError(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        if matches!(&self.access_token, Some(token) if token.trim().is_empty()) {
            return Err(DocGenError::ConfigError(
                "access_token is set but empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl DocGenConfig {
    pub fn validate(&self) -> Result<(), DocGenError> {
        self.service.validate()
    }
}
