//! Error types for the document generation client.

use crate::types::RequestId;
use thiserror::Error;

/// Errors surfaced by the client, the directory tree and the transport.
#[derive(Debug, Error)]
pub enum DocGenError {
    /// Malformed path, or an empty path where a non-empty one is required
    #[error("Invalid hierarchy path: {0}")]
    InvalidPath(String),

    /// A sibling with the same key already exists
    #[error("A child entry with key '{key}' already exists under '{parent}'")]
    DuplicateKey { key: String, parent: String },

    #[error("Cannot save a configuration without a root template storage directory")]
    MissingRootDirectory,

    #[error("Cannot save a configuration unless it has already been created on the server")]
    NotYetCreated,

    /// Deprecated or unrecognized storage variants cannot be persisted
    #[error("Unsupported template storage type {storage_type} at '{path}'")]
    UnsupportedStorageType { storage_type: String, path: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Handle does not refer to a live directory node
    #[error("Unknown template storage directory handle: {0}")]
    UnknownDirectory(String),

    /// Transport failure while reconciling the directory tree
    #[error("Configuration sync failed during {operation} at '{path}': {source}")]
    ConfigurationSync {
        operation: &'static str,
        path: String,
        #[source]
        source: Box<DocGenError>,
    },

    /// Non-success response from the service
    #[error("{}", request_failed_message(operation, reason, content.as_deref()))]
    RequestFailed {
        operation: String,
        reason: String,
        content: Option<String>,
    },

    #[error("No subscription id provided")]
    NoSubscriptionId,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Document generation {request_id} failed: {reason}")]
    GenerationFailed { request_id: RequestId, reason: String },

    #[error("Document generation {request_id} did not complete within {waited_secs}s")]
    GenerationTimedOut { request_id: RequestId, waited_secs: u64 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

fn request_failed_message(operation: &str, reason: &str, content: Option<&str>) -> String {
    match content {
        Some(content) if !content.trim().is_empty() => {
            format!("{}: {}: {}", operation, reason, content)
        }
        _ => format!("{}: {}", operation, reason),
    }
}

impl DocGenError {
    /// Wrap a failure raised while reconciling the node at `path`.
    pub(crate) fn sync(operation: &'static str, path: impl Into<String>, source: DocGenError) -> Self {
        DocGenError::ConfigurationSync {
            operation,
            path: path.into(),
            source: Box::new(source),
        }
    }
}

impl From<config::ConfigError> for DocGenError {
    fn from(e: config::ConfigError) -> Self {
        DocGenError::ConfigError(e.to_string())
    }
}
