//! Template storage configurations
//!
//! Where a directory's templates physically live. Closed set of variants; the
//! `Deprecated` variant marks server entries of a retired storage type and is
//! never sent back to the service.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Storage type tag as reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemplateStorageType {
    /// Retired storage type; cannot be used for new storage areas
    Deprecated,
    SharePointOnline,
    AzureBlobStorage,
}

impl TemplateStorageType {
    /// Parse the service's tag. Unknown tags are treated as deprecated.
    pub fn parse(tag: &str) -> Self {
        match tag {
            "SharePointOnline" => TemplateStorageType::SharePointOnline,
            "AzureBlobStorage" => TemplateStorageType::AzureBlobStorage,
            _ => TemplateStorageType::Deprecated,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateStorageType::Deprecated => "Deprecated",
            TemplateStorageType::SharePointOnline => "SharePointOnline",
            TemplateStorageType::AzureBlobStorage => "AzureBlobStorage",
        }
    }

    pub fn is_deprecated(&self) -> bool {
        *self == TemplateStorageType::Deprecated
    }
}

impl fmt::Display for TemplateStorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AzureBlobTemplateStorage {
    pub connection_string_or_key: String,
    pub container_name: String,
    #[serde(default)]
    pub blob_prefix: String,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharePointOnlineTemplateStorage {
    pub client_id: String,
    pub tenant_id: String,
    pub client_secret_or_key: String,
    pub group_name: String,
}

// Secrets stay out of logs and panics.
impl fmt::Debug for AzureBlobTemplateStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureBlobTemplateStorage")
            .field("connection_string_or_key", &"<redacted>")
            .field("container_name", &self.container_name)
            .field("blob_prefix", &self.blob_prefix)
            .finish()
    }
}

impl fmt::Debug for SharePointOnlineTemplateStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharePointOnlineTemplateStorage")
            .field("client_id", &self.client_id)
            .field("tenant_id", &self.tenant_id)
            .field("client_secret_or_key", &"<redacted>")
            .field("group_name", &self.group_name)
            .finish()
    }
}

/// Storage configuration of one template storage directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TemplateStorage {
    AzureBlob(AzureBlobTemplateStorage),
    #[serde(rename = "sharepoint_online")]
    SharePointOnline(SharePointOnlineTemplateStorage),
    Deprecated,
}

impl TemplateStorage {
    pub fn azure_blob(
        connection_string_or_key: impl Into<String>,
        container_name: impl Into<String>,
        blob_prefix: impl Into<String>,
    ) -> Self {
        TemplateStorage::AzureBlob(AzureBlobTemplateStorage {
            connection_string_or_key: connection_string_or_key.into(),
            container_name: container_name.into(),
            blob_prefix: blob_prefix.into(),
        })
    }

    pub fn sharepoint_online(
        client_id: impl Into<String>,
        tenant_id: impl Into<String>,
        client_secret_or_key: impl Into<String>,
        group_name: impl Into<String>,
    ) -> Self {
        TemplateStorage::SharePointOnline(SharePointOnlineTemplateStorage {
            client_id: client_id.into(),
            tenant_id: tenant_id.into(),
            client_secret_or_key: client_secret_or_key.into(),
            group_name: group_name.into(),
        })
    }

    pub fn storage_type(&self) -> TemplateStorageType {
        match self {
            TemplateStorage::AzureBlob(_) => TemplateStorageType::AzureBlobStorage,
            TemplateStorage::SharePointOnline(_) => TemplateStorageType::SharePointOnline,
            TemplateStorage::Deprecated => TemplateStorageType::Deprecated,
        }
    }

    pub fn is_deprecated(&self) -> bool {
        matches!(self, TemplateStorage::Deprecated)
    }
}
