//! Transport contracts.
//!
//! The configuration tree and the client only talk to the service through
//! these traits. `HttpTransport` is the production implementation; tests
//! substitute in-memory recorders.

use crate::error::DocGenError;
use crate::hierarchy::HierarchyPath;
use crate::messages::{
    ConfigurationListItem, DocumentGenerationProgress, DocumentGenerationTemplate,
    DocumentGenerationUri,
};
use crate::storage::TemplateStorageType;
use crate::transport::wire::{
    ConfigurationRequest, ConfigurationSummary, EntryDetail, EntryRequest,
    GenerateDocumentConversionRequest, GenerateDocumentRequest,
};
use crate::types::{ConfigurationScope, EntryId, RequestId, SubscriptionId};
use async_trait::async_trait;
use std::fmt;

/// Addresses one entry either by hierarchy path or by server id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryLocator {
    Path(HierarchyPath),
    Id(EntryId),
}

impl fmt::Display for EntryLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryLocator::Path(path) => write!(f, "{}", path),
            EntryLocator::Id(id) => write!(f, "#{}", id),
        }
    }
}

/// Configuration and template storage entry operations.
#[async_trait]
pub trait ConfigurationTransport: Send + Sync {
    /// Configuration metadata with the recursive outline of its directories.
    async fn get_configuration_summary(
        &self,
        scope: ConfigurationScope,
    ) -> Result<ConfigurationSummary, DocGenError>;

    async fn update_configuration(
        &self,
        scope: ConfigurationScope,
        request: &ConfigurationRequest,
    ) -> Result<(), DocGenError>;

    async fn delete_configuration(&self, scope: ConfigurationScope) -> Result<(), DocGenError>;

    /// Full detail of one entry, read through the endpoint of its storage type.
    async fn get_entry_detail(
        &self,
        scope: ConfigurationScope,
        entry_id: EntryId,
        storage_type: TemplateStorageType,
    ) -> Result<EntryDetail, DocGenError>;

    /// Create an entry under `parent`.
    async fn create_entry(
        &self,
        scope: ConfigurationScope,
        parent: &EntryLocator,
        request: &EntryRequest,
    ) -> Result<EntryDetail, DocGenError>;

    async fn update_entry(
        &self,
        scope: ConfigurationScope,
        at: &EntryLocator,
        request: &EntryRequest,
    ) -> Result<EntryDetail, DocGenError>;

    /// Delete an entry and everything below it.
    async fn delete_entry(
        &self,
        scope: ConfigurationScope,
        at: &EntryLocator,
        storage_type: TemplateStorageType,
    ) -> Result<(), DocGenError>;

    async fn create_configuration(
        &self,
        subscription_id: SubscriptionId,
        request: &ConfigurationRequest,
    ) -> Result<ConfigurationSummary, DocGenError>;

    async fn list_configurations(
        &self,
        subscription_id: SubscriptionId,
    ) -> Result<Vec<ConfigurationListItem>, DocGenError>;
}

/// Generation, conversion, template and download operations.
#[async_trait]
pub trait GenerationTransport: Send + Sync {
    async fn request_document_generation(
        &self,
        subscription_id: SubscriptionId,
        request: &GenerateDocumentRequest,
    ) -> Result<DocumentGenerationProgress, DocGenError>;

    async fn request_document_conversion(
        &self,
        subscription_id: SubscriptionId,
        request: &GenerateDocumentConversionRequest,
    ) -> Result<DocumentGenerationProgress, DocGenError>;

    async fn get_document_generation_progress(
        &self,
        subscription_id: SubscriptionId,
        request_id: RequestId,
    ) -> Result<DocumentGenerationProgress, DocGenError>;

    /// Download link of a finished request; `None` while none is available.
    async fn get_document_generation_uri(
        &self,
        subscription_id: SubscriptionId,
        request_id: RequestId,
    ) -> Result<Option<DocumentGenerationUri>, DocGenError>;

    /// Templates visible from `path`, optionally filtered by subject.
    async fn get_templates(
        &self,
        scope: ConfigurationScope,
        path: &HierarchyPath,
        subject: Option<&str>,
    ) -> Result<Vec<DocumentGenerationTemplate>, DocGenError>;

    /// Raw metadata document of one template.
    async fn get_metadata(
        &self,
        scope: ConfigurationScope,
        path: &HierarchyPath,
        template_id: &str,
        language: &str,
    ) -> Result<Vec<u8>, DocGenError>;

    async fn download_document(&self, uri: &str) -> Result<Vec<u8>, DocGenError>;
}
