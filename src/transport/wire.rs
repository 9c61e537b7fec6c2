//! JSON wire models of the document generation service and their translation
//! to client types.

use crate::error::DocGenError;
use crate::hierarchy::HierarchyPath;
use crate::messages::{
    ConfigurationListItem, DocumentConversionRequestDetails, DocumentFormat,
    DocumentGenerationProgress, DocumentGenerationRequestDetails, DocumentGenerationState,
    DocumentGenerationTemplate, DocumentGenerationUri, PdfFormat,
};
use crate::storage::{
    AzureBlobTemplateStorage, SharePointOnlineTemplateStorage, TemplateStorage,
    TemplateStorageType,
};
use crate::types::{ConfigurationId, EntryId, RequestId, SubscriptionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Configuration metadata plus the whole directory tree outline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationSummary {
    pub id: Option<ConfigurationId>,
    pub subscription_id: Option<SubscriptionId>,
    pub name: Option<String>,
    pub level_names: Option<Vec<String>>,
    pub has_license: Option<bool>,
    pub metadata_filename_extension: Option<String>,
    pub template_storage_directory: Option<EntrySummary>,
}

/// Outline of one directory: identity and storage type, no storage details.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntrySummary {
    pub id: Option<EntryId>,
    pub key: Option<String>,
    pub name: Option<String>,
    pub template_storage_type: Option<String>,
    pub children: Option<Vec<EntrySummary>>,
}

/// Body of configuration create and update calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationRequest {
    pub name: String,
    pub has_license: bool,
    pub level_names: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_filename_extension: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureBlobTemplateModel {
    pub secret_key_or_storage_connection_string: String,
    pub container_name: String,
    pub blob_prefix: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharePointOnlineTemplateModel {
    pub client_id: String,
    pub tenant_id: String,
    pub secret_key_or_client_secret: String,
    pub group_name: String,
}

/// Storage details sent on create and update; only persistable variants exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoragePayload {
    AzureBlob(AzureBlobTemplateModel),
    SharePointOnline(SharePointOnlineTemplateModel),
}

impl StoragePayload {
    /// Translate a storage variant; `Deprecated` is rejected for `path`.
    pub fn from_storage(
        storage: &TemplateStorage,
        path: &HierarchyPath,
    ) -> Result<Self, DocGenError> {
        match storage {
            TemplateStorage::AzureBlob(blob) => Ok(StoragePayload::AzureBlob(AzureBlobTemplateModel {
                secret_key_or_storage_connection_string: blob.connection_string_or_key.clone(),
                container_name: blob.container_name.clone(),
                blob_prefix: blob.blob_prefix.clone(),
            })),
            TemplateStorage::SharePointOnline(spo) => {
                Ok(StoragePayload::SharePointOnline(SharePointOnlineTemplateModel {
                    client_id: spo.client_id.clone(),
                    tenant_id: spo.tenant_id.clone(),
                    secret_key_or_client_secret: spo.client_secret_or_key.clone(),
                    group_name: spo.group_name.clone(),
                }))
            }
            TemplateStorage::Deprecated => Err(DocGenError::UnsupportedStorageType {
                storage_type: TemplateStorageType::Deprecated.to_string(),
                path: path.to_string(),
            }),
        }
    }

    pub fn storage_type(&self) -> TemplateStorageType {
        match self {
            StoragePayload::AzureBlob(_) => TemplateStorageType::AzureBlobStorage,
            StoragePayload::SharePointOnline(_) => TemplateStorageType::SharePointOnline,
        }
    }
}

/// Body of entry create and update calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryRequest {
    pub key: String,
    pub name: String,
    pub template_storage_configuration: StoragePayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureBlobStorageConfiguration {
    pub secret_key_for_storage_connection_string: Option<String>,
    pub container_name: Option<String>,
    pub blob_prefix: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharePointOnlineStorageConfiguration {
    pub client_id: Option<String>,
    pub tenant_id: Option<String>,
    pub secret_key_for_client_secret: Option<String>,
    pub group_name: Option<String>,
}

/// Entry detail response, generic over the storage-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryDetailResponse<T> {
    pub id: Option<EntryId>,
    pub key: Option<String>,
    pub name: Option<String>,
    pub template_storage_configuration: Option<T>,
}

/// Full detail of one directory as stored on the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDetail {
    pub id: EntryId,
    pub key: String,
    pub name: String,
    pub storage: TemplateStorage,
}

impl From<AzureBlobStorageConfiguration> for TemplateStorage {
    fn from(c: AzureBlobStorageConfiguration) -> Self {
        TemplateStorage::AzureBlob(AzureBlobTemplateStorage {
            connection_string_or_key: c.secret_key_for_storage_connection_string.unwrap_or_default(),
            container_name: c.container_name.unwrap_or_default(),
            blob_prefix: c.blob_prefix.unwrap_or_default(),
        })
    }
}

impl From<SharePointOnlineStorageConfiguration> for TemplateStorage {
    fn from(c: SharePointOnlineStorageConfiguration) -> Self {
        TemplateStorage::SharePointOnline(SharePointOnlineTemplateStorage {
            client_id: c.client_id.unwrap_or_default(),
            tenant_id: c.tenant_id.unwrap_or_default(),
            client_secret_or_key: c.secret_key_for_client_secret.unwrap_or_default(),
            group_name: c.group_name.unwrap_or_default(),
        })
    }
}

impl<T: Into<TemplateStorage>> EntryDetailResponse<T> {
    pub fn into_entry_detail(self) -> Result<EntryDetail, DocGenError> {
        let id = self
            .id
            .ok_or_else(|| DocGenError::InvalidResponse("Found null entry Id in response".to_string()))?;
        let storage = self.template_storage_configuration.ok_or_else(|| {
            DocGenError::InvalidResponse(format!(
                "Entry {} has no template storage configuration",
                id
            ))
        })?;
        Ok(EntryDetail {
            id,
            key: self.key.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            storage: storage.into(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationListResponse {
    pub id: Option<ConfigurationId>,
    pub name: Option<String>,
}

impl ConfigurationListResponse {
    pub fn into_list_item(self) -> Result<ConfigurationListItem, DocGenError> {
        Ok(ConfigurationListItem {
            configuration_id: self.id.ok_or_else(|| {
                DocGenError::InvalidResponse("ConfigurationId cannot be null".to_string())
            })?,
            name: self.name.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateDocumentRequest {
    pub configuration_id: ConfigurationId,
    pub hierarchy_path: String,
    pub template_id: String,
    pub language: String,
    pub document_format: DocumentFormat,
    pub merge_data: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
    pub debug: bool,
}

impl GenerateDocumentRequest {
    pub fn new(configuration_id: ConfigurationId, details: &DocumentGenerationRequestDetails) -> Self {
        Self {
            configuration_id,
            hierarchy_path: details.hierarchy_path.to_string(),
            template_id: details.template_id.clone(),
            language: details.language.clone(),
            document_format: details.document_format,
            merge_data: details.merge_data.clone(),
            callback_url: details.callback_url.clone(),
            debug: details.debug,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateDocumentConversionRequest {
    pub configuration_id: ConfigurationId,
    pub source_document_url: String,
    pub source_document_format: DocumentFormat,
    pub converted_document_format: DocumentFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub converted_document_pdf_format: Option<PdfFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
    pub debug: bool,
}

impl GenerateDocumentConversionRequest {
    pub fn new(configuration_id: ConfigurationId, details: &DocumentConversionRequestDetails) -> Self {
        Self {
            configuration_id,
            source_document_url: details.source_document_url.clone(),
            source_document_format: details.source_document_format,
            converted_document_format: details.converted_document_format,
            converted_document_pdf_format: details.converted_document_pdf_format,
            callback_url: details.callback_url.clone(),
            debug: details.debug,
        }
    }
}

/// Generation request as reported by the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentGenerationRequest {
    pub id: Option<RequestId>,
    pub subscription_id: Option<SubscriptionId>,
    pub configuration_id: Option<ConfigurationId>,
    pub template_id: Option<String>,
    pub language: Option<String>,
    pub document_format: Option<String>,
    pub hierarchy_path: Option<String>,
    pub state: Option<String>,
    pub callback_url: Option<String>,
    pub debug: Option<bool>,
    pub fail_reason: Option<String>,
}

impl DocumentGenerationRequest {
    pub fn into_progress(self) -> Result<DocumentGenerationProgress, DocGenError> {
        let id = self
            .id
            .ok_or_else(|| DocGenError::InvalidResponse("Request id cannot be null".to_string()))?;
        let subscription_id = self.subscription_id.ok_or_else(|| {
            DocGenError::InvalidResponse("SubscriptionId cannot be null".to_string())
        })?;
        let state = self
            .state
            .as_deref()
            .ok_or_else(|| DocGenError::InvalidResponse(format!("Request {} has no state", id)))?
            .parse::<DocumentGenerationState>()
            .map_err(DocGenError::InvalidResponse)?;
        let document_format = self
            .document_format
            .as_deref()
            .map(str::parse::<DocumentFormat>)
            .transpose()
            .map_err(DocGenError::InvalidResponse)?;
        let hierarchy_path = HierarchyPath::parse(self.hierarchy_path.as_deref().unwrap_or_default())?;

        Ok(DocumentGenerationProgress {
            id,
            subscription_id,
            configuration_id: self.configuration_id,
            template_id: self.template_id,
            language: self.language,
            document_format,
            hierarchy_path,
            state,
            callback_url: self.callback_url,
            debug: self.debug,
            fail_reason: self.fail_reason,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentUri {
    pub uri: Option<String>,
    pub uri_expiry_time: Option<DateTime<Utc>>,
}

impl DocumentUri {
    /// `None` when the service has no link yet.
    pub fn into_generation_uri(self) -> Option<DocumentGenerationUri> {
        let uri = self.uri.filter(|u| !u.is_empty())?;
        Some(DocumentGenerationUri {
            uri,
            uri_expiry_time: self.uri_expiry_time.unwrap_or_else(Utc::now),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub template_id: Option<String>,
    pub languages: Option<Vec<String>>,
}

impl From<Template> for DocumentGenerationTemplate {
    fn from(t: Template) -> Self {
        DocumentGenerationTemplate {
            template_id: t.template_id.unwrap_or_default(),
            languages: t.languages.unwrap_or_default(),
        }
    }
}
