//! HTTP transport for the document generation service.

use crate::error::DocGenError;
use crate::hierarchy::HierarchyPath;
use crate::messages::{
    ConfigurationListItem, DocumentGenerationProgress, DocumentGenerationTemplate,
    DocumentGenerationUri,
};
use crate::storage::TemplateStorageType;
use crate::transport::contract::{ConfigurationTransport, EntryLocator, GenerationTransport};
use crate::transport::token::TokenProvider;
use crate::transport::wire::{
    AzureBlobStorageConfiguration, ConfigurationListResponse, ConfigurationRequest,
    ConfigurationSummary, DocumentGenerationRequest, DocumentUri, EntryDetail,
    EntryDetailResponse, EntryRequest, GenerateDocumentConversionRequest,
    GenerateDocumentRequest, SharePointOnlineStorageConfiguration, Template,
};
use crate::types::{ConfigurationScope, EntryId, RequestId, SubscriptionId};
use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_SERVICE_URI: &str = "https://gateway.kmdlogic.io/document-generation/v2";

/// reqwest-backed implementation of both transport traits.
///
/// The underlying client is built once and is cheap to clone.
#[derive(Clone)]
pub struct HttpTransport {
    base_uri: String,
    client: Client,
    tokens: Arc<dyn TokenProvider>,
}

impl HttpTransport {
    pub fn new(
        base_uri: impl Into<String>,
        timeout: Duration,
        tokens: Arc<dyn TokenProvider>,
    ) -> Result<Self, DocGenError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_uri: base_uri.into().trim_end_matches('/').to_string(),
            client,
            tokens,
        })
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    fn subscription_url(&self, subscription_id: SubscriptionId) -> String {
        format!("{}/subscriptions/{}", self.base_uri, subscription_id)
    }

    fn configuration_url(&self, scope: ConfigurationScope) -> String {
        format!(
            "{}/configurations/{}",
            self.subscription_url(scope.subscription_id),
            scope.configuration_id
        )
    }

    fn entries_url(&self, scope: ConfigurationScope, segment: &str) -> String {
        format!("{}/{}/entries", self.configuration_url(scope), segment)
    }

    fn entry_url(&self, scope: ConfigurationScope, segment: &str, at: &EntryLocator) -> String {
        match at {
            EntryLocator::Id(id) => format!("{}/{}", self.entries_url(scope, segment), id),
            EntryLocator::Path(path) => format!(
                "{}?hierarchyPath={}",
                self.entries_url(scope, segment),
                urlencoding::encode(&path.to_string())
            ),
        }
    }

    fn children_url(&self, scope: ConfigurationScope, segment: &str, parent: &EntryLocator) -> String {
        match parent {
            EntryLocator::Id(id) => format!("{}/{}/children", self.entries_url(scope, segment), id),
            EntryLocator::Path(path) => format!(
                "{}?parentHierarchyPath={}",
                self.entries_url(scope, segment),
                urlencoding::encode(&path.to_string())
            ),
        }
    }

    async fn authorized(&self, builder: RequestBuilder) -> Result<RequestBuilder, DocGenError> {
        let token = self.tokens.access_token().await?;
        Ok(builder.bearer_auth(token))
    }

    /// Send an authorized request and fail on any non-success status.
    async fn send(&self, operation: &str, builder: RequestBuilder) -> Result<Response, DocGenError> {
        let response = self.authorized(builder).await?.send().await?;
        check_status(operation, response).await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        builder: RequestBuilder,
    ) -> Result<T, DocGenError> {
        let response = self.send(operation, builder).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn send_entry(
        &self,
        operation: &str,
        builder: RequestBuilder,
        storage_type: TemplateStorageType,
        at: &EntryLocator,
    ) -> Result<EntryDetail, DocGenError> {
        match storage_type {
            TemplateStorageType::AzureBlobStorage => self
                .send_json::<EntryDetailResponse<AzureBlobStorageConfiguration>>(operation, builder)
                .await?
                .into_entry_detail(),
            TemplateStorageType::SharePointOnline => self
                .send_json::<EntryDetailResponse<SharePointOnlineStorageConfiguration>>(
                    operation, builder,
                )
                .await?
                .into_entry_detail(),
            TemplateStorageType::Deprecated => Err(unsupported(at)),
        }
    }
}

async fn check_status(operation: &str, response: Response) -> Result<Response, DocGenError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let reason = status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.as_u16().to_string());
    let body = response.text().await.unwrap_or_default();
    Err(DocGenError::RequestFailed {
        operation: operation.to_string(),
        reason,
        content: if body.is_empty() { None } else { Some(body) },
    })
}

fn unsupported(at: &EntryLocator) -> DocGenError {
    DocGenError::UnsupportedStorageType {
        storage_type: TemplateStorageType::Deprecated.to_string(),
        path: at.to_string(),
    }
}

/// Route segment for entry endpoints of a storage type.
fn storage_segment(storage_type: TemplateStorageType) -> Option<&'static str> {
    match storage_type {
        TemplateStorageType::AzureBlobStorage => Some("azure-blob"),
        TemplateStorageType::SharePointOnline => Some("sharepoint-online"),
        TemplateStorageType::Deprecated => None,
    }
}

#[async_trait]
impl ConfigurationTransport for HttpTransport {
    async fn get_configuration_summary(
        &self,
        scope: ConfigurationScope,
    ) -> Result<ConfigurationSummary, DocGenError> {
        let url = self.configuration_url(scope);
        debug!(url = %url, "GetConfigurationSummary");
        self.send_json("GetConfigurationSummary", self.client.get(&url))
            .await
    }

    async fn update_configuration(
        &self,
        scope: ConfigurationScope,
        request: &ConfigurationRequest,
    ) -> Result<(), DocGenError> {
        let url = self.configuration_url(scope);
        debug!(url = %url, name = %request.name, "UpdateConfiguration");
        self.send("UpdateConfiguration", self.client.put(&url).json(request))
            .await?;
        Ok(())
    }

    async fn delete_configuration(&self, scope: ConfigurationScope) -> Result<(), DocGenError> {
        let url = self.configuration_url(scope);
        debug!(url = %url, "DeleteConfiguration");
        self.send("DeleteConfiguration", self.client.delete(&url))
            .await?;
        Ok(())
    }

    async fn get_entry_detail(
        &self,
        scope: ConfigurationScope,
        entry_id: EntryId,
        storage_type: TemplateStorageType,
    ) -> Result<EntryDetail, DocGenError> {
        let at = EntryLocator::Id(entry_id);
        let segment = storage_segment(storage_type).ok_or_else(|| unsupported(&at))?;
        let url = self.entry_url(scope, segment, &at);
        debug!(url = %url, "GetEntry");
        self.send_entry("GetEntry", self.client.get(&url), storage_type, &at)
            .await
    }

    async fn create_entry(
        &self,
        scope: ConfigurationScope,
        parent: &EntryLocator,
        request: &EntryRequest,
    ) -> Result<EntryDetail, DocGenError> {
        let storage_type = request.template_storage_configuration.storage_type();
        let segment = storage_segment(storage_type).ok_or_else(|| unsupported(parent))?;
        let url = self.children_url(scope, segment, parent);
        debug!(url = %url, key = %request.key, "CreateEntry");
        self.send_entry(
            "CreateEntry",
            self.client.post(&url).json(request),
            storage_type,
            parent,
        )
        .await
    }

    async fn update_entry(
        &self,
        scope: ConfigurationScope,
        at: &EntryLocator,
        request: &EntryRequest,
    ) -> Result<EntryDetail, DocGenError> {
        let storage_type = request.template_storage_configuration.storage_type();
        let segment = storage_segment(storage_type).ok_or_else(|| unsupported(at))?;
        let url = self.entry_url(scope, segment, at);
        debug!(url = %url, key = %request.key, "UpdateEntry");
        self.send_entry(
            "UpdateEntry",
            self.client.put(&url).json(request),
            storage_type,
            at,
        )
        .await
    }

    async fn delete_entry(
        &self,
        scope: ConfigurationScope,
        at: &EntryLocator,
        storage_type: TemplateStorageType,
    ) -> Result<(), DocGenError> {
        // Deprecated entries are removed through the blob endpoint.
        let segment = storage_segment(storage_type).unwrap_or("azure-blob");
        let url = self.entry_url(scope, segment, at);
        debug!(url = %url, "DeleteEntry");
        self.send("DeleteEntry", self.client.delete(&url)).await?;
        Ok(())
    }

    async fn create_configuration(
        &self,
        subscription_id: SubscriptionId,
        request: &ConfigurationRequest,
    ) -> Result<ConfigurationSummary, DocGenError> {
        let url = format!("{}/configurations", self.subscription_url(subscription_id));
        debug!(url = %url, name = %request.name, "CreateConfiguration");
        self.send_json("CreateConfiguration", self.client.post(&url).json(request))
            .await
    }

    async fn list_configurations(
        &self,
        subscription_id: SubscriptionId,
    ) -> Result<Vec<ConfigurationListItem>, DocGenError> {
        let url = format!("{}/configurations", self.subscription_url(subscription_id));
        debug!(url = %url, "GetAllConfigurations");
        let items: Vec<ConfigurationListResponse> = self
            .send_json("GetAllConfigurations", self.client.get(&url))
            .await?;
        items
            .into_iter()
            .map(ConfigurationListResponse::into_list_item)
            .collect()
    }
}

#[async_trait]
impl GenerationTransport for HttpTransport {
    async fn request_document_generation(
        &self,
        subscription_id: SubscriptionId,
        request: &GenerateDocumentRequest,
    ) -> Result<DocumentGenerationProgress, DocGenError> {
        let url = format!("{}/generation", self.subscription_url(subscription_id));
        debug!(url = %url, template_id = %request.template_id, "RequestDocumentGeneration");
        let response: DocumentGenerationRequest = self
            .send_json("RequestDocumentGeneration", self.client.post(&url).json(request))
            .await?;
        response.into_progress()
    }

    async fn request_document_conversion(
        &self,
        subscription_id: SubscriptionId,
        request: &GenerateDocumentConversionRequest,
    ) -> Result<DocumentGenerationProgress, DocGenError> {
        let url = format!("{}/conversion", self.subscription_url(subscription_id));
        debug!(url = %url, "RequestDocumentConversion");
        let response: DocumentGenerationRequest = self
            .send_json("RequestDocumentConversion", self.client.post(&url).json(request))
            .await?;
        response.into_progress()
    }

    async fn get_document_generation_progress(
        &self,
        subscription_id: SubscriptionId,
        request_id: RequestId,
    ) -> Result<DocumentGenerationProgress, DocGenError> {
        let url = format!(
            "{}/generation/{}",
            self.subscription_url(subscription_id),
            request_id
        );
        let response: DocumentGenerationRequest = self
            .send_json("GetDocumentGeneration", self.client.get(&url))
            .await?;
        response.into_progress()
    }

    async fn get_document_generation_uri(
        &self,
        subscription_id: SubscriptionId,
        request_id: RequestId,
    ) -> Result<Option<DocumentGenerationUri>, DocGenError> {
        let url = format!(
            "{}/generation/{}/document",
            self.subscription_url(subscription_id),
            request_id
        );
        let response: DocumentUri = self
            .send_json("GetDocumentGenerationUri", self.client.get(&url))
            .await?;
        Ok(response.into_generation_uri())
    }

    async fn get_templates(
        &self,
        scope: ConfigurationScope,
        path: &HierarchyPath,
        subject: Option<&str>,
    ) -> Result<Vec<DocumentGenerationTemplate>, DocGenError> {
        let mut url = format!(
            "{}/templates?hierarchyPath={}",
            self.configuration_url(scope),
            urlencoding::encode(&path.to_string())
        );
        if let Some(subject) = subject {
            url.push_str("&subject=");
            url.push_str(&urlencoding::encode(subject));
        }
        debug!(url = %url, "GetTemplates");
        let templates: Vec<Template> = self.send_json("GetTemplates", self.client.get(&url)).await?;
        Ok(templates.into_iter().map(Into::into).collect())
    }

    async fn get_metadata(
        &self,
        scope: ConfigurationScope,
        path: &HierarchyPath,
        template_id: &str,
        language: &str,
    ) -> Result<Vec<u8>, DocGenError> {
        let url = format!(
            "{}/templates/{}/metadata?language={}&hierarchyPath={}",
            self.configuration_url(scope),
            urlencoding::encode(template_id),
            urlencoding::encode(language),
            urlencoding::encode(&path.to_string())
        );
        debug!(url = %url, "GetMetadata");
        let response = self.send("GetMetadata", self.client.get(&url)).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn download_document(&self, uri: &str) -> Result<Vec<u8>, DocGenError> {
        // Download links are pre-signed; no bearer token.
        let response = self
            .client
            .get(uri)
            .header(header::ACCEPT, "application/octet-stream")
            .send()
            .await?;
        let response = check_status("DownloadDocument", response).await?;
        Ok(response.bytes().await?.to_vec())
    }
}
