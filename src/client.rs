//! Document generation client
//!
//! Entry point for callers: resolves subscriptions, creates and loads
//! configurations, requests generation and conversion, and waits for the
//! resulting documents.

use crate::config::DocumentGenerationOptions;
use crate::configuration::DocumentGenerationConfiguration;
use crate::error::DocGenError;
use crate::hierarchy::HierarchyPath;
use crate::messages::{
    ConfigurationListItem, DocumentConversionRequestDetails, DocumentGenerationProgress,
    DocumentGenerationRequestDetails, DocumentGenerationState, DocumentGenerationTemplate,
    DocumentGenerationUri,
};
use crate::transport::contract::{ConfigurationTransport, GenerationTransport};
use crate::transport::http::HttpTransport;
use crate::transport::token::{StaticTokenProvider, TokenProvider};
use crate::transport::wire::{
    ConfigurationRequest, GenerateDocumentConversionRequest, GenerateDocumentRequest,
};
use crate::types::{ConfigurationId, ConfigurationScope, RequestId, SubscriptionId};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// How `wait_for_document` polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    pub timeout: Duration,
    pub interval: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300),
            interval: Duration::from_secs(2),
        }
    }
}

pub struct DocumentGenerationClient {
    configurations: Arc<dyn ConfigurationTransport>,
    generation: Arc<dyn GenerationTransport>,
    default_subscription_id: Option<SubscriptionId>,
}

impl DocumentGenerationClient {
    pub fn new(transport: Arc<HttpTransport>, default_subscription_id: Option<SubscriptionId>) -> Self {
        Self::with_transports(transport.clone(), transport, default_subscription_id)
    }

    pub fn with_transports(
        configurations: Arc<dyn ConfigurationTransport>,
        generation: Arc<dyn GenerationTransport>,
        default_subscription_id: Option<SubscriptionId>,
    ) -> Self {
        Self {
            configurations,
            generation,
            default_subscription_id,
        }
    }

    /// HTTP client from service options, authenticating with the configured
    /// static access token.
    pub fn from_options(options: &DocumentGenerationOptions) -> Result<Self, DocGenError> {
        let token = options.access_token.clone().ok_or_else(|| {
            DocGenError::InvalidConfiguration("service.access_token is not set".to_string())
        })?;
        Self::from_options_with_tokens(options, Arc::new(StaticTokenProvider::new(token)))
    }

    pub fn from_options_with_tokens(
        options: &DocumentGenerationOptions,
        tokens: Arc<dyn TokenProvider>,
    ) -> Result<Self, DocGenError> {
        let transport = HttpTransport::new(
            options.service_uri.clone(),
            Duration::from_secs(options.timeout_secs),
            tokens,
        )?;
        Ok(Self::new(Arc::new(transport), options.subscription_id))
    }

    /// Explicit subscription id, else the configured default.
    pub fn resolve_subscription_id(
        &self,
        subscription_id: Option<SubscriptionId>,
    ) -> Result<SubscriptionId, DocGenError> {
        subscription_id
            .or(self.default_subscription_id)
            .ok_or(DocGenError::NoSubscriptionId)
    }

    fn scope(
        &self,
        subscription_id: Option<SubscriptionId>,
        configuration_id: ConfigurationId,
    ) -> Result<ConfigurationScope, DocGenError> {
        Ok(ConfigurationScope::new(
            self.resolve_subscription_id(subscription_id)?,
            configuration_id,
        ))
    }

    pub async fn list_configurations(
        &self,
        subscription_id: Option<SubscriptionId>,
    ) -> Result<Vec<ConfigurationListItem>, DocGenError> {
        let subscription_id = self.resolve_subscription_id(subscription_id)?;
        self.configurations.list_configurations(subscription_id).await
    }

    /// Create a configuration on the server. It has no directories yet; set a
    /// root and `save` to add them.
    pub async fn create_configuration(
        &self,
        subscription_id: Option<SubscriptionId>,
        request: &ConfigurationRequest,
    ) -> Result<DocumentGenerationConfiguration, DocGenError> {
        let subscription_id = self.resolve_subscription_id(subscription_id)?;
        let summary = self
            .configurations
            .create_configuration(subscription_id, request)
            .await?;
        let configuration = DocumentGenerationConfiguration::from_summary(
            self.configurations.clone(),
            subscription_id,
            summary,
        )?;
        info!(
            configuration_id = ?configuration.id(),
            name = %configuration.name(),
            "Configuration created"
        );
        Ok(configuration)
    }

    /// Bind to an existing configuration and load it.
    pub async fn get_configuration(
        &self,
        subscription_id: Option<SubscriptionId>,
        configuration_id: ConfigurationId,
    ) -> Result<DocumentGenerationConfiguration, DocGenError> {
        let scope = self.scope(subscription_id, configuration_id)?;
        let mut configuration =
            DocumentGenerationConfiguration::bind(self.configurations.clone(), scope);
        configuration.load().await?;
        Ok(configuration)
    }

    pub async fn request_document_generation(
        &self,
        subscription_id: Option<SubscriptionId>,
        configuration_id: ConfigurationId,
        details: &DocumentGenerationRequestDetails,
    ) -> Result<DocumentGenerationProgress, DocGenError> {
        let subscription_id = self.resolve_subscription_id(subscription_id)?;
        let request = GenerateDocumentRequest::new(configuration_id, details);
        let progress = self
            .generation
            .request_document_generation(subscription_id, &request)
            .await?;
        info!(request_id = %progress.id, template_id = %details.template_id, "Document generation requested");
        Ok(progress)
    }

    pub async fn request_document_conversion(
        &self,
        subscription_id: Option<SubscriptionId>,
        configuration_id: ConfigurationId,
        details: &DocumentConversionRequestDetails,
    ) -> Result<DocumentGenerationProgress, DocGenError> {
        let subscription_id = self.resolve_subscription_id(subscription_id)?;
        let request = GenerateDocumentConversionRequest::new(configuration_id, details);
        let progress = self
            .generation
            .request_document_conversion(subscription_id, &request)
            .await?;
        info!(request_id = %progress.id, "Document conversion requested");
        Ok(progress)
    }

    pub async fn get_document_generation_progress(
        &self,
        subscription_id: Option<SubscriptionId>,
        request_id: RequestId,
    ) -> Result<DocumentGenerationProgress, DocGenError> {
        let subscription_id = self.resolve_subscription_id(subscription_id)?;
        self.generation
            .get_document_generation_progress(subscription_id, request_id)
            .await
    }

    pub async fn get_document_generation_uri(
        &self,
        subscription_id: Option<SubscriptionId>,
        request_id: RequestId,
    ) -> Result<Option<DocumentGenerationUri>, DocGenError> {
        let subscription_id = self.resolve_subscription_id(subscription_id)?;
        self.generation
            .get_document_generation_uri(subscription_id, request_id)
            .await
    }

    pub async fn get_templates(
        &self,
        subscription_id: Option<SubscriptionId>,
        configuration_id: ConfigurationId,
        path: &HierarchyPath,
        subject: Option<&str>,
    ) -> Result<Vec<DocumentGenerationTemplate>, DocGenError> {
        let scope = self.scope(subscription_id, configuration_id)?;
        self.generation.get_templates(scope, path, subject).await
    }

    pub async fn get_metadata(
        &self,
        subscription_id: Option<SubscriptionId>,
        configuration_id: ConfigurationId,
        path: &HierarchyPath,
        template_id: &str,
        language: &str,
    ) -> Result<Vec<u8>, DocGenError> {
        let scope = self.scope(subscription_id, configuration_id)?;
        self.generation
            .get_metadata(scope, path, template_id, language)
            .await
    }

    /// Poll until the request completes and return its download link.
    ///
    /// Fails with `GenerationFailed` when the service reports failure and with
    /// `GenerationTimedOut` once `poll.timeout` has elapsed.
    pub async fn wait_for_document(
        &self,
        subscription_id: Option<SubscriptionId>,
        request_id: RequestId,
        poll: PollOptions,
    ) -> Result<DocumentGenerationUri, DocGenError> {
        let subscription_id = self.resolve_subscription_id(subscription_id)?;
        let started = Instant::now();
        loop {
            let progress = self
                .generation
                .get_document_generation_progress(subscription_id, request_id)
                .await?;
            debug!(request_id = %request_id, state = ?progress.state, "Polled document generation");

            match progress.state {
                DocumentGenerationState::Failed => {
                    return Err(DocGenError::GenerationFailed {
                        request_id,
                        reason: progress
                            .fail_reason
                            .unwrap_or_else(|| "no reason given".to_string()),
                    });
                }
                DocumentGenerationState::Completed => {
                    // The link can lag behind the state change.
                    if let Some(uri) = self
                        .generation
                        .get_document_generation_uri(subscription_id, request_id)
                        .await?
                    {
                        return Ok(uri);
                    }
                }
                DocumentGenerationState::Requested => {}
            }

            if started.elapsed() >= poll.timeout {
                return Err(DocGenError::GenerationTimedOut {
                    request_id,
                    waited_secs: started.elapsed().as_secs(),
                });
            }
            tokio::time::sleep(poll.interval).await;
        }
    }

    pub async fn download_document(&self, uri: &DocumentGenerationUri) -> Result<Vec<u8>, DocGenError> {
        self.generation.download_document(&uri.uri).await
    }

    /// Download the document behind `uri` into `path`; returns the byte count.
    pub async fn write_document_to_file(
        &self,
        uri: &DocumentGenerationUri,
        path: &Path,
    ) -> Result<usize, DocGenError> {
        let bytes = self.download_document(uri).await?;
        tokio::fs::write(path, &bytes).await?;
        info!(path = %path.display(), bytes = bytes.len(), "Document written");
        Ok(bytes.len())
    }
}
