//! Document generation configurations
//!
//! A configuration owns the template storage directory tree and its server
//! identity. `load` makes the local state match the server; `save` pushes the
//! local state to the server.

use crate::directory::reconcile::{Reconciler, SyncStats};
use crate::directory::refresh::Refresher;
use crate::directory::{DirectoryId, DirectoryTree, RemoteConfiguration};
use crate::error::DocGenError;
use crate::hierarchy::HierarchyPath;
use crate::storage::TemplateStorage;
use crate::transport::contract::ConfigurationTransport;
use crate::transport::wire::{ConfigurationRequest, ConfigurationSummary};
use crate::types::{ConfigurationId, ConfigurationScope, SubscriptionId};
use std::sync::Arc;
use tracing::{debug, info};

pub struct DocumentGenerationConfiguration {
    transport: Arc<dyn ConfigurationTransport>,
    subscription_id: SubscriptionId,
    id: Option<ConfigurationId>,
    name: String,
    level_names: Vec<String>,
    has_license: bool,
    metadata_filename_extension: Option<String>,
    tree: DirectoryTree,
}

impl std::fmt::Debug for DocumentGenerationConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentGenerationConfiguration")
            .field("subscription_id", &self.subscription_id)
            .field("id", &self.id)
            .field("name", &self.name)
            .field("level_names", &self.level_names)
            .field("has_license", &self.has_license)
            .field("directories", &self.tree.len())
            .finish()
    }
}

impl DocumentGenerationConfiguration {
    /// A configuration that does not exist on the server yet.
    pub fn new(
        transport: Arc<dyn ConfigurationTransport>,
        subscription_id: SubscriptionId,
        name: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            subscription_id,
            id: None,
            name: name.into(),
            level_names: Vec::new(),
            has_license: false,
            metadata_filename_extension: None,
            tree: DirectoryTree::new(),
        }
    }

    /// Handle to an existing server configuration. Call `load` to populate it.
    pub fn bind(transport: Arc<dyn ConfigurationTransport>, scope: ConfigurationScope) -> Self {
        Self {
            id: Some(scope.configuration_id),
            ..Self::new(transport, scope.subscription_id, String::new())
        }
    }

    /// Configuration as returned by the service after creation. The directory
    /// tree is left empty; `load` fetches it.
    pub(crate) fn from_summary(
        transport: Arc<dyn ConfigurationTransport>,
        subscription_id: SubscriptionId,
        summary: ConfigurationSummary,
    ) -> Result<Self, DocGenError> {
        let remote = RemoteConfiguration::try_from(summary)?;
        let mut configuration = Self::bind(
            transport,
            ConfigurationScope::new(
                remote.subscription_id.unwrap_or(subscription_id),
                remote.id,
            ),
        );
        configuration.apply_scalars(&remote);
        Ok(configuration)
    }

    pub fn id(&self) -> Option<ConfigurationId> {
        self.id
    }

    pub fn subscription_id(&self) -> SubscriptionId {
        self.subscription_id
    }

    /// Server address; fails with `NotYetCreated` before creation.
    pub fn scope(&self) -> Result<ConfigurationScope, DocGenError> {
        let id = self.id.ok_or(DocGenError::NotYetCreated)?;
        Ok(ConfigurationScope::new(self.subscription_id, id))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Display names of the tree levels, root first.
    pub fn level_names(&self) -> &[String] {
        &self.level_names
    }

    pub fn set_level_names(&mut self, level_names: Vec<String>) {
        self.level_names = level_names;
    }

    pub fn has_license(&self) -> bool {
        self.has_license
    }

    pub fn set_has_license(&mut self, has_license: bool) {
        self.has_license = has_license;
    }

    pub fn metadata_filename_extension(&self) -> Option<&str> {
        self.metadata_filename_extension.as_deref()
    }

    pub fn set_metadata_filename_extension(&mut self, extension: Option<String>) {
        self.metadata_filename_extension = extension;
    }

    pub fn tree(&self) -> &DirectoryTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut DirectoryTree {
        &mut self.tree
    }

    pub fn root_template_storage_directory(&self) -> Option<DirectoryId> {
        self.tree.root()
    }

    /// Create a detached directory scoped to this configuration.
    pub fn create_template_storage_directory(
        &mut self,
        key: impl Into<String>,
        name: impl Into<String>,
        storage: TemplateStorage,
    ) -> DirectoryId {
        self.tree.create(key, name, storage)
    }

    /// Replace the root directory with a new one.
    pub fn set_root_template_storage_directory(
        &mut self,
        name: impl Into<String>,
        storage: TemplateStorage,
    ) -> Result<DirectoryId, DocGenError> {
        let root = self.tree.create("", name, storage);
        self.tree.set_root(root)?;
        Ok(root)
    }

    pub fn find_directory_by_path(
        &self,
        path: &HierarchyPath,
    ) -> Result<Option<DirectoryId>, DocGenError> {
        self.tree.find_directory_by_path(path)
    }

    fn apply_scalars(&mut self, remote: &RemoteConfiguration) {
        self.name = remote.name.clone();
        self.level_names = remote.level_names.clone();
        self.has_license = remote.has_license;
        self.metadata_filename_extension = remote.metadata_filename_extension.clone();
    }

    fn request(&self) -> ConfigurationRequest {
        ConfigurationRequest {
            name: self.name.clone(),
            has_license: self.has_license,
            level_names: self.level_names.clone(),
            metadata_filename_extension: self.metadata_filename_extension.clone(),
        }
    }

    /// Replace local state with the server's.
    pub async fn load(&mut self) -> Result<(), DocGenError> {
        let scope = self.scope()?;
        debug!(configuration_id = %scope.configuration_id, "Loading configuration");
        let summary = self.transport.get_configuration_summary(scope).await?;
        let remote = RemoteConfiguration::try_from(summary)?;
        self.apply_scalars(&remote);

        Refresher::new(self.transport.as_ref(), scope, &mut self.tree)
            .run(remote.root.as_ref())
            .await?;
        info!(
            configuration_id = %scope.configuration_id,
            directories = remote.root.as_ref().map(|r| r.count()).unwrap_or(0),
            "Configuration loaded"
        );
        Ok(())
    }

    /// Push local state to the server.
    ///
    /// Validates the whole tree first: a deprecated directory anywhere fails
    /// the save before any remote call. Otherwise the scalar fields are
    /// updated and the directory tree is reconciled top-down.
    pub async fn save(&mut self) -> Result<SyncStats, DocGenError> {
        let root = self.tree.root().ok_or(DocGenError::MissingRootDirectory)?;
        let scope = self.scope()?;
        Reconciler::preflight(&self.tree, root)?;

        let root_path = HierarchyPath::root().to_string();
        let summary = self
            .transport
            .get_configuration_summary(scope)
            .await
            .map_err(|e| DocGenError::sync("update configuration", root_path.clone(), e))?;
        let remote = RemoteConfiguration::try_from(summary)?;
        self.transport
            .update_configuration(scope, &self.request())
            .await
            .map_err(|e| DocGenError::sync("update configuration", root_path, e))?;

        let stats = Reconciler::new(self.transport.as_ref(), scope, &mut self.tree)
            .run(root, remote.root.as_ref())
            .await?;
        info!(
            configuration_id = %scope.configuration_id,
            created = stats.created,
            updated = stats.updated,
            deleted = stats.deleted,
            "Configuration saved"
        );
        Ok(stats)
    }

    /// Delete the configuration and all its directories on the server.
    pub async fn delete(self) -> Result<(), DocGenError> {
        let scope = self.scope()?;
        self.transport.delete_configuration(scope).await?;
        info!(configuration_id = %scope.configuration_id, "Configuration deleted");
        Ok(())
    }
}
