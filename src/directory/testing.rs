//! In-memory configuration service for unit tests.
//!
//! Keeps a real server-side tree so that key uniqueness among siblings is
//! enforced the way the service enforces it, and records every call.

use crate::error::DocGenError;
use crate::hierarchy::HierarchyPath;
use crate::messages::ConfigurationListItem;
use crate::storage::{
    AzureBlobTemplateStorage, SharePointOnlineTemplateStorage, TemplateStorage,
    TemplateStorageType,
};
use crate::transport::contract::{ConfigurationTransport, EntryLocator};
use crate::transport::wire::{
    ConfigurationRequest, ConfigurationSummary, EntryDetail, EntryRequest, EntrySummary,
    StoragePayload,
};
use crate::types::{ConfigurationScope, EntryId, SubscriptionId};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    GetSummary,
    UpdateConfiguration { name: String },
    DeleteConfiguration,
    GetEntry { id: EntryId },
    Create { parent: String, key: String },
    Update { at: String, key: String },
    Delete { id: EntryId },
    CreateConfiguration { name: String },
    ListConfigurations,
}

impl Call {
    pub(crate) fn is_entry_write(&self) -> bool {
        matches!(
            self,
            Call::Create { .. } | Call::Update { .. } | Call::Delete { .. }
        )
    }
}

struct FakeState {
    summary: ConfigurationSummary,
    storage: HashMap<EntryId, TemplateStorage>,
    calls: Vec<Call>,
    fail_on_key: Option<String>,
    fail_configuration_update: bool,
}

pub(crate) struct FakeServer {
    scope: ConfigurationScope,
    state: Mutex<FakeState>,
}

fn failed(operation: &str, reason: &str, content: impl Into<String>) -> DocGenError {
    DocGenError::RequestFailed {
        operation: operation.to_string(),
        reason: reason.to_string(),
        content: Some(content.into()),
    }
}

fn storage_from_payload(payload: &StoragePayload) -> TemplateStorage {
    match payload {
        StoragePayload::AzureBlob(m) => TemplateStorage::AzureBlob(AzureBlobTemplateStorage {
            connection_string_or_key: m.secret_key_or_storage_connection_string.clone(),
            container_name: m.container_name.clone(),
            blob_prefix: m.blob_prefix.clone(),
        }),
        StoragePayload::SharePointOnline(m) => {
            TemplateStorage::SharePointOnline(SharePointOnlineTemplateStorage {
                client_id: m.client_id.clone(),
                tenant_id: m.tenant_id.clone(),
                client_secret_or_key: m.secret_key_or_client_secret.clone(),
                group_name: m.group_name.clone(),
            })
        }
    }
}

fn find_by_id(node: &mut EntrySummary, id: EntryId) -> Option<&mut EntrySummary> {
    if node.id == Some(id) {
        return Some(node);
    }
    node.children
        .as_mut()?
        .iter_mut()
        .find_map(|c| find_by_id(c, id))
}

fn find_by_path<'n>(node: &'n mut EntrySummary, segments: &[String]) -> Option<&'n mut EntrySummary> {
    let (head, tail) = segments.split_first()?;
    if node.key.as_deref() != Some(head.as_str()) {
        return None;
    }
    if tail.is_empty() {
        return Some(node);
    }
    node.children
        .as_mut()?
        .iter_mut()
        .find_map(|c| find_by_path(c, tail))
}

fn remove_by_id(node: &mut EntrySummary, id: EntryId) -> bool {
    let Some(children) = node.children.as_mut() else {
        return false;
    };
    let before = children.len();
    children.retain(|c| c.id != Some(id));
    if children.len() != before {
        return true;
    }
    children.iter_mut().any(|c| remove_by_id(c, id))
}

fn has_sibling_key(parent: &EntrySummary, key: &str, except: Option<EntryId>) -> bool {
    parent
        .children
        .iter()
        .flatten()
        .any(|c| c.key.as_deref() == Some(key) && c.id != except)
}

fn new_entry(request: &EntryRequest) -> EntrySummary {
    EntrySummary {
        id: Some(Uuid::new_v4()),
        key: Some(request.key.clone()),
        name: Some(request.name.clone()),
        template_storage_type: Some(
            request
                .template_storage_configuration
                .storage_type()
                .as_str()
                .to_string(),
        ),
        children: Some(Vec::new()),
    }
}

impl FakeServer {
    /// A created configuration without a root directory.
    pub(crate) fn empty() -> Self {
        let scope = ConfigurationScope::new(Uuid::new_v4(), Uuid::new_v4());
        Self {
            scope,
            state: Mutex::new(FakeState {
                summary: ConfigurationSummary {
                    id: Some(scope.configuration_id),
                    subscription_id: Some(scope.subscription_id),
                    name: Some("Fake configuration".to_string()),
                    level_names: Some(Vec::new()),
                    has_license: Some(false),
                    metadata_filename_extension: None,
                    template_storage_directory: None,
                },
                storage: HashMap::new(),
                calls: Vec::new(),
                fail_on_key: None,
                fail_configuration_update: false,
            }),
        }
    }

    pub(crate) fn with_root(name: &str, storage: TemplateStorage) -> Self {
        let server = Self::empty();
        {
            let mut state = server.state.lock();
            let id = Uuid::new_v4();
            state.summary.template_storage_directory = Some(EntrySummary {
                id: Some(id),
                key: Some(String::new()),
                name: Some(name.to_string()),
                template_storage_type: Some(storage.storage_type().as_str().to_string()),
                children: Some(Vec::new()),
            });
            state.storage.insert(id, storage);
        }
        server
    }

    pub(crate) fn scope(&self) -> ConfigurationScope {
        self.scope
    }

    pub(crate) fn root_id(&self) -> Option<EntryId> {
        self.state
            .lock()
            .summary
            .template_storage_directory
            .as_ref()
            .and_then(|r| r.id)
    }

    /// Add an entry directly on the server side, without recording a call.
    pub(crate) fn seed_child(&self, parent: EntryId, key: &str, storage: TemplateStorage) -> EntryId {
        let mut state = self.state.lock();
        let id = Uuid::new_v4();
        let type_tag = match &storage {
            TemplateStorage::Deprecated => "LogicTemplateStorage".to_string(),
            other => other.storage_type().as_str().to_string(),
        };
        let root = state
            .summary
            .template_storage_directory
            .as_mut()
            .expect("seeding requires a root");
        let parent = find_by_id(root, parent).expect("unknown seed parent");
        parent.children.get_or_insert_with(Vec::new).push(EntrySummary {
            id: Some(id),
            key: Some(key.to_string()),
            name: Some(key.to_string()),
            template_storage_type: Some(type_tag),
            children: Some(Vec::new()),
        });
        state.storage.insert(id, storage);
        id
    }

    pub(crate) fn storage_of(&self, id: EntryId) -> TemplateStorage {
        self.state
            .lock()
            .storage
            .get(&id)
            .cloned()
            .unwrap_or(TemplateStorage::Deprecated)
    }

    pub(crate) fn child_keys(&self, parent: EntryId) -> Vec<String> {
        let mut state = self.state.lock();
        let Some(root) = state.summary.template_storage_directory.as_mut() else {
            return Vec::new();
        };
        find_by_id(root, parent)
            .and_then(|p| p.children.clone())
            .unwrap_or_default()
            .into_iter()
            .filter_map(|c| c.key)
            .collect()
    }

    pub(crate) fn fail_on_key(&self, key: &str) {
        self.state.lock().fail_on_key = Some(key.to_string());
    }

    pub(crate) fn fail_configuration_update(&self) {
        self.state.lock().fail_configuration_update = true;
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub(crate) fn entry_writes(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_entry_write).collect()
    }

    pub(crate) fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }
}

impl FakeState {
    fn check_failure(&self, operation: &str, key: &str) -> Result<(), DocGenError> {
        if self.fail_on_key.as_deref() == Some(key) {
            return Err(failed(operation, "Internal Server Error", "injected failure"));
        }
        Ok(())
    }

    fn detail(&self, entry: &EntrySummary) -> Result<EntryDetail, DocGenError> {
        let id = entry
            .id
            .ok_or_else(|| DocGenError::InvalidResponse("entry without id".to_string()))?;
        Ok(EntryDetail {
            id,
            key: entry.key.clone().unwrap_or_default(),
            name: entry.name.clone().unwrap_or_default(),
            storage: self
                .storage
                .get(&id)
                .cloned()
                .unwrap_or(TemplateStorage::Deprecated),
        })
    }
}

#[async_trait]
impl ConfigurationTransport for FakeServer {
    async fn get_configuration_summary(
        &self,
        _scope: ConfigurationScope,
    ) -> Result<ConfigurationSummary, DocGenError> {
        let mut state = self.state.lock();
        state.calls.push(Call::GetSummary);
        Ok(state.summary.clone())
    }

    async fn update_configuration(
        &self,
        _scope: ConfigurationScope,
        request: &ConfigurationRequest,
    ) -> Result<(), DocGenError> {
        let mut state = self.state.lock();
        state.calls.push(Call::UpdateConfiguration {
            name: request.name.clone(),
        });
        if state.fail_configuration_update {
            return Err(failed("UpdateConfiguration", "Internal Server Error", "injected failure"));
        }
        state.summary.name = Some(request.name.clone());
        state.summary.has_license = Some(request.has_license);
        state.summary.level_names = Some(request.level_names.clone());
        state.summary.metadata_filename_extension = request.metadata_filename_extension.clone();
        Ok(())
    }

    async fn delete_configuration(&self, _scope: ConfigurationScope) -> Result<(), DocGenError> {
        let mut state = self.state.lock();
        state.calls.push(Call::DeleteConfiguration);
        state.summary.template_storage_directory = None;
        Ok(())
    }

    async fn get_entry_detail(
        &self,
        _scope: ConfigurationScope,
        entry_id: EntryId,
        storage_type: TemplateStorageType,
    ) -> Result<EntryDetail, DocGenError> {
        let mut state = self.state.lock();
        state.calls.push(Call::GetEntry { id: entry_id });
        if storage_type.is_deprecated() {
            return Err(DocGenError::UnsupportedStorageType {
                storage_type: storage_type.to_string(),
                path: format!("#{}", entry_id),
            });
        }
        let entry = state
            .summary
            .template_storage_directory
            .as_mut()
            .and_then(|root| find_by_id(root, entry_id))
            .cloned()
            .ok_or_else(|| failed("GetEntry", "Not Found", entry_id.to_string()))?;
        state.detail(&entry)
    }

    async fn create_entry(
        &self,
        _scope: ConfigurationScope,
        parent: &EntryLocator,
        request: &EntryRequest,
    ) -> Result<EntryDetail, DocGenError> {
        let mut state = self.state.lock();
        state.calls.push(Call::Create {
            parent: parent.to_string(),
            key: request.key.clone(),
        });
        state.check_failure("CreateEntry", &request.key)?;

        let entry = new_entry(request);
        let id = entry.id.ok_or_else(|| DocGenError::InvalidResponse("id".to_string()))?;
        match parent {
            EntryLocator::Path(path) if path.is_empty() => {
                if state.summary.template_storage_directory.is_some() {
                    return Err(failed("CreateEntry", "Conflict", "root already exists"));
                }
                state.summary.template_storage_directory = Some(entry.clone());
            }
            locator => {
                let root = state
                    .summary
                    .template_storage_directory
                    .as_mut()
                    .ok_or_else(|| failed("CreateEntry", "Not Found", "no root"))?;
                let parent_entry = match locator {
                    EntryLocator::Path(path) => find_by_path(root, path.segments()),
                    EntryLocator::Id(id) => find_by_id(root, *id),
                }
                .ok_or_else(|| failed("CreateEntry", "Not Found", locator.to_string()))?;
                if has_sibling_key(parent_entry, &request.key, None) {
                    return Err(failed("CreateEntry", "Conflict", "duplicate key"));
                }
                parent_entry
                    .children
                    .get_or_insert_with(Vec::new)
                    .push(entry.clone());
            }
        }
        state
            .storage
            .insert(id, storage_from_payload(&request.template_storage_configuration));
        state.detail(&entry)
    }

    async fn update_entry(
        &self,
        _scope: ConfigurationScope,
        at: &EntryLocator,
        request: &EntryRequest,
    ) -> Result<EntryDetail, DocGenError> {
        let mut state = self.state.lock();
        let at_display = at.to_string();
        state.calls.push(Call::Update {
            at: at_display.clone(),
            key: request.key.clone(),
        });
        state.check_failure("UpdateEntry", &request.key)?;

        let root = state
            .summary
            .template_storage_directory
            .as_mut()
            .ok_or_else(|| failed("UpdateEntry", "Not Found", "no root"))?;
        let (id, parent_segments) = {
            let entry = match at {
                EntryLocator::Path(path) => find_by_path(root, path.segments()),
                EntryLocator::Id(id) => find_by_id(root, *id),
            }
            .ok_or_else(|| failed("UpdateEntry", "Not Found", at_display.clone()))?;
            let path = match at {
                EntryLocator::Path(path) => path.clone(),
                EntryLocator::Id(_) => HierarchyPath::empty(),
            };
            (entry.id, path.parent())
        };
        if !parent_segments.is_empty() {
            if let Some(parent) = find_by_path(root, parent_segments.segments()) {
                if has_sibling_key(parent, &request.key, id) {
                    return Err(failed("UpdateEntry", "Conflict", "duplicate key"));
                }
            }
        }
        let entry = match id {
            Some(id) => find_by_id(root, id),
            None => None,
        }
        .ok_or_else(|| failed("UpdateEntry", "Not Found", at_display))?;
        entry.key = Some(request.key.clone());
        entry.name = Some(request.name.clone());
        entry.template_storage_type = Some(
            request
                .template_storage_configuration
                .storage_type()
                .as_str()
                .to_string(),
        );
        let entry = entry.clone();
        state
            .storage
            .insert(entry.id.unwrap_or_default(), storage_from_payload(&request.template_storage_configuration));
        state.detail(&entry)
    }

    async fn delete_entry(
        &self,
        _scope: ConfigurationScope,
        at: &EntryLocator,
        _storage_type: TemplateStorageType,
    ) -> Result<(), DocGenError> {
        let mut state = self.state.lock();
        let EntryLocator::Id(id) = at else {
            return Err(failed("DeleteEntry", "Bad Request", "fake deletes by id only"));
        };
        state.calls.push(Call::Delete { id: *id });
        let summary = &mut state.summary;
        let is_root = summary
            .template_storage_directory
            .as_ref()
            .map(|root| root.id == Some(*id))
            .unwrap_or(false);
        let removed = if is_root {
            summary.template_storage_directory = None;
            true
        } else {
            match summary.template_storage_directory.as_mut() {
                Some(root) => remove_by_id(root, *id),
                None => false,
            }
        };
        if !removed {
            return Err(failed("DeleteEntry", "Not Found", id.to_string()));
        }
        Ok(())
    }

    async fn create_configuration(
        &self,
        subscription_id: SubscriptionId,
        request: &ConfigurationRequest,
    ) -> Result<ConfigurationSummary, DocGenError> {
        let mut state = self.state.lock();
        state.calls.push(Call::CreateConfiguration {
            name: request.name.clone(),
        });
        Ok(ConfigurationSummary {
            id: Some(self.scope.configuration_id),
            subscription_id: Some(subscription_id),
            name: Some(request.name.clone()),
            level_names: Some(request.level_names.clone()),
            has_license: Some(request.has_license),
            metadata_filename_extension: request.metadata_filename_extension.clone(),
            template_storage_directory: None,
        })
    }

    async fn list_configurations(
        &self,
        _subscription_id: SubscriptionId,
    ) -> Result<Vec<ConfigurationListItem>, DocGenError> {
        let mut state = self.state.lock();
        state.calls.push(Call::ListConfigurations);
        Ok(vec![ConfigurationListItem {
            configuration_id: self.scope.configuration_id,
            name: state.summary.name.clone().unwrap_or_default(),
        }])
    }
}
