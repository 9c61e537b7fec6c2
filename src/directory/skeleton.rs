//! Read-only snapshot of the server's directory tree, built from one
//! configuration summary response.

use crate::error::DocGenError;
use crate::storage::TemplateStorageType;
use crate::transport::wire::{ConfigurationSummary, EntrySummary};
use crate::types::{ConfigurationId, EntryId, SubscriptionId};

/// Server-side configuration as seen in one summary.
#[derive(Debug, Clone)]
pub struct RemoteConfiguration {
    pub id: ConfigurationId,
    pub subscription_id: Option<SubscriptionId>,
    pub name: String,
    pub level_names: Vec<String>,
    pub has_license: bool,
    pub metadata_filename_extension: Option<String>,
    pub root: Option<RemoteDirectory>,
}

/// Server-side directory outline. Immutable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteDirectory {
    id: EntryId,
    key: String,
    name: String,
    storage_type: TemplateStorageType,
    children: Vec<RemoteDirectory>,
}

impl RemoteDirectory {
    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn storage_type(&self) -> TemplateStorageType {
        self.storage_type
    }

    pub fn is_deprecated(&self) -> bool {
        self.storage_type.is_deprecated()
    }

    pub fn children(&self) -> &[RemoteDirectory] {
        &self.children
    }

    /// Number of directories in this subtree, including itself.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(RemoteDirectory::count).sum::<usize>()
    }
}

impl TryFrom<EntrySummary> for RemoteDirectory {
    type Error = DocGenError;

    fn try_from(summary: EntrySummary) -> Result<Self, Self::Error> {
        let id = summary.id.ok_or_else(|| {
            DocGenError::InvalidResponse("Found null entry Id in configuration summary".to_string())
        })?;
        let children = summary
            .children
            .unwrap_or_default()
            .into_iter()
            .map(RemoteDirectory::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            id,
            key: summary.key.unwrap_or_default(),
            name: summary.name.unwrap_or_default(),
            storage_type: summary
                .template_storage_type
                .as_deref()
                .map(TemplateStorageType::parse)
                .unwrap_or(TemplateStorageType::Deprecated),
            children,
        })
    }
}

impl TryFrom<ConfigurationSummary> for RemoteConfiguration {
    type Error = DocGenError;

    fn try_from(summary: ConfigurationSummary) -> Result<Self, Self::Error> {
        let id = summary.id.ok_or_else(|| {
            DocGenError::InvalidResponse("Found null configuration Id in response".to_string())
        })?;
        Ok(Self {
            id,
            subscription_id: summary.subscription_id,
            name: summary.name.unwrap_or_default(),
            level_names: summary.level_names.unwrap_or_default(),
            has_license: summary.has_license.unwrap_or(false),
            metadata_filename_extension: summary.metadata_filename_extension,
            root: summary
                .template_storage_directory
                .map(RemoteDirectory::try_from)
                .transpose()?,
        })
    }
}
