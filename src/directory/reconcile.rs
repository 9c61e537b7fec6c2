//! Save-side reconciliation of the live tree against a server snapshot.
//!
//! Each directory is updated (or created) before its children are visited.
//! Server children that no longer have a local counterpart, or whose key is
//! now taken by a different local directory, are deleted before any sibling
//! is created so that keys stay unique on the server at every step.

use crate::directory::skeleton::RemoteDirectory;
use crate::directory::tree::{DirectoryId, DirectoryTree};
use crate::error::DocGenError;
use crate::hierarchy::HierarchyPath;
use crate::transport::contract::{ConfigurationTransport, EntryLocator};
use crate::transport::wire::{EntryRequest, StoragePayload};
use crate::types::{ConfigurationScope, EntryId};
use futures::future::{BoxFuture, FutureExt};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Remote calls issued by one save.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
}

pub(crate) struct Reconciler<'a> {
    transport: &'a dyn ConfigurationTransport,
    scope: ConfigurationScope,
    tree: &'a mut DirectoryTree,
    stats: SyncStats,
}

impl<'a> Reconciler<'a> {
    pub(crate) fn new(
        transport: &'a dyn ConfigurationTransport,
        scope: ConfigurationScope,
        tree: &'a mut DirectoryTree,
    ) -> Self {
        Self {
            transport,
            scope,
            tree,
            stats: SyncStats::default(),
        }
    }

    /// Fail with `UnsupportedStorageType` if any directory below `root` cannot
    /// be persisted. Runs before the first remote call.
    pub(crate) fn preflight(tree: &DirectoryTree, root: DirectoryId) -> Result<(), DocGenError> {
        for node in tree.descendants(root)? {
            let record = tree.get(node)?;
            if record.is_deprecated() {
                return Err(DocGenError::UnsupportedStorageType {
                    storage_type: record.storage_type().to_string(),
                    path: tree.hierarchy_path(node)?.to_string(),
                });
            }
        }
        Ok(())
    }

    pub(crate) async fn run(
        mut self,
        root: DirectoryId,
        remote: Option<&RemoteDirectory>,
    ) -> Result<SyncStats, DocGenError> {
        self.reconcile(root, remote).await?;
        Ok(self.stats)
    }

    fn entry_request(&self, node: DirectoryId, path: &HierarchyPath) -> Result<EntryRequest, DocGenError> {
        let record = self.tree.get(node)?;
        Ok(EntryRequest {
            key: record.key().to_string(),
            name: record.name().to_string(),
            template_storage_configuration: StoragePayload::from_storage(record.storage(), path)?,
        })
    }

    fn reconcile<'s>(
        &'s mut self,
        local: DirectoryId,
        remote: Option<&'s RemoteDirectory>,
    ) -> BoxFuture<'s, Result<(), DocGenError>> {
        async move {
            let path = self.tree.hierarchy_path(local)?;
            let request = self.entry_request(local, &path)?;

            let detail = match remote {
                Some(remote) => {
                    // The server still knows this directory under its old key.
                    let at = path.replace_leaf(remote.key())?;
                    debug!(path = %at, key = %request.key, "Updating template storage entry");
                    let detail = self
                        .transport
                        .update_entry(self.scope, &EntryLocator::Path(at.clone()), &request)
                        .await
                        .map_err(|e| DocGenError::sync("update", at.to_string(), e))?;
                    self.stats.updated += 1;
                    detail
                }
                None => {
                    let parent = self.tree.parent_hierarchy_path(local)?;
                    debug!(parent = %parent, key = %request.key, "Creating template storage entry");
                    let detail = self
                        .transport
                        .create_entry(self.scope, &EntryLocator::Path(parent), &request)
                        .await
                        .map_err(|e| DocGenError::sync("create", path.to_string(), e))?;
                    self.stats.created += 1;
                    detail
                }
            };
            self.tree.set_id(local, Some(detail.id))?;

            let local_children = self.tree.children(local)?.to_vec();
            let remote_by_id: HashMap<EntryId, &RemoteDirectory> = match remote {
                Some(remote) => self.delete_orphans(&path, &local_children, remote).await?,
                None => HashMap::new(),
            };

            for child in local_children {
                let matched = self
                    .tree
                    .get(child)?
                    .id()
                    .and_then(|id| remote_by_id.get(&id).copied());
                self.reconcile(child, matched).await?;
            }
            Ok(())
        }
        .boxed()
    }

    /// Delete server children of `remote` that are gone locally or whose key
    /// now belongs to another local directory. Returns the survivors by id.
    async fn delete_orphans<'r>(
        &mut self,
        path: &HierarchyPath,
        local_children: &[DirectoryId],
        remote: &'r RemoteDirectory,
    ) -> Result<HashMap<EntryId, &'r RemoteDirectory>, DocGenError> {
        let mut local_ids = HashSet::new();
        let mut local_key_owner: HashMap<String, Option<EntryId>> = HashMap::new();
        for child in local_children {
            let record = self.tree.get(*child)?;
            if let Some(id) = record.id() {
                local_ids.insert(id);
            }
            local_key_owner.insert(record.key().to_string(), record.id());
        }

        let mut survivors = HashMap::new();
        for remote_child in remote.children() {
            let gone = !local_ids.contains(&remote_child.id());
            let key_taken = local_key_owner
                .get(remote_child.key())
                .map(|owner| *owner != Some(remote_child.id()))
                .unwrap_or(false);

            if gone || key_taken {
                let at = path.add(remote_child.key())?;
                debug!(path = %at, id = %remote_child.id(), "Deleting template storage entry");
                self.transport
                    .delete_entry(
                        self.scope,
                        &EntryLocator::Id(remote_child.id()),
                        remote_child.storage_type(),
                    )
                    .await
                    .map_err(|e| DocGenError::sync("delete", at.to_string(), e))?;
                self.stats.deleted += 1;
            } else {
                survivors.insert(remote_child.id(), remote_child);
            }
        }
        Ok(survivors)
    }
}
