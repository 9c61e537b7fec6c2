//! Load-side merge of a server snapshot into the live tree.
//!
//! The server is authoritative: directories matched by key keep their handle
//! and are refreshed in place, unmatched server directories become new nodes,
//! and local directories the server does not know are freed.

use crate::directory::skeleton::RemoteDirectory;
use crate::directory::tree::{DirectoryId, DirectoryTree};
use crate::error::DocGenError;
use crate::hierarchy::HierarchyPath;
use crate::storage::TemplateStorage;
use crate::transport::contract::ConfigurationTransport;
use crate::types::ConfigurationScope;
use futures::future::{BoxFuture, FutureExt};
use tracing::{debug, warn};

pub(crate) struct Refresher<'a> {
    transport: &'a dyn ConfigurationTransport,
    scope: ConfigurationScope,
    tree: &'a mut DirectoryTree,
}

impl<'a> Refresher<'a> {
    pub(crate) fn new(
        transport: &'a dyn ConfigurationTransport,
        scope: ConfigurationScope,
        tree: &'a mut DirectoryTree,
    ) -> Self {
        Self {
            transport,
            scope,
            tree,
        }
    }

    /// Merge `remote` as the root. The current root is refreshed in place when
    /// it carries the same server id, otherwise it is replaced.
    pub(crate) async fn run(mut self, remote: Option<&RemoteDirectory>) -> Result<(), DocGenError> {
        let Some(remote) = remote else {
            if let Some(root) = self.tree.root() {
                debug!("Server has no root directory; dropping local tree");
                self.tree.remove(root)?;
            }
            return Ok(());
        };

        let current = match self.tree.root() {
            Some(root) if self.tree.get(root)?.id() == Some(remote.id()) => root,
            _ => {
                let root = self.tree.create("", remote.name(), TemplateStorage::Deprecated);
                self.tree.set_root(root)?;
                root
            }
        };

        self.refresh(current, remote, HierarchyPath::root()).await?;
        // The server may report a key for the root; it is always addressed as "".
        let record = self.tree.get(current)?;
        let (name, storage) = (record.name().to_string(), record.storage().clone());
        self.tree.overwrite(current, remote.id(), String::new(), name, storage)
    }

    fn refresh<'s>(
        &'s mut self,
        node: DirectoryId,
        remote: &'s RemoteDirectory,
        path: HierarchyPath,
    ) -> BoxFuture<'s, Result<(), DocGenError>> {
        async move {
            let (key, name, storage) = if remote.is_deprecated() {
                warn!(path = %path, id = %remote.id(), "Directory uses a deprecated storage type");
                (
                    remote.key().to_string(),
                    remote.name().to_string(),
                    TemplateStorage::Deprecated,
                )
            } else {
                let detail = self
                    .transport
                    .get_entry_detail(self.scope, remote.id(), remote.storage_type())
                    .await
                    .map_err(|e| DocGenError::sync("load", path.to_string(), e))?;
                (detail.key, detail.name, detail.storage)
            };
            self.tree.overwrite(node, remote.id(), key, name, storage)?;

            let mut existing = self.tree.children(node)?.to_vec();
            let mut merged = Vec::with_capacity(remote.children().len());
            for remote_child in remote.children() {
                let position = existing.iter().position(|c| {
                    self.tree
                        .get(*c)
                        .map(|d| d.key() == remote_child.key())
                        .unwrap_or(false)
                });
                let child = match position {
                    Some(index) => existing.remove(index),
                    None => self.tree.create(
                        remote_child.key(),
                        remote_child.name(),
                        TemplateStorage::Deprecated,
                    ),
                };
                merged.push(child);
            }
            self.tree.replace_children(node, merged.clone())?;

            for (child, remote_child) in merged.into_iter().zip(remote.children()) {
                let child_path = path.add(remote_child.key())?;
                self.refresh(child, remote_child, child_path).await?;
            }
            Ok(())
        }
        .boxed()
    }
}
