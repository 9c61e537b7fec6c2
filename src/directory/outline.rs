//! Declarative directory outlines
//!
//! A serializable description of a directory subtree, used by the CLI to
//! export the live tree to a file and to apply an edited file back onto it.

use crate::directory::tree::{validate_child_key, DirectoryId, DirectoryTree};
use crate::error::DocGenError;
use crate::storage::TemplateStorage;
use crate::types::EntryId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryOutline {
    /// Ignored for the root
    #[serde(default)]
    pub key: String,
    pub name: String,
    /// Informational; applying an outline never changes ids
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntryId>,
    pub storage: TemplateStorage,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DirectoryOutline>,
}

impl DirectoryOutline {
    /// Describe the subtree rooted at `node`.
    pub fn capture(tree: &DirectoryTree, node: DirectoryId) -> Result<Self, DocGenError> {
        let record = tree.get(node)?;
        let children = record
            .children()
            .iter()
            .map(|c| Self::capture(tree, *c))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            key: record.key().to_string(),
            name: record.name().to_string(),
            id: record.id(),
            storage: record.storage().clone(),
            children,
        })
    }

    /// Check keys below this outline: non-empty, separator-free, unique
    /// among siblings.
    pub fn validate(&self) -> Result<(), DocGenError> {
        let mut seen = HashSet::new();
        for child in &self.children {
            validate_child_key(&child.key)?;
            if !seen.insert(child.key.as_str()) {
                return Err(DocGenError::DuplicateKey {
                    key: child.key.clone(),
                    parent: self.key.clone(),
                });
            }
            child.validate()?;
        }
        Ok(())
    }

    /// Make the tree's root match this outline.
    ///
    /// Existing directories are matched by key and keep their handle and
    /// server id, so a following save updates them rather than recreating
    /// them. Directories missing from the outline are removed.
    pub fn apply(&self, tree: &mut DirectoryTree) -> Result<DirectoryId, DocGenError> {
        self.validate()?;
        let root = match tree.root() {
            Some(root) => root,
            None => {
                let root = tree.create("", self.name.clone(), self.storage.clone());
                tree.set_root(root)?;
                root
            }
        };
        self.apply_to(tree, root)?;
        Ok(root)
    }

    fn apply_to(&self, tree: &mut DirectoryTree, node: DirectoryId) -> Result<(), DocGenError> {
        tree.set_name(node, self.name.clone())?;
        tree.set_storage_configuration(node, Some(self.storage.clone()))?;

        let mut children = Vec::with_capacity(self.children.len());
        for outline in &self.children {
            let child = match tree.child_by_key(node, &outline.key)? {
                Some(existing) => existing,
                None => tree.create(outline.key.clone(), outline.name.clone(), outline.storage.clone()),
            };
            children.push(child);
        }
        tree.replace_children(node, children.clone())?;

        for (child, outline) in children.into_iter().zip(&self.children) {
            outline.apply_to(tree, child)?;
        }
        Ok(())
    }
}
