//! Live template storage directory tree
//!
//! Directories live in an arena owned by the configuration and are addressed
//! by `DirectoryId` handles. Parent links are handles too, so the tree has a
//! single owner and no reference cycles. Freed slots are never reused; a
//! handle to a removed directory stays stale forever.

use crate::error::DocGenError;
use crate::hierarchy::{HierarchyPath, SEPARATOR};
use crate::storage::{TemplateStorage, TemplateStorageType};
use crate::types::EntryId;
use std::fmt;

/// Handle of one directory in a `DirectoryTree`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DirectoryId(usize);

impl fmt::Display for DirectoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dir#{}", self.0)
    }
}

/// One template storage directory.
#[derive(Debug, Clone)]
pub struct TemplateStorageDirectory {
    id: Option<EntryId>,
    key: String,
    name: String,
    storage: TemplateStorage,
    children: Vec<DirectoryId>,
    parent: Option<DirectoryId>,
}

impl TemplateStorageDirectory {
    /// Server id; `None` until the directory has been saved.
    pub fn id(&self) -> Option<EntryId> {
        self.id
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn storage(&self) -> &TemplateStorage {
        &self.storage
    }

    pub fn storage_type(&self) -> TemplateStorageType {
        self.storage.storage_type()
    }

    pub fn is_deprecated(&self) -> bool {
        self.storage.is_deprecated()
    }

    pub fn children(&self) -> &[DirectoryId] {
        &self.children
    }

    pub fn parent(&self) -> Option<DirectoryId> {
        self.parent
    }
}

/// Arena of directories plus the configuration's root handle.
#[derive(Debug, Clone, Default)]
pub struct DirectoryTree {
    slots: Vec<Option<TemplateStorageDirectory>>,
    root: Option<DirectoryId>,
}

pub(crate) fn validate_child_key(key: &str) -> Result<(), DocGenError> {
    if key.is_empty() {
        return Err(DocGenError::InvalidConfiguration(
            "directory key cannot be empty".to_string(),
        ));
    }
    if key.contains(SEPARATOR) || key.contains('/') {
        return Err(DocGenError::InvalidConfiguration(format!(
            "directory key '{}' contains a path separator",
            key
        )));
    }
    Ok(())
}

impl DirectoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live directories, attached or not.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Create a detached directory. It becomes part of the configuration once
    /// attached with `add_child` or `set_root`.
    pub fn create(
        &mut self,
        key: impl Into<String>,
        name: impl Into<String>,
        storage: TemplateStorage,
    ) -> DirectoryId {
        let id = DirectoryId(self.slots.len());
        self.slots.push(Some(TemplateStorageDirectory {
            id: None,
            key: key.into(),
            name: name.into(),
            storage,
            children: Vec::new(),
            parent: None,
        }));
        id
    }

    pub fn contains(&self, node: DirectoryId) -> bool {
        matches!(self.slots.get(node.0), Some(Some(_)))
    }

    pub fn get(&self, node: DirectoryId) -> Result<&TemplateStorageDirectory, DocGenError> {
        self.slots
            .get(node.0)
            .and_then(Option::as_ref)
            .ok_or_else(|| DocGenError::UnknownDirectory(node.to_string()))
    }

    fn get_mut(&mut self, node: DirectoryId) -> Result<&mut TemplateStorageDirectory, DocGenError> {
        self.slots
            .get_mut(node.0)
            .and_then(Option::as_mut)
            .ok_or_else(|| DocGenError::UnknownDirectory(node.to_string()))
    }

    pub fn root(&self) -> Option<DirectoryId> {
        self.root
    }

    /// Make a detached directory the root. Its key becomes `""`; any previous
    /// root subtree is freed.
    pub fn set_root(&mut self, node: DirectoryId) -> Result<(), DocGenError> {
        let record = self.get(node)?;
        if record.parent.is_some() {
            return Err(DocGenError::InvalidConfiguration(format!(
                "directory '{}' is attached to a parent and cannot become the root",
                record.key
            )));
        }
        if let Some(previous) = self.root {
            if previous != node {
                self.free_subtree(previous);
            }
        }
        self.get_mut(node)?.key = String::new();
        self.root = Some(node);
        Ok(())
    }

    pub fn children(&self, node: DirectoryId) -> Result<&[DirectoryId], DocGenError> {
        Ok(&self.get(node)?.children)
    }

    pub fn parent(&self, node: DirectoryId) -> Result<Option<DirectoryId>, DocGenError> {
        Ok(self.get(node)?.parent)
    }

    /// Child of `parent` with the given key.
    pub fn child_by_key(
        &self,
        parent: DirectoryId,
        key: &str,
    ) -> Result<Option<DirectoryId>, DocGenError> {
        let children = self.children(parent)?;
        Ok(children
            .iter()
            .copied()
            .find(|c| self.get(*c).map(|d| d.key == key).unwrap_or(false)))
    }

    fn is_ancestor_or_self(&self, candidate: DirectoryId, node: DirectoryId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == candidate {
                return true;
            }
            current = self.slots.get(n.0).and_then(Option::as_ref).and_then(|d| d.parent);
        }
        false
    }

    /// Attach `child` under `parent`, detaching it from any previous parent.
    ///
    /// Fails with `DuplicateKey` when a sibling already uses the child's key;
    /// the tree is left unchanged on every error.
    pub fn add_child(
        &mut self,
        parent: DirectoryId,
        child: DirectoryId,
    ) -> Result<DirectoryId, DocGenError> {
        self.get(parent)?;
        let key = self.get(child)?.key.clone();
        validate_child_key(&key)?;
        if Some(child) == self.root || self.is_ancestor_or_self(child, parent) {
            return Err(DocGenError::InvalidConfiguration(format!(
                "directory '{}' cannot be attached below itself",
                key
            )));
        }
        if let Some(existing) = self.child_by_key(parent, &key)? {
            if existing != child {
                return Err(DocGenError::DuplicateKey {
                    key,
                    parent: self.hierarchy_path(parent)?.to_string(),
                });
            }
            return Ok(child);
        }

        self.detach(child)?;
        self.get_mut(parent)?.children.push(child);
        self.get_mut(child)?.parent = Some(parent);
        Ok(child)
    }

    /// Create a directory and attach it under `parent`.
    pub fn add_new_child(
        &mut self,
        parent: DirectoryId,
        key: impl Into<String>,
        name: impl Into<String>,
        storage: TemplateStorage,
    ) -> Result<DirectoryId, DocGenError> {
        let child = self.create(key, name, storage);
        match self.add_child(parent, child) {
            Ok(child) => Ok(child),
            Err(e) => {
                self.slots[child.0] = None;
                Err(e)
            }
        }
    }

    /// Move `node` under `new_parent`. Same checks as `add_child`.
    pub fn move_to(&mut self, node: DirectoryId, new_parent: DirectoryId) -> Result<(), DocGenError> {
        self.add_child(new_parent, node).map(|_| ())
    }

    pub fn rename(&mut self, node: DirectoryId, key: impl Into<String>) -> Result<(), DocGenError> {
        let key = key.into();
        if Some(node) == self.root {
            if key.is_empty() {
                return Ok(());
            }
            return Err(DocGenError::InvalidConfiguration(
                "the root directory key cannot be changed".to_string(),
            ));
        }
        validate_child_key(&key)?;
        if let Some(parent) = self.get(node)?.parent {
            if let Some(existing) = self.child_by_key(parent, &key)? {
                if existing != node {
                    return Err(DocGenError::DuplicateKey {
                        key,
                        parent: self.hierarchy_path(parent)?.to_string(),
                    });
                }
            }
        }
        self.get_mut(node)?.key = key;
        Ok(())
    }

    pub fn set_name(&mut self, node: DirectoryId, name: impl Into<String>) -> Result<(), DocGenError> {
        self.get_mut(node)?.name = name.into();
        Ok(())
    }

    pub fn set_storage_configuration(
        &mut self,
        node: DirectoryId,
        storage: Option<TemplateStorage>,
    ) -> Result<(), DocGenError> {
        let storage = storage.ok_or_else(|| {
            DocGenError::InvalidConfiguration(
                "template storage configuration is required".to_string(),
            )
        })?;
        self.get_mut(node)?.storage = storage;
        Ok(())
    }

    /// Detach `node` and free it together with all its descendants.
    pub fn remove(&mut self, node: DirectoryId) -> Result<(), DocGenError> {
        self.detach(node)?;
        if self.root == Some(node) {
            self.root = None;
        }
        self.free_subtree(node);
        Ok(())
    }

    fn detach(&mut self, node: DirectoryId) -> Result<(), DocGenError> {
        if let Some(parent) = self.get_mut(node)?.parent.take() {
            self.get_mut(parent)?.children.retain(|c| *c != node);
        }
        Ok(())
    }

    fn free_subtree(&mut self, node: DirectoryId) {
        let mut pending = vec![node];
        while let Some(n) = pending.pop() {
            if let Some(record) = self.slots.get_mut(n.0).and_then(Option::take) {
                pending.extend(record.children);
            }
        }
    }

    /// Keys from the topmost ancestor down to `node`. For attached directories
    /// this is an absolute path starting at the root marker.
    pub fn hierarchy_path(&self, node: DirectoryId) -> Result<HierarchyPath, DocGenError> {
        let mut keys = Vec::new();
        let mut current = Some(node);
        while let Some(n) = current {
            let record = self.get(n)?;
            keys.push(record.key.clone());
            current = record.parent;
        }
        keys.reverse();
        HierarchyPath::from_segments(keys)
    }

    /// Path of the parent; the empty path for the root or a detached node.
    pub fn parent_hierarchy_path(&self, node: DirectoryId) -> Result<HierarchyPath, DocGenError> {
        match self.get(node)?.parent {
            Some(parent) => self.hierarchy_path(parent),
            None => Ok(HierarchyPath::empty()),
        }
    }

    /// Resolve `path` from the root: the first segment must match the root key
    /// and each further segment a child key.
    pub fn find_directory_by_path(
        &self,
        path: &HierarchyPath,
    ) -> Result<Option<DirectoryId>, DocGenError> {
        if path.is_empty() {
            return Err(DocGenError::InvalidPath(
                "cannot look up an empty path".to_string(),
            ));
        }
        match self.root {
            Some(root) => self.find_below(root, path.segments()),
            None => Ok(None),
        }
    }

    fn find_below(
        &self,
        node: DirectoryId,
        segments: &[String],
    ) -> Result<Option<DirectoryId>, DocGenError> {
        let Some((head, tail)) = segments.split_first() else {
            return Ok(None);
        };
        let record = self.get(node)?;
        if record.key != *head {
            return Ok(None);
        }
        if tail.is_empty() {
            return Ok(Some(node));
        }
        for child in &record.children {
            if let Some(found) = self.find_below(*child, tail)? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    /// `node` and all its descendants, parents before children.
    pub fn descendants(&self, node: DirectoryId) -> Result<Vec<DirectoryId>, DocGenError> {
        let mut out = Vec::new();
        let mut pending = vec![node];
        while let Some(n) = pending.pop() {
            let record = self.get(n)?;
            out.push(n);
            pending.extend(record.children.iter().rev().copied());
        }
        Ok(out)
    }

    pub(crate) fn set_id(&mut self, node: DirectoryId, id: Option<EntryId>) -> Result<(), DocGenError> {
        self.get_mut(node)?.id = id;
        Ok(())
    }

    /// Overwrite identity and contents with server state, bypassing sibling
    /// checks.
    pub(crate) fn overwrite(
        &mut self,
        node: DirectoryId,
        id: EntryId,
        key: String,
        name: String,
        storage: TemplateStorage,
    ) -> Result<(), DocGenError> {
        let record = self.get_mut(node)?;
        record.id = Some(id);
        record.key = key;
        record.name = name;
        record.storage = storage;
        Ok(())
    }

    /// Replace the child list of `node`. Previous children not in `children`
    /// are freed; new ones are detached from wherever they were.
    pub(crate) fn replace_children(
        &mut self,
        node: DirectoryId,
        children: Vec<DirectoryId>,
    ) -> Result<(), DocGenError> {
        let previous = std::mem::take(&mut self.get_mut(node)?.children);
        for old in previous {
            if !children.contains(&old) {
                self.free_subtree(old);
            }
        }
        for child in &children {
            let record = self.get_mut(*child)?;
            let prior = record.parent.replace(node);
            if let Some(prior) = prior.filter(|p| *p != node) {
                self.get_mut(prior)?.children.retain(|c| c != child);
            }
        }
        self.get_mut(node)?.children = children;
        Ok(())
    }
}
