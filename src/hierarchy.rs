//! Hierarchy paths
//!
//! A hierarchy path addresses one template storage directory by the chain of
//! keys from the root. Absolute paths start with the empty root segment; the
//! canonical string form is `\`-separated with a leading and trailing separator.

use crate::error::DocGenError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub const SEPARATOR: char = '\\';

/// Ordered list of key segments. Only the first segment may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct HierarchyPath {
    segments: Vec<String>,
}

impl HierarchyPath {
    /// The empty path. Addresses nothing; the parent path of the root.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The root path `\`.
    pub fn root() -> Self {
        Self {
            segments: vec![String::new()],
        }
    }

    /// Build a path from segments as given.
    ///
    /// A leading empty segment makes the path absolute; lists without one are
    /// relative (as produced by [`HierarchyPath::tail`]).
    pub fn from_segments<I, S>(segments: I) -> Result<Self, DocGenError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if let Some(index) = segments.iter().skip(1).position(|s| s.is_empty()) {
            return Err(DocGenError::InvalidPath(format!(
                "segment {} of {:?} is empty",
                index + 1,
                segments
            )));
        }
        Ok(Self { segments })
    }

    /// Parse a separator-delimited string into an absolute path.
    ///
    /// Both `\` and `/` are accepted as separators.
    pub fn parse(path: &str) -> Result<Self, DocGenError> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return Ok(Self::empty());
        }

        let is_separator = |c: char| c == SEPARATOR || c == '/';
        let mut segments = vec![String::new()];
        let rest = trimmed.strip_prefix(is_separator).unwrap_or(trimmed);
        if rest.is_empty() {
            return Ok(Self { segments });
        }
        let without_root = rest.strip_suffix(is_separator).unwrap_or(rest);

        for segment in without_root.split(is_separator) {
            if segment.is_empty() {
                return Err(DocGenError::InvalidPath(format!(
                    "'{}' contains an empty segment",
                    path
                )));
            }
            segments.push(segment.to_string());
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// First segment.
    pub fn head(&self) -> Result<&str, DocGenError> {
        self.segments
            .first()
            .map(String::as_str)
            .ok_or_else(|| DocGenError::InvalidPath("head of an empty path".to_string()))
    }

    /// Path without its first segment.
    pub fn tail(&self) -> Result<HierarchyPath, DocGenError> {
        if self.segments.is_empty() {
            return Err(DocGenError::InvalidPath("tail of an empty path".to_string()));
        }
        Ok(Self {
            segments: self.segments[1..].to_vec(),
        })
    }

    /// New path with `segment` appended.
    pub fn add(&self, segment: impl Into<String>) -> Result<HierarchyPath, DocGenError> {
        let segment = checked_segment(segment.into())?;
        let mut segments = self.segments.clone();
        segments.push(segment);
        Ok(Self { segments })
    }

    /// New path with the last segment swapped for `leaf`.
    pub fn replace_leaf(&self, leaf: impl Into<String>) -> Result<HierarchyPath, DocGenError> {
        let Some((_, parent)) = self.segments.split_last() else {
            return Err(DocGenError::InvalidPath(
                "cannot replace the leaf of an empty path".to_string(),
            ));
        };
        let leaf = checked_segment(leaf.into())?;
        let mut segments = parent.to_vec();
        segments.push(leaf);
        Ok(Self { segments })
    }

    /// Path without its last segment; the parent of the root is the empty path.
    pub fn parent(&self) -> HierarchyPath {
        let mut segments = self.segments.clone();
        segments.pop();
        Self { segments }
    }
}

/// Appended segments must be non-empty and separator-free.
fn checked_segment(segment: String) -> Result<String, DocGenError> {
    if segment.is_empty() {
        return Err(DocGenError::InvalidPath("empty segment".to_string()));
    }
    if segment.contains(|c: char| c == SEPARATOR || c == '/') {
        return Err(DocGenError::InvalidPath(format!(
            "segment '{}' contains a separator",
            segment
        )));
    }
    Ok(segment)
}

impl fmt::Display for HierarchyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return Ok(());
        }
        let sep = SEPARATOR.to_string();
        write!(f, "{}{}", self.segments.join(&sep), SEPARATOR)
    }
}

impl FromStr for HierarchyPath {
    type Err = DocGenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for HierarchyPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for HierarchyPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
