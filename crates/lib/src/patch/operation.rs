//! Patch operations and patch sets.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::diff::{DiffOptions, diff_with};
use super::pointer::Pointer;
use crate::document::Version;

/// One RFC 6902 operation.
///
/// Serialized in the standard wire form, e.g.
/// `{"op":"move","from":"/a","path":"/b"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOperation {
    Add { path: Pointer, value: Value },
    Remove { path: Pointer },
    Replace { path: Pointer, value: Value },
    Move { from: Pointer, path: Pointer },
    Copy { from: Pointer, path: Pointer },
    Test { path: Pointer, value: Value },
}

impl PatchOperation {
    pub fn add(path: Pointer, value: Value) -> Self {
        PatchOperation::Add { path, value }
    }

    pub fn remove(path: Pointer) -> Self {
        PatchOperation::Remove { path }
    }

    pub fn replace(path: Pointer, value: Value) -> Self {
        PatchOperation::Replace { path, value }
    }

    pub fn move_from(from: Pointer, path: Pointer) -> Self {
        PatchOperation::Move { from, path }
    }

    pub fn copy_from(from: Pointer, path: Pointer) -> Self {
        PatchOperation::Copy { from, path }
    }

    pub fn test(path: Pointer, value: Value) -> Self {
        PatchOperation::Test { path, value }
    }

    /// The target pointer of the operation.
    pub fn path(&self) -> &Pointer {
        match self {
            PatchOperation::Add { path, .. }
            | PatchOperation::Remove { path }
            | PatchOperation::Replace { path, .. }
            | PatchOperation::Move { path, .. }
            | PatchOperation::Copy { path, .. }
            | PatchOperation::Test { path, .. } => path,
        }
    }

    /// The source pointer of `move` and `copy`.
    pub fn from(&self) -> Option<&Pointer> {
        match self {
            PatchOperation::Move { from, .. } | PatchOperation::Copy { from, .. } => Some(from),
            _ => None,
        }
    }

    /// The operation name as it appears on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            PatchOperation::Add { .. } => "add",
            PatchOperation::Remove { .. } => "remove",
            PatchOperation::Replace { .. } => "replace",
            PatchOperation::Move { .. } => "move",
            PatchOperation::Copy { .. } => "copy",
            PatchOperation::Test { .. } => "test",
        }
    }
}

/// An ordered list of operations bound to the version it was computed against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchSet {
    pub base_version: Version,
    pub operations: Vec<PatchOperation>,
}

impl PatchSet {
    pub fn new(base_version: Version, operations: Vec<PatchOperation>) -> Self {
        Self {
            base_version,
            operations,
        }
    }

    /// Diff `old` against `new` with default options.
    pub fn from_diff(base_version: Version, old: &Value, new: &Value) -> Self {
        Self::from_diff_with(base_version, old, new, &DiffOptions::default())
    }

    pub fn from_diff_with(
        base_version: Version,
        old: &Value,
        new: &Value,
        options: &DiffOptions,
    ) -> Self {
        Self::new(base_version, diff_with(old, new, options))
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PatchOperation> {
        self.operations.iter()
    }
}

impl<'a> IntoIterator for &'a PatchSet {
    type Item = &'a PatchOperation;
    type IntoIter = std::slice::Iter<'a, PatchOperation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.iter()
    }
}
