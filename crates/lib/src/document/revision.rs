//! Immutable document revisions.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use super::id::{DocumentId, Version};
use crate::patch::{PatchOperation, Pointer};

/// Hex SHA-256 of a revision's compact JSON serialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Etag(String);

impl Etag {
    pub fn of(content: &Value) -> Self {
        let digest = Sha256::digest(content.to_string().as_bytes());
        Self(hex::encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Etag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One immutable version of a document.
///
/// Revisions are only built through [`Revision::initial`],
/// [`Revision::successor`] and [`Revision::tombstone`], which keep the
/// version chain and etag consistent with the content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revision {
    document_id: DocumentId,
    version: Version,
    content: Value,
    etag: Etag,
    created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    previous_version: Option<Version>,
    #[serde(default)]
    deleted: bool,
    /// Operations turning the previous content into this one.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    forward_patch: Vec<PatchOperation>,
    /// Operations turning this content back into the previous one.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    backward_patch: Vec<PatchOperation>,
}

impl Revision {
    /// Version 0 of a new document.
    pub fn initial(document_id: DocumentId, content: Value, created_at: String) -> Self {
        Self {
            document_id,
            version: 0,
            etag: Etag::of(&content),
            content,
            created_at,
            previous_version: None,
            deleted: false,
            forward_patch: Vec::new(),
            backward_patch: Vec::new(),
        }
    }

    /// The revision following `previous`.
    pub fn successor(
        previous: &Revision,
        content: Value,
        forward_patch: Vec<PatchOperation>,
        backward_patch: Vec<PatchOperation>,
        created_at: String,
    ) -> Self {
        Self {
            document_id: previous.document_id.clone(),
            version: previous.version + 1,
            etag: Etag::of(&content),
            content,
            created_at,
            previous_version: Some(previous.version),
            deleted: false,
            forward_patch,
            backward_patch,
        }
    }

    /// A deletion marker following `previous`. Content becomes `null`.
    pub fn tombstone(previous: &Revision, created_at: String) -> Self {
        let mut revision = Self::successor(
            previous,
            Value::Null,
            vec![PatchOperation::replace(Pointer::root(), Value::Null)],
            vec![PatchOperation::replace(
                Pointer::root(),
                previous.content.clone(),
            )],
            created_at,
        );
        revision.deleted = true;
        revision
    }

    pub fn document_id(&self) -> &DocumentId {
        &self.document_id
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn content(&self) -> &Value {
        &self.content
    }

    pub fn etag(&self) -> &Etag {
        &self.etag
    }

    /// RFC 3339 creation timestamp.
    pub fn created_at(&self) -> &str {
        &self.created_at
    }

    pub fn previous_version(&self) -> Option<Version> {
        self.previous_version
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn forward_patch(&self) -> &[PatchOperation] {
        &self.forward_patch
    }

    pub fn backward_patch(&self) -> &[PatchOperation] {
        &self.backward_patch
    }

    /// Whether the stored etag still matches the content.
    pub fn verify_etag(&self) -> bool {
        Etag::of(&self.content) == self.etag
    }
}
