//! Document store errors

use thiserror::Error;

use crate::document::{DocumentId, Version};

/// Errors raised by [`DocumentStore`](super::DocumentStore).
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No revision of the document exists.
    #[error("Document not found: {document_id}")]
    DocumentNotFound { document_id: DocumentId },

    /// The document exists but this version is absent or was pruned.
    #[error("Revision {version} of document {document_id} not found")]
    RevisionNotFound {
        document_id: DocumentId,
        version: Version,
    },

    /// The latest revision is a tombstone.
    #[error("Document {document_id} was deleted at version {version}")]
    DocumentDeleted {
        document_id: DocumentId,
        version: Version,
    },

    /// Creation was requested for a document that already exists.
    #[error("Document {document_id} already exists at version {current_version}")]
    AlreadyExists {
        document_id: DocumentId,
        current_version: Version,
    },

    /// A revision was not the direct successor of the latest one.
    #[error("Revision {actual} of document {document_id} is not the expected version {expected}")]
    VersionGap {
        document_id: DocumentId,
        /// Version the next revision must have
        expected: Version,
        actual: Version,
    },
}

impl StoreError {
    /// Check if this error indicates a document or revision was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::DocumentNotFound { .. }
                | StoreError::RevisionNotFound { .. }
                | StoreError::DocumentDeleted { .. }
        )
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self, StoreError::DocumentDeleted { .. })
    }

    /// Check if this error reflects a concurrent or out-of-order write.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            StoreError::AlreadyExists { .. } | StoreError::VersionGap { .. }
        )
    }

    /// The document's current version, when the error knows it.
    pub fn current_version(&self) -> Option<Version> {
        match self {
            StoreError::AlreadyExists {
                current_version, ..
            } => Some(*current_version),
            StoreError::DocumentDeleted { version, .. } => Some(*version),
            StoreError::VersionGap { expected, .. } => expected.checked_sub(1),
            _ => None,
        }
    }
}

impl From<StoreError> for crate::Error {
    fn from(err: StoreError) -> Self {
        crate::Error::Store(err)
    }
}
