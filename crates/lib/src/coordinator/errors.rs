//! Version coordinator errors

use thiserror::Error;

use crate::document::{DocumentId, Version};

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinatorError {
    /// The mutation was based on a version that is no longer current.
    ///
    /// `expected` is `None` when the caller asked to create a document that
    /// already exists.
    #[error(
        "Version conflict on document {document_id}: based on {}, current version is {current_version}",
        .expected.map_or_else(|| "no version".to_string(), |v| format!("version {v}"))
    )]
    Conflict {
        document_id: DocumentId,
        expected: Option<Version>,
        current_version: Version,
    },

    /// The lease expired or was already resolved; nothing was committed.
    #[error("Lease on document {document_id} is no longer held")]
    LeaseExpired { document_id: DocumentId },

    /// The lease cannot be used for this call.
    #[error("Invalid lease for document {document_id}: {reason}")]
    InvalidLease {
        document_id: DocumentId,
        reason: String,
    },
}

impl CoordinatorError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, CoordinatorError::Conflict { .. })
    }

    pub fn is_lease_expired(&self) -> bool {
        matches!(self, CoordinatorError::LeaseExpired { .. })
    }

    pub fn is_invalid_lease(&self) -> bool {
        matches!(self, CoordinatorError::InvalidLease { .. })
    }

    /// The current version carried by a conflict.
    pub fn current_version(&self) -> Option<Version> {
        match self {
            CoordinatorError::Conflict {
                current_version, ..
            } => Some(*current_version),
            _ => None,
        }
    }
}

impl From<CoordinatorError> for crate::Error {
    fn from(err: CoordinatorError) -> Self {
        crate::Error::Coordinator(err)
    }
}
