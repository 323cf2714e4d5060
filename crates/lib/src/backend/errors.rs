//! Backend error types.
//!
//! Everything except [`BackendError::RevisionExists`] means the underlying
//! persistence failed and surfaces as a store-unavailable condition.

use thiserror::Error;

use crate::document::{DocumentId, Version};

/// Errors raised by storage backends.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum BackendError {
    /// A revision with this `(document, version)` is already stored.
    #[error("Revision {version} of document {document_id} already exists")]
    RevisionExists {
        document_id: DocumentId,
        version: Version,
    },

    /// Serialization failed.
    #[error("Serialization failed")]
    SerializationFailed {
        #[source]
        source: serde_json::Error,
    },

    /// Deserialization of stored data failed.
    #[error("Deserialization failed: {context}")]
    DeserializationFailed {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// File I/O error.
    #[error("File I/O error: {context}")]
    FileIo {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// SQL database error.
    #[cfg(feature = "sqlite")]
    #[error("SQL error: {reason}")]
    SqlxError {
        reason: String,
        #[source]
        source: Option<sqlx::Error>,
    },
}

impl BackendError {
    /// Check if this error means the revision is already stored.
    pub fn is_revision_exists(&self) -> bool {
        matches!(self, BackendError::RevisionExists { .. })
    }

    /// Check if the underlying persistence is failing.
    pub fn is_unavailable(&self) -> bool {
        !self.is_revision_exists()
    }

    /// Check if this error is I/O related.
    pub fn is_io_error(&self) -> bool {
        matches!(self, BackendError::FileIo { .. })
    }

    /// Check if this error is serialization related.
    pub fn is_serialization_error(&self) -> bool {
        matches!(
            self,
            BackendError::SerializationFailed { .. } | BackendError::DeserializationFailed { .. }
        )
    }
}

impl From<BackendError> for crate::Error {
    fn from(err: BackendError) -> Self {
        crate::Error::Backend(err)
    }
}
