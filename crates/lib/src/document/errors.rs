//! Document model errors

use thiserror::Error;

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    /// The identifier is not acceptable as a document ID.
    #[error("Invalid document ID {id:?}: {reason}")]
    InvalidId { id: String, reason: String },
}

impl DocumentError {
    pub fn is_invalid_id(&self) -> bool {
        matches!(self, DocumentError::InvalidId { .. })
    }
}

impl From<DocumentError> for crate::Error {
    fn from(err: DocumentError) -> Self {
        crate::Error::Document(err)
    }
}
