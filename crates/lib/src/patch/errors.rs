//! Patch engine errors
//!
//! Every error raised while applying a patch names the zero-based index of
//! the failing operation and the pointer it was resolving.

use thiserror::Error;

use super::pointer::Pointer;

/// Errors that can occur while parsing, validating or applying patches.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PatchError {
    /// A `path` or `from` pointer does not resolve in the working tree.
    #[error("Operation {index}: path not found: {path}")]
    PathNotFound {
        /// Index of the failing operation in its patch set
        index: usize,
        /// The pointer that failed to resolve
        path: Pointer,
    },

    /// The operation hit a value of the wrong kind.
    #[error("Operation {index}: type mismatch at {path}: {reason}")]
    TypeMismatch {
        /// Index of the failing operation in its patch set
        index: usize,
        /// The pointer being resolved
        path: Pointer,
        /// What was expected and what was found
        reason: String,
    },

    /// A `test` operation found a different value.
    #[error("Operation {index}: test failed at {path}")]
    TestFailed {
        /// Index of the failing operation in its patch set
        index: usize,
        /// The tested pointer
        path: Pointer,
    },

    /// A pointer string is not valid RFC 6901.
    #[error("Invalid JSON pointer {pointer:?}: {reason}")]
    InvalidPointer { pointer: String, reason: String },
}

impl PatchError {
    pub fn is_path_not_found(&self) -> bool {
        matches!(self, PatchError::PathNotFound { .. })
    }

    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, PatchError::TypeMismatch { .. })
    }

    pub fn is_test_failed(&self) -> bool {
        matches!(self, PatchError::TestFailed { .. })
    }

    pub fn is_invalid_pointer(&self) -> bool {
        matches!(self, PatchError::InvalidPointer { .. })
    }

    /// Index of the operation that failed, if the error came from one.
    pub fn operation_index(&self) -> Option<usize> {
        match self {
            PatchError::PathNotFound { index, .. }
            | PatchError::TypeMismatch { index, .. }
            | PatchError::TestFailed { index, .. } => Some(*index),
            PatchError::InvalidPointer { .. } => None,
        }
    }

    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            PatchError::PathNotFound { .. } => "path_not_found",
            PatchError::TypeMismatch { .. } => "type_mismatch",
            PatchError::TestFailed { .. } => "test_failed",
            PatchError::InvalidPointer { .. } => "invalid_pointer",
        }
    }
}

impl From<PatchError> for crate::Error {
    fn from(err: PatchError) -> Self {
        crate::Error::Patch(err)
    }
}
