//!
//! Dossier: a versioned JSON document service.
//! This library provides the storage, patching and concurrency core behind the `dossier` server.
//!
//! ## Core Concepts
//!
//! Dossier is built around several key concepts:
//!
//! * **Revisions (`document::Revision`)**: One immutable version of a document: its content, a content etag, and the forward and backward patches linking it to its predecessor. Deletion appends a tombstone revision.
//! * **Patches (`patch`)**: RFC 6902 operations addressed by RFC 6901 pointers, with `diff`, `apply` and `validate`. Applying is all-or-nothing.
//! * **Backends (`backend::Backend`)**: A pluggable storage layer for revisions (in-memory with JSON snapshots, or SQLite).
//! * **Store (`store::DocumentStore`)**: The append-only revision history over a backend, with retention pruning.
//! * **Coordinator (`coordinator::VersionCoordinator`)**: Per-document exclusive leases and optimistic base-version checks, so that concurrent writers never lose updates.
//! * **Service (`service::DocumentService`)**: Request-level operations and their HTTP binding (`service::http`).

pub mod backend;
pub mod clock;
pub mod config;
pub mod constants;
pub mod coordinator;
pub mod document;
pub mod patch;
pub mod service;
pub mod store;

#[cfg(any(test, feature = "testing"))]
pub use clock::FixedClock;
pub use clock::{Clock, SystemClock};
pub use config::{EngineConfig, RetentionPolicy};
pub use coordinator::{LeaseToken, Mutation, VersionCoordinator};
pub use document::{DocumentId, Etag, Revision, Version};
pub use patch::{PatchOperation, PatchSet, Pointer};
pub use service::DocumentService;
pub use store::DocumentStore;

/// Result type used throughout the Dossier library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Dossier library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Structured patch errors from the patch module
    #[error(transparent)]
    Patch(patch::PatchError),

    /// Structured document model errors from the document module
    #[error(transparent)]
    Document(document::DocumentError),

    /// Structured storage errors from the backend module
    #[error(transparent)]
    Backend(backend::BackendError),

    /// Structured store errors from the store module
    #[error(transparent)]
    Store(store::StoreError),

    /// Structured lease and version errors from the coordinator module
    #[error(transparent)]
    Coordinator(coordinator::CoordinatorError),

    /// Structured request errors from the service module
    #[error(transparent)]
    Service(service::ServiceError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Patch(_) => "patch",
            Error::Document(_) => "document",
            Error::Backend(_) => "backend",
            Error::Store(_) => "store",
            Error::Coordinator(_) => "coordinator",
            Error::Service(_) => "service",
        }
    }

    /// Check if this error indicates a document or revision was not found.
    ///
    /// Includes reads and writes against a deleted document.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Store(store_err) => store_err.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error indicates a version conflict.
    pub fn is_conflict(&self) -> bool {
        match self {
            Error::Coordinator(coordinator_err) => coordinator_err.is_conflict(),
            Error::Store(store_err) => store_err.is_conflict(),
            Error::Backend(backend_err) => backend_err.is_revision_exists(),
            _ => false,
        }
    }

    /// The document's current version, when the error carries it.
    pub fn current_version(&self) -> Option<Version> {
        match self {
            Error::Coordinator(coordinator_err) => coordinator_err.current_version(),
            Error::Store(store_err) => store_err.current_version(),
            _ => None,
        }
    }

    /// Check if a patch failed to apply.
    pub fn is_patch_error(&self) -> bool {
        match self {
            Error::Patch(patch_err) => !patch_err.is_invalid_pointer(),
            _ => false,
        }
    }

    pub fn is_path_not_found(&self) -> bool {
        match self {
            Error::Patch(patch_err) => patch_err.is_path_not_found(),
            _ => false,
        }
    }

    pub fn is_type_mismatch(&self) -> bool {
        match self {
            Error::Patch(patch_err) => patch_err.is_type_mismatch(),
            _ => false,
        }
    }

    pub fn is_test_failed(&self) -> bool {
        match self {
            Error::Patch(patch_err) => patch_err.is_test_failed(),
            _ => false,
        }
    }

    /// Check if the lease used for a commit was no longer held.
    pub fn is_lease_expired(&self) -> bool {
        match self {
            Error::Coordinator(coordinator_err) => coordinator_err.is_lease_expired(),
            _ => false,
        }
    }

    /// Check if the storage layer failed.
    pub fn is_store_unavailable(&self) -> bool {
        match self {
            Error::Backend(backend_err) => backend_err.is_unavailable(),
            _ => false,
        }
    }

    /// Check if the caller sent something malformed.
    pub fn is_invalid_request(&self) -> bool {
        match self {
            Error::Service(service_err) => service_err.is_invalid_request(),
            Error::Document(document_err) => document_err.is_invalid_id(),
            Error::Patch(patch_err) => patch_err.is_invalid_pointer(),
            Error::Coordinator(coordinator_err) => coordinator_err.is_invalid_lease(),
            _ => false,
        }
    }
}
