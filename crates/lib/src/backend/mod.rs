//! Pluggable persistence for document revisions.
//!
//! A [`Backend`] is an append-only map from `(document, version)` to
//! [`Revision`]. It never overwrites a stored revision; version sequencing
//! and retention are enforced one layer up by
//! [`DocumentStore`](crate::store::DocumentStore).
//!
//! Two implementations ship with the crate:
//!
//! - [`database::InMemory`]: maps behind a tokio `RwLock`, with optional
//!   JSON snapshot persistence.
//! - [`database::SqlxBackend`] (feature `sqlite`): SQLite via sqlx.

use std::any::Any;

use async_trait::async_trait;

use crate::Result;
use crate::document::{DocumentId, Revision, Version};

pub mod database;
pub mod errors;

pub use errors::BackendError;

/// Storage for immutable revisions.
#[async_trait]
pub trait Backend: Send + Sync + Any {
    /// Fetch one revision, `None` if it is not stored.
    async fn get(&self, document_id: &DocumentId, version: Version) -> Result<Option<Revision>>;

    /// The highest stored version of a document.
    async fn latest(&self, document_id: &DocumentId) -> Result<Option<Revision>>;

    /// Store a new revision.
    ///
    /// Fails with [`BackendError::RevisionExists`] if the `(document,
    /// version)` pair is already present.
    async fn insert(&self, revision: &Revision) -> Result<()>;

    /// Stored versions of a document in ascending order.
    async fn versions(&self, document_id: &DocumentId) -> Result<Vec<Version>>;

    /// IDs of all documents with at least one stored revision, sorted.
    async fn documents(&self) -> Result<Vec<DocumentId>>;

    /// Delete every revision of a document older than `keep_from`.
    ///
    /// Returns the number of deleted revisions.
    async fn prune(&self, document_id: &DocumentId, keep_from: Version) -> Result<usize>;

    /// Short label naming the backend kind, used in health output.
    fn kind(&self) -> &'static str;

    /// Downcasting hook, e.g. to save an [`database::InMemory`] on shutdown.
    fn as_any(&self) -> &dyn Any;
}
