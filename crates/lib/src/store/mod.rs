//! Document store: append-only revision history over a [`Backend`].
//!
//! The store is an owned object. Create it once at startup, share it by
//! `Arc`, and drop it at shutdown. It enforces that each stored revision is
//! the direct successor of the latest one and applies the configured
//! [`RetentionPolicy`] after every write. It performs no locking of its own;
//! writers are serialized by the
//! [`VersionCoordinator`](crate::coordinator::VersionCoordinator).

pub mod errors;

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::Result;
use crate::backend::Backend;
use crate::clock::{Clock, SystemClock};
use crate::config::RetentionPolicy;
use crate::document::{DocumentId, Revision, Version};
use crate::patch::{DiffOptions, PatchSet};

pub use errors::StoreError;

pub struct DocumentStore {
    backend: Box<dyn Backend>,
    clock: Arc<dyn Clock>,
    retention: RetentionPolicy,
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore")
            .field("backend", &self.backend.kind())
            .field("clock", &self.clock)
            .field("retention", &self.retention)
            .finish()
    }
}

impl DocumentStore {
    /// A store with the system clock and unbounded retention.
    pub fn new(backend: Box<dyn Backend>) -> Self {
        Self {
            backend,
            clock: Arc::new(SystemClock),
            retention: RetentionPolicy::Unbounded,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_retention(mut self, retention: RetentionPolicy) -> Self {
        self.retention = retention;
        self
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn retention(&self) -> RetentionPolicy {
        self.retention
    }

    /// Fetch a revision, the latest one when `version` is `None`.
    pub async fn get(&self, document_id: &DocumentId, version: Option<Version>) -> Result<Revision> {
        let Some(version) = version else {
            return self.latest(document_id).await;
        };
        match self.backend.get(document_id, version).await? {
            Some(revision) => Ok(revision),
            None if self.backend.latest(document_id).await?.is_none() => {
                Err(StoreError::DocumentNotFound {
                    document_id: document_id.clone(),
                }
                .into())
            }
            None => Err(StoreError::RevisionNotFound {
                document_id: document_id.clone(),
                version,
            }
            .into()),
        }
    }

    /// The latest revision, which may be a tombstone.
    pub async fn latest(&self, document_id: &DocumentId) -> Result<Revision> {
        self.try_latest(document_id)
            .await?
            .ok_or_else(|| {
                StoreError::DocumentNotFound {
                    document_id: document_id.clone(),
                }
                .into()
            })
    }

    pub async fn try_latest(&self, document_id: &DocumentId) -> Result<Option<Revision>> {
        self.backend.latest(document_id).await
    }

    /// Append a revision.
    ///
    /// The revision must directly follow the latest stored one (or be version
    /// 0 of a new document), otherwise [`StoreError::VersionGap`].
    pub async fn put(&self, revision: Revision) -> Result<Revision> {
        let document_id = revision.document_id();
        let expected = match self.backend.latest(document_id).await? {
            Some(latest) => latest.version() + 1,
            None => 0,
        };
        if revision.version() != expected || revision.previous_version() != expected.checked_sub(1) {
            return Err(StoreError::VersionGap {
                document_id: document_id.clone(),
                expected,
                actual: revision.version(),
            }
            .into());
        }

        self.backend.insert(&revision).await?;
        debug!(document_id = %document_id, version = revision.version(), "revision stored");

        if let Some(floor) = self.retention.floor(revision.version()) {
            let pruned = self.backend.prune(document_id, floor).await?;
            if pruned > 0 {
                debug!(document_id = %document_id, pruned, keep_from = floor, "pruned old revisions");
            }
        }
        Ok(revision)
    }

    /// Store version 0 of a new document.
    pub async fn create(&self, document_id: &DocumentId, initial: Value) -> Result<Revision> {
        if let Some(current) = self.backend.latest(document_id).await? {
            return Err(StoreError::AlreadyExists {
                document_id: document_id.clone(),
                current_version: current.version(),
            }
            .into());
        }
        let revision = Revision::initial(document_id.clone(), initial, self.clock.now_rfc3339());
        self.put(revision).await
    }

    /// Retained versions of a document, ascending.
    pub async fn versions(&self, document_id: &DocumentId) -> Result<Vec<Version>> {
        let versions = self.backend.versions(document_id).await?;
        if versions.is_empty() {
            return Err(StoreError::DocumentNotFound {
                document_id: document_id.clone(),
            }
            .into());
        }
        Ok(versions)
    }

    pub async fn documents(&self) -> Result<Vec<DocumentId>> {
        self.backend.documents().await
    }

    /// Patch turning revision `from` into revision `to`.
    pub async fn diff_versions(
        &self,
        document_id: &DocumentId,
        from: Version,
        to: Version,
        options: &DiffOptions,
    ) -> Result<PatchSet> {
        let old = self.get(document_id, Some(from)).await?;
        let new = self.get(document_id, Some(to)).await?;
        Ok(PatchSet::from_diff_with(
            from,
            old.content(),
            new.content(),
            options,
        ))
    }
}
