//! In-memory backend
//!
//! Suitable for tests, development and small deployments. State can be
//! snapshotted to a JSON file with [`InMemory::save_to_file`] and restored
//! with [`InMemory::load_from_file`].

mod persistence;

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::Result;
use crate::backend::{Backend, BackendError};
use crate::document::{DocumentId, Revision, Version};

pub(crate) type History = BTreeMap<Version, Revision>;

/// Revisions held in a `HashMap` of per-document version maps.
#[derive(Debug, Default)]
pub struct InMemory {
    pub(crate) documents: RwLock<HashMap<DocumentId, History>>,
}

impl InMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored revisions across all documents.
    pub async fn revision_count(&self) -> usize {
        self.documents.read().await.values().map(BTreeMap::len).sum()
    }

    /// Write a JSON snapshot of every stored revision to `path`.
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        persistence::save_to_file(self, path).await
    }

    /// Restore a snapshot written by [`InMemory::save_to_file`].
    ///
    /// A missing file yields an empty backend.
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        persistence::load_from_file(path).await
    }
}

#[async_trait]
impl Backend for InMemory {
    async fn get(&self, document_id: &DocumentId, version: Version) -> Result<Option<Revision>> {
        let documents = self.documents.read().await;
        Ok(documents
            .get(document_id)
            .and_then(|history| history.get(&version))
            .cloned())
    }

    async fn latest(&self, document_id: &DocumentId) -> Result<Option<Revision>> {
        let documents = self.documents.read().await;
        Ok(documents
            .get(document_id)
            .and_then(|history| history.last_key_value())
            .map(|(_, revision)| revision.clone()))
    }

    async fn insert(&self, revision: &Revision) -> Result<()> {
        let mut documents = self.documents.write().await;
        let history = documents.entry(revision.document_id().clone()).or_default();
        if history.contains_key(&revision.version()) {
            return Err(BackendError::RevisionExists {
                document_id: revision.document_id().clone(),
                version: revision.version(),
            }
            .into());
        }
        history.insert(revision.version(), revision.clone());
        Ok(())
    }

    async fn versions(&self, document_id: &DocumentId) -> Result<Vec<Version>> {
        let documents = self.documents.read().await;
        Ok(documents
            .get(document_id)
            .map(|history| history.keys().copied().collect())
            .unwrap_or_default())
    }

    async fn documents(&self) -> Result<Vec<DocumentId>> {
        let documents = self.documents.read().await;
        let mut ids: Vec<DocumentId> = documents
            .iter()
            .filter(|(_, history)| !history.is_empty())
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        Ok(ids)
    }

    async fn prune(&self, document_id: &DocumentId, keep_from: Version) -> Result<usize> {
        let mut documents = self.documents.write().await;
        let Some(history) = documents.get_mut(document_id) else {
            return Ok(0);
        };
        let kept = history.split_off(&keep_from);
        let removed = history.len();
        *history = kept;
        Ok(removed)
    }

    fn kind(&self) -> &'static str {
        "inmemory"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
