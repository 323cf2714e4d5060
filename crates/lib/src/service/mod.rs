//! Service façade: request-level operations over the coordinator and store.
//!
//! [`DocumentService`] is transport-neutral; [`http`] binds it to axum.
//! Incoming identifiers arrive as raw strings and are validated here.

pub mod errors;
pub mod http;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::Result;
use crate::backend::Backend;
use crate::config::EngineConfig;
use crate::coordinator::{CoordinatorError, VersionCoordinator};
use crate::document::{DocumentId, Revision, Version};
use crate::patch::{self, PatchError, PatchOperation, PatchSet};
use crate::store::{DocumentStore, StoreError};

pub use errors::ServiceError;

/// Body of a mutation request.
///
/// Exactly one of `patch` and `content` must be present. A `null` content is
/// treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MutationRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_version: Option<Version>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<Vec<PatchOperation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
}

impl MutationRequest {
    pub fn patch(base_version: Version, operations: Vec<PatchOperation>) -> Self {
        Self {
            base_version: Some(base_version),
            patch: Some(operations),
            content: None,
        }
    }

    /// Full content; `base_version` is `None` to create a document.
    pub fn content(base_version: Option<Version>, content: Value) -> Self {
        Self {
            base_version,
            patch: None,
            content: Some(content),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationOutcome {
    /// True when the request created the document.
    pub created: bool,
    #[serde(flatten)]
    pub revision: Revision,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub document_id: DocumentId,
    pub version: Version,
    pub deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct History {
    pub document_id: DocumentId,
    /// Retained versions, ascending.
    pub versions: Vec<Version>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Index of the offending operation, absent for pointer syntax errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    pub error: String,
    pub message: String,
}

impl From<&PatchError> for ValidationIssue {
    fn from(err: &PatchError) -> Self {
        Self {
            index: err.operation_index(),
            error: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<ValidationIssue>,
}

#[derive(Debug)]
pub struct DocumentService {
    coordinator: Arc<VersionCoordinator>,
}

impl DocumentService {
    pub fn new(coordinator: Arc<VersionCoordinator>) -> Self {
        Self { coordinator }
    }

    /// Build the store, coordinator and service over `backend`.
    pub fn from_config(backend: Box<dyn Backend>, config: &EngineConfig) -> Self {
        let store = Arc::new(DocumentStore::new(backend).with_retention(config.retention));
        Self::new(Arc::new(VersionCoordinator::from_config(store, config)))
    }

    pub fn coordinator(&self) -> &Arc<VersionCoordinator> {
        &self.coordinator
    }

    pub fn store(&self) -> &Arc<DocumentStore> {
        self.coordinator.store()
    }

    /// A revision of the document, the latest when `version` is `None`.
    pub async fn get(&self, document_id: &str, version: Option<Version>) -> Result<Revision> {
        let document_id = DocumentId::new(document_id)?;
        self.store().get(&document_id, version).await
    }

    pub async fn history(&self, document_id: &str) -> Result<History> {
        let document_id = DocumentId::new(document_id)?;
        let versions = self.store().versions(&document_id).await?;
        Ok(History {
            document_id,
            versions,
        })
    }

    pub async fn list(&self) -> Result<Vec<DocumentSummary>> {
        let mut summaries = Vec::new();
        for document_id in self.store().documents().await? {
            // Documents may be pruned or removed between the two calls.
            let Some(latest) = self.store().try_latest(&document_id).await? else {
                continue;
            };
            summaries.push(DocumentSummary {
                document_id,
                version: latest.version(),
                deleted: latest.is_deleted(),
            });
        }
        Ok(summaries)
    }

    pub async fn diff(&self, document_id: &str, from: Version, to: Version) -> Result<PatchSet> {
        let document_id = DocumentId::new(document_id)?;
        self.store()
            .diff_versions(&document_id, from, to, self.coordinator.diff_options())
            .await
    }

    /// Create, patch or replace a document.
    ///
    /// - `content` without `base_version` creates the document, or fails with
    ///   a conflict carrying the current version when it exists.
    /// - `content` with `base_version` replaces the content (reviving a
    ///   deleted document).
    /// - `patch` requires `base_version`.
    pub async fn submit(&self, document_id: &str, request: MutationRequest) -> Result<MutationOutcome> {
        let document_id = DocumentId::new(document_id)?;
        let MutationRequest {
            base_version,
            patch,
            content,
        } = request;
        let content = content.filter(|content| !content.is_null());

        let revision = match (patch, content) {
            (Some(_), Some(_)) | (None, None) => {
                return Err(ServiceError::invalid_request("exactly one of patch or content is required").into());
            }
            (Some(operations), None) => {
                let base_version = base_version
                    .ok_or_else(|| ServiceError::invalid_request("base_version is required for a patch"))?;
                let mutation = self.coordinator.begin_mutation(&document_id).await?;
                self.coordinator
                    .commit(&document_id, mutation.lease(), &PatchSet::new(base_version, operations))
                    .await?
            }
            (None, Some(content)) => match base_version {
                Some(base_version) => {
                    let mutation = self.coordinator.begin_mutation(&document_id).await?;
                    self.coordinator
                        .commit_content(&document_id, mutation.lease(), base_version, content)
                        .await?
                }
                None => return self.create(&document_id, content).await,
            },
        };
        Ok(MutationOutcome {
            created: false,
            revision,
        })
    }

    /// Tombstone the document at `base_version`, or at its current version.
    pub async fn delete(&self, document_id: &str, base_version: Option<Version>) -> Result<Revision> {
        let document_id = DocumentId::new(document_id)?;
        let mutation = self.coordinator.begin_mutation(&document_id).await?;
        let base_version = base_version.unwrap_or_else(|| mutation.base().version());
        self.coordinator
            .commit_tombstone(&document_id, mutation.lease(), base_version)
            .await
    }

    /// Check a patch against the latest revision without committing.
    pub async fn validate(&self, document_id: &str, operations: &[PatchOperation]) -> Result<ValidationReport> {
        let document_id = DocumentId::new(document_id)?;
        let latest = self.store().latest(&document_id).await?;
        if latest.is_deleted() {
            return Err(StoreError::DocumentDeleted {
                document_id,
                version: latest.version(),
            }
            .into());
        }

        let errors: Vec<ValidationIssue> = match patch::validate_against(latest.content(), operations) {
            Ok(()) => Vec::new(),
            Err(issues) => issues.iter().map(ValidationIssue::from).collect(),
        };
        debug!(document_id = %document_id, issues = errors.len(), "patch validated");
        Ok(ValidationReport {
            valid: errors.is_empty(),
            errors,
        })
    }

    async fn create(&self, document_id: &DocumentId, content: Value) -> Result<MutationOutcome> {
        let mutation = self
            .coordinator
            .begin_mutation_or_create(document_id, content)
            .await?;
        let created = mutation.created();
        let (base, lease) = mutation.into_parts();
        self.coordinator.abort(document_id, &lease).await?;

        if !created {
            return Err(CoordinatorError::Conflict {
                document_id: document_id.clone(),
                expected: None,
                current_version: base.version(),
            }
            .into());
        }
        Ok(MutationOutcome {
            created: true,
            revision: base,
        })
    }
}
