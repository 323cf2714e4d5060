//! Revision storage operations for the SQL backend.

use crate::Result;
use crate::backend::BackendError;
use crate::document::{DocumentId, Revision, Version};

use super::{SqlxBackend, SqlxResultExt};

fn to_sql(version: Version) -> Result<i64> {
    i64::try_from(version).map_err(|_| {
        BackendError::SqlxError {
            reason: format!("version {version} exceeds the SQL integer range"),
            source: None,
        }
        .into()
    })
}

fn decode(document_id: &DocumentId, json: &str) -> Result<Revision> {
    serde_json::from_str(json).map_err(|source| {
        BackendError::DeserializationFailed {
            context: format!("stored revision of {document_id}"),
            source,
        }
        .into()
    })
}

pub async fn get(
    backend: &SqlxBackend,
    document_id: &DocumentId,
    version: Version,
) -> Result<Option<Revision>> {
    let row: Option<(String,)> = sqlx::query_as(
        "SELECT revision_json FROM revisions WHERE document_id = $1 AND version = $2",
    )
    .bind(document_id.as_str())
    .bind(to_sql(version)?)
    .fetch_optional(backend.pool())
    .await
    .sql_context("Failed to get revision")?;

    row.map(|(json,)| decode(document_id, &json)).transpose()
}

pub async fn latest(backend: &SqlxBackend, document_id: &DocumentId) -> Result<Option<Revision>> {
    let row: Option<(String,)> = sqlx::query_as(
        "SELECT revision_json FROM revisions WHERE document_id = $1 ORDER BY version DESC LIMIT 1",
    )
    .bind(document_id.as_str())
    .fetch_optional(backend.pool())
    .await
    .sql_context("Failed to get latest revision")?;

    row.map(|(json,)| decode(document_id, &json)).transpose()
}

pub async fn insert(backend: &SqlxBackend, revision: &Revision) -> Result<()> {
    let json = serde_json::to_string(revision)
        .map_err(|source| BackendError::SerializationFailed { source })?;

    let result = sqlx::query(
        "INSERT INTO revisions (document_id, version, revision_json) VALUES ($1, $2, $3)",
    )
    .bind(revision.document_id().as_str())
    .bind(to_sql(revision.version())?)
    .bind(json)
    .execute(backend.pool())
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            Err(BackendError::RevisionExists {
                document_id: revision.document_id().clone(),
                version: revision.version(),
            }
            .into())
        }
        Err(e) => Err(e).sql_context("Failed to insert revision"),
    }
}

pub async fn versions(backend: &SqlxBackend, document_id: &DocumentId) -> Result<Vec<Version>> {
    let rows: Vec<(i64,)> =
        sqlx::query_as("SELECT version FROM revisions WHERE document_id = $1 ORDER BY version")
            .bind(document_id.as_str())
            .fetch_all(backend.pool())
            .await
            .sql_context("Failed to list versions")?;

    Ok(rows.into_iter().map(|(v,)| v as Version).collect())
}

pub async fn documents(backend: &SqlxBackend) -> Result<Vec<DocumentId>> {
    let rows: Vec<(String,)> =
        sqlx::query_as("SELECT DISTINCT document_id FROM revisions ORDER BY document_id")
            .fetch_all(backend.pool())
            .await
            .sql_context("Failed to list documents")?;

    rows.into_iter()
        .map(|(id,)| {
            DocumentId::new(id).map_err(|e| {
                BackendError::SqlxError {
                    reason: format!("stored document ID is invalid: {e}"),
                    source: None,
                }
                .into()
            })
        })
        .collect()
}

pub async fn prune(
    backend: &SqlxBackend,
    document_id: &DocumentId,
    keep_from: Version,
) -> Result<usize> {
    let result = sqlx::query("DELETE FROM revisions WHERE document_id = $1 AND version < $2")
        .bind(document_id.as_str())
        .bind(to_sql(keep_from)?)
        .execute(backend.pool())
        .await
        .sql_context("Failed to prune revisions")?;

    Ok(result.rows_affected() as usize)
}
