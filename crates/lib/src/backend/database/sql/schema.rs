//! SQL schema definitions and migrations.
//!
//! # Migration System
//!
//! Migrations are code-based. To change the schema:
//!
//! 1. Increment `SCHEMA_VERSION`
//! 2. Add a new `migrate_vN_to_vM` async function
//! 3. Add the migration to the match statement in `run_migration`

use crate::Result;
use crate::backend::BackendError;

use super::SqlxBackend;

/// Current schema version.
pub const SCHEMA_VERSION: i64 = 1;

/// SQL statements to create the schema tables.
pub const CREATE_TABLES: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS schema_version (
        version BIGINT PRIMARY KEY
    )",
    // One row per immutable revision; the primary key rejects rewrites.
    "CREATE TABLE IF NOT EXISTS revisions (
        document_id TEXT NOT NULL,
        version BIGINT NOT NULL,
        revision_json TEXT NOT NULL,
        PRIMARY KEY (document_id, version)
    )",
];

/// Create tables, migrating older schemas forward.
pub async fn initialize(backend: &SqlxBackend) -> Result<()> {
    let pool = backend.pool();

    for statement in CREATE_TABLES {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| BackendError::SqlxError {
                reason: format!("Schema creation failed: {e} - SQL: {statement}"),
                source: Some(e),
            })?;
    }

    let row: Option<(i64,)> = sqlx::query_as("SELECT version FROM schema_version")
        .fetch_optional(pool)
        .await
        .map_err(|e| BackendError::SqlxError {
            reason: format!("Failed to check schema version: {e}"),
            source: Some(e),
        })?;

    match row {
        None => {
            sqlx::query("INSERT INTO schema_version (version) VALUES ($1)")
                .bind(SCHEMA_VERSION)
                .execute(pool)
                .await
                .map_err(|e| BackendError::SqlxError {
                    reason: format!("Failed to initialize schema version: {e}"),
                    source: Some(e),
                })?;
        }
        Some((current,)) if current < SCHEMA_VERSION => {
            migrate(backend, current, SCHEMA_VERSION).await?;
        }
        Some((current,)) if current > SCHEMA_VERSION => {
            return Err(BackendError::SqlxError {
                reason: format!(
                    "database schema version {current} is newer than supported version {SCHEMA_VERSION}"
                ),
                source: None,
            }
            .into());
        }
        Some(_) => {}
    }

    Ok(())
}

async fn migrate(backend: &SqlxBackend, from: i64, to: i64) -> Result<()> {
    tracing::info!(from, to, "Starting SQL schema migration");

    let mut current = from;
    while current < to {
        let next = current + 1;
        run_migration(backend, current, next).await?;

        sqlx::query("UPDATE schema_version SET version = $1")
            .bind(next)
            .execute(backend.pool())
            .await
            .map_err(|e| BackendError::SqlxError {
                reason: format!("Failed to update schema version to {next}: {e}"),
                source: Some(e),
            })?;

        tracing::info!(version = next, "Migration completed");
        current = next;
    }
    Ok(())
}

async fn run_migration(_backend: &SqlxBackend, from: i64, to: i64) -> Result<()> {
    // No migrations exist yet; version 1 is the first schema.
    Err(BackendError::SqlxError {
        reason: format!("no migration defined from schema version {from} to {to}"),
        source: None,
    }
    .into())
}
