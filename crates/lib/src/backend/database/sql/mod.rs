//! SQLite backend using sqlx.
//!
//! Revisions are stored one row per `(document_id, version)` with the full
//! revision serialized as JSON. The primary key rejects duplicate versions,
//! which keeps stored revisions immutable.
//!
//! ## Schema and Migrations
//!
//! The schema lives in the [`schema`] module and is initialized on connect.

mod storage;

/// Schema definition and migration system.
pub mod schema;

use std::any::Any;

use async_trait::async_trait;
use sqlx::AnyPool;
use sqlx::any::AnyPoolOptions;

use crate::Result;
use crate::backend::{Backend, BackendError};
use crate::document::{DocumentId, Revision, Version};

/// Extension trait for sqlx Result types to simplify error handling.
///
/// Similar to `anyhow::Context`, this trait adds a method to convert
/// sqlx errors to `BackendError::SqlxError` with a context message.
pub(crate) trait SqlxResultExt<T> {
    fn sql_context(self, context: &str) -> Result<T>;
}

impl<T> SqlxResultExt<T> for std::result::Result<T, sqlx::Error> {
    fn sql_context(self, context: &str) -> Result<T> {
        self.map_err(|e| {
            BackendError::SqlxError {
                reason: format!("{context}: {e}"),
                source: Some(e),
            }
            .into()
        })
    }
}

/// SQL-backed revision storage.
///
/// `SqlxBackend` is `Send + Sync`; the sqlx pool handles connection reuse.
pub struct SqlxBackend {
    pool: AnyPool,
}

impl SqlxBackend {
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Open a SQLite database file, creating it and its schema if needed.
    ///
    /// ```ignore
    /// use dossier::backend::database::SqlxBackend;
    ///
    /// let backend = SqlxBackend::open_sqlite("dossier.db").await?;
    /// ```
    pub async fn open_sqlite<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        // mode=rwc: read-write-create
        let url = format!("sqlite:{}?mode=rwc", path.as_ref().display());
        Self::connect_sqlite(&url).await
    }

    /// Connect using a SQLite connection URL such as `sqlite:./my.db`.
    pub async fn connect_sqlite(url: &str) -> Result<Self> {
        sqlx::any::install_default_drivers();

        let is_in_memory = url.contains("mode=memory");

        // An in-memory database disappears with its last connection, so the
        // pool must never let every connection go idle.
        let pool = if is_in_memory {
            AnyPoolOptions::new()
                .max_connections(5)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect(url)
                .await
                .sql_context("Failed to connect to SQLite")?
        } else {
            AnyPoolOptions::new()
                .max_connections(5)
                .connect(url)
                .await
                .sql_context("Failed to connect to SQLite")?
        };

        if is_in_memory {
            sqlx::query("PRAGMA busy_timeout = 5000;")
                .execute(&pool)
                .await
                .sql_context("Failed to configure SQLite")?;
        } else {
            // - journal_mode=WAL: Write-Ahead Logging for better concurrency
            // - synchronous=NORMAL: Balanced durability (safe with WAL)
            // - busy_timeout=5000: Wait up to 5s for locks before failing
            sqlx::query(
                "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA busy_timeout = 5000;",
            )
            .execute(&pool)
            .await
            .sql_context("Failed to configure SQLite")?;
        }

        let backend = Self { pool };
        schema::initialize(&backend).await?;
        Ok(backend)
    }

    /// A private in-memory SQLite database, mainly for tests.
    pub async fn sqlite_in_memory() -> Result<Self> {
        // Shared cache so every pooled connection sees the same database;
        // the unique name keeps instances apart.
        let unique_id = uuid::Uuid::new_v4();
        let url = format!("sqlite:file:mem_{unique_id}?mode=memory&cache=shared");
        Self::connect_sqlite(&url).await
    }
}

#[async_trait]
impl Backend for SqlxBackend {
    async fn get(&self, document_id: &DocumentId, version: Version) -> Result<Option<Revision>> {
        storage::get(self, document_id, version).await
    }

    async fn latest(&self, document_id: &DocumentId) -> Result<Option<Revision>> {
        storage::latest(self, document_id).await
    }

    async fn insert(&self, revision: &Revision) -> Result<()> {
        storage::insert(self, revision).await
    }

    async fn versions(&self, document_id: &DocumentId) -> Result<Vec<Version>> {
        storage::versions(self, document_id).await
    }

    async fn documents(&self) -> Result<Vec<DocumentId>> {
        storage::documents(self).await
    }

    async fn prune(&self, document_id: &DocumentId, keep_from: Version) -> Result<usize> {
        storage::prune(self, document_id, keep_from).await
    }

    fn kind(&self) -> &'static str {
        "sqlite"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
