//! Backend creation and utility functions.

use std::path::PathBuf;

use dossier::{
    backend::{
        Backend as _,
        database::{InMemory, SqlxBackend},
    },
    constants::{SNAPSHOT_FILE, SQLITE_FILE},
};

use crate::cli::{Backend, BackendArgs};

/// The configured data directory, defaulting to the working directory.
pub fn data_dir(args: &BackendArgs) -> PathBuf {
    args.data_dir.clone().unwrap_or_else(|| PathBuf::from("."))
}

/// Path of the storage file the configured backend uses
pub fn storage_path(args: &BackendArgs) -> PathBuf {
    let file = match args.backend {
        Backend::Sqlite => SQLITE_FILE,
        Backend::Inmemory => SNAPSHOT_FILE,
    };
    data_dir(args).join(file)
}

/// Human-readable description of the configured backend
pub fn backend_label(args: &BackendArgs) -> String {
    let kind = match args.backend {
        Backend::Sqlite => "sqlite",
        Backend::Inmemory => "inmemory",
    };
    format!("{kind} ({})", storage_path(args).display())
}

/// Create the appropriate backend based on configuration
pub async fn create_backend(
    args: &BackendArgs,
) -> Result<Box<dyn dossier::backend::Backend>, Box<dyn std::error::Error>> {
    // Ensure data directory exists
    tokio::fs::create_dir_all(data_dir(args)).await?;
    let path = storage_path(args);

    match args.backend {
        Backend::Sqlite => {
            tracing::info!("Using SQLite backend at {}", path.display());
            Ok(Box::new(SqlxBackend::open_sqlite(&path).await?))
        }
        Backend::Inmemory => {
            tracing::info!(
                "Using in-memory backend with persistence at {}",
                path.display()
            );
            let backend = InMemory::load_from_file(&path).await?;
            let documents = backend.documents().await?.len();
            if documents > 0 {
                tracing::info!("Loaded {documents} documents from {}", path.display());
            } else {
                tracing::info!("Starting with an empty store");
            }
            Ok(Box::new(backend))
        }
    }
}
