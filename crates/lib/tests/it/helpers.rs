use std::sync::Arc;
use std::time::Duration;

use dossier::{
    DocumentId, DocumentService, DocumentStore, EngineConfig, Pointer, VersionCoordinator,
    backend::{Backend, database::InMemory},
};

// ==========================
// CORE TEST FACTORIES
// ==========================

/// Creates a test backend based on TEST_BACKEND env var.
///
/// Supported values:
/// - "inmemory" or unset: InMemory backend (default)
/// - "sqlite": SQLite in-memory backend (requires `sqlite` feature)
///
/// # Example
/// ```bash
/// # Run tests with InMemory (default)
/// cargo test
///
/// # Run tests with SQLite
/// TEST_BACKEND=sqlite cargo test
/// ```
pub async fn test_backend() -> Box<dyn Backend> {
    match std::env::var("TEST_BACKEND").as_deref() {
        Ok("sqlite") => {
            #[cfg(feature = "sqlite")]
            {
                use dossier::backend::database::SqlxBackend;
                Box::new(
                    SqlxBackend::sqlite_in_memory()
                        .await
                        .expect("Failed to create SQLite backend"),
                )
            }
            #[cfg(not(feature = "sqlite"))]
            {
                panic!("TEST_BACKEND=sqlite requires the 'sqlite' feature to be enabled")
            }
        }
        Ok("inmemory") | Ok("") | Err(_) => Box::new(InMemory::new()),
        Ok(other) => {
            panic!("Unknown TEST_BACKEND value: {other}. Supported: inmemory, sqlite")
        }
    }
}

/// Every backend compiled into this build, labelled.
#[allow(dead_code)]
pub async fn all_backends() -> Vec<(&'static str, Box<dyn Backend>)> {
    let mut backends: Vec<(&'static str, Box<dyn Backend>)> = vec![("inmemory", Box::new(InMemory::new()))];
    #[cfg(feature = "sqlite")]
    backends.push((
        "sqlite",
        Box::new(
            dossier::backend::database::SqlxBackend::sqlite_in_memory()
                .await
                .expect("Failed to create SQLite backend"),
        ),
    ));
    backends
}

pub async fn test_store() -> Arc<DocumentStore> {
    Arc::new(DocumentStore::new(test_backend().await))
}

pub async fn test_coordinator() -> VersionCoordinator {
    VersionCoordinator::new(test_store().await)
}

/// A coordinator over an InMemory backend, safe to use with paused time.
pub fn paused_coordinator(lease_timeout: Duration) -> VersionCoordinator {
    let store = Arc::new(DocumentStore::new(Box::new(InMemory::new())));
    VersionCoordinator::new(store).with_lease_timeout(lease_timeout)
}

pub async fn test_service() -> Arc<DocumentService> {
    Arc::new(DocumentService::from_config(
        test_backend().await,
        &EngineConfig::default(),
    ))
}

/// Serve `service` on an ephemeral local port and return its base URL.
pub async fn spawn_server(service: Arc<DocumentService>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Failed to read local address");
    tokio::spawn(async move {
        axum::serve(listener, dossier::service::http::router(service))
            .await
            .expect("Test server failed");
    });
    format!("http://{addr}")
}

// ==========================
// SMALL CONSTRUCTORS
// ==========================

pub fn doc_id(id: &str) -> DocumentId {
    DocumentId::new(id).expect("valid document id")
}

pub fn ptr(pointer: &str) -> Pointer {
    Pointer::parse(pointer).expect("valid pointer")
}
