//! Serve command - runs the Dossier HTTP server.

use std::{sync::Arc, time::Duration};

use tokio::signal::unix::{SignalKind, signal};
use tracing_subscriber::EnvFilter;

use dossier::{
    DocumentService, EngineConfig, RetentionPolicy,
    backend::database::InMemory,
    constants::SNAPSHOT_FILE,
    patch::DiffOptions,
    service::http,
};

use crate::backend::{create_backend, data_dir};
use crate::cli::ServeArgs;

/// Engine settings derived from the command line
pub fn engine_config(args: &ServeArgs) -> EngineConfig {
    EngineConfig {
        lease_timeout: Duration::from_millis(args.lease_timeout_ms),
        retention: RetentionPolicy::from_max_revisions(args.max_revisions),
        diff: if args.no_move_detection {
            DiffOptions::without_moves()
        } else {
            DiffOptions::default()
        },
    }
}

/// Run the Dossier server
pub async fn run(args: &ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("dossier=info".parse()?))
        .init();

    let config = engine_config(args);
    tracing::info!(
        lease_timeout_ms = args.lease_timeout_ms,
        retention = ?config.retention,
        detect_moves = config.diff.detect_moves,
        "Engine configured"
    );

    // Create the storage backend
    let backend = create_backend(&args.backend_config).await?;
    let service = Arc::new(DocumentService::from_config(backend, &config));
    let app = http::router(Arc::clone(&service));

    // Bind server
    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    println!("Dossier server listening on http://{local_addr}");
    println!();
    println!("Available endpoints:");
    println!("  GET    /health                          - Health check");
    println!("  GET    /documents                       - List documents");
    println!("  GET    /documents/{{id}}                  - Latest revision");
    println!("  GET    /documents/{{id}}/{{version}}        - Historical revision");
    println!("  GET    /documents/{{id}}/history          - Retained versions");
    println!("  GET    /documents/{{id}}/diff?from=&to=   - Patch between versions");
    println!("  POST   /documents/{{id}}                  - Create, patch or replace");
    println!("  POST   /documents/{{id}}/validate         - Dry-run a patch");
    println!("  DELETE /documents/{{id}}                  - Delete (tombstone)");
    println!();
    println!("Press Ctrl+C to shutdown");

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let snapshot_path = data_dir(&args.backend_config).join(SNAPSHOT_FILE);

    // Start server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = sigterm.recv() => tracing::info!("Received SIGTERM, initiating graceful shutdown..."),
                _ = sigint.recv() => tracing::info!("Received SIGINT, initiating graceful shutdown..."),
            }

            // Save documents on shutdown (only needed for InMemory backend)
            if let Some(in_memory_backend) = service
                .store()
                .backend()
                .as_any()
                .downcast_ref::<InMemory>()
            {
                match in_memory_backend.save_to_file(&snapshot_path).await {
                    Ok(_) => {
                        tracing::info!("Documents saved to {}", snapshot_path.display());
                        println!("\nDocuments saved successfully");
                    }
                    Err(e) => {
                        tracing::error!("Failed to save documents: {e:?}");
                        eprintln!("Failed to save documents: {e:?}");
                    }
                }
            }
        })
        .await?;

    println!("Server shut down");
    Ok(())
}
