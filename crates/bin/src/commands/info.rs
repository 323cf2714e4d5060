//! Info command - shows backend, document and revision counts of a data directory.

use serde::Serialize;

use dossier::DocumentStore;

use crate::backend::{backend_label, create_backend};
use crate::cli::InfoArgs;
use crate::output::{OutputFormat, Table};

#[derive(Debug, Serialize)]
struct DocumentRow {
    document_id: String,
    latest_version: u64,
    revisions: usize,
    deleted: bool,
}

/// Run the info command
pub async fn run(args: &InfoArgs, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let backend = create_backend(&args.backend_config).await?;
    let store = DocumentStore::new(backend);

    let mut rows = Vec::new();
    for document_id in store.documents().await? {
        let latest = store.latest(&document_id).await?;
        let revisions = store.versions(&document_id).await?.len();
        rows.push(DocumentRow {
            document_id: document_id.to_string(),
            latest_version: latest.version(),
            revisions,
            deleted: latest.is_deleted(),
        });
    }

    let backend_str = backend_label(&args.backend_config);
    let revision_count: usize = rows.iter().map(|row| row.revisions).sum();

    match format {
        OutputFormat::Human => {
            println!("Backend:     {backend_str}");
            println!("Documents:   {}", rows.len());
            println!("Revisions:   {revision_count}");
            if !rows.is_empty() {
                println!();
                let mut table = Table::new(&["DOCUMENT", "VERSION", "REVISIONS", "DELETED"]);
                for row in &rows {
                    table.push(vec![
                        row.document_id.clone(),
                        row.latest_version.to_string(),
                        row.revisions.to_string(),
                        if row.deleted { "yes" } else { "no" }.to_string(),
                    ]);
                }
                table.print();
            }
        }
        OutputFormat::Json => {
            let value = serde_json::json!({
                "backend": backend_str,
                "documents": rows,
                "revisions": revision_count,
            });
            println!("{}", serde_json::to_string(&value)?);
        }
    }

    Ok(())
}
