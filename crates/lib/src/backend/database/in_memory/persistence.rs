//! JSON snapshot persistence for the in-memory backend.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::RwLock;

use super::{History, InMemory};
use crate::Result;
use crate::backend::BackendError;
use crate::document::{DocumentId, Revision};

/// The current snapshot file format version.
/// v0 indicates this is an unstable format subject to breaking changes.
const PERSISTENCE_VERSION: u8 = 0;

fn is_v0(v: &u8) -> bool {
    *v == 0
}

fn validate_persistence_version<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let version = u8::deserialize(deserializer)?;
    if version != PERSISTENCE_VERSION {
        return Err(serde::de::Error::custom(format!(
            "unsupported persistence version {version}; only version {PERSISTENCE_VERSION} is supported"
        )));
    }
    Ok(version)
}

/// On-disk layout: every document's revisions in ascending version order.
#[derive(Serialize, Deserialize)]
struct Snapshot {
    #[serde(
        rename = "_v",
        default,
        skip_serializing_if = "is_v0",
        deserialize_with = "validate_persistence_version"
    )]
    version: u8,
    documents: BTreeMap<DocumentId, Vec<Revision>>,
}

pub(crate) async fn save_to_file<P: AsRef<Path>>(backend: &InMemory, path: P) -> Result<()> {
    let path = path.as_ref();
    let snapshot = {
        let documents = backend.documents.read().await;
        Snapshot {
            version: PERSISTENCE_VERSION,
            documents: documents
                .iter()
                .map(|(id, history)| (id.clone(), history.values().cloned().collect()))
                .collect(),
        }
    };
    let json = serde_json::to_vec(&snapshot)
        .map_err(|source| BackendError::SerializationFailed { source })?;

    // Write next to the target and rename so a crash never leaves a torn file.
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, json)
        .await
        .map_err(|source| BackendError::FileIo {
            context: format!("writing {}", tmp.display()),
            source,
        })?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|source| BackendError::FileIo {
            context: format!("renaming {} to {}", tmp.display(), path.display()),
            source,
        })?;
    Ok(())
}

pub(crate) async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<InMemory> {
    let path = path.as_ref();
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(InMemory::new()),
        Err(source) => {
            return Err(BackendError::FileIo {
                context: format!("reading {}", path.display()),
                source,
            }
            .into());
        }
    };
    let snapshot: Snapshot =
        serde_json::from_slice(&bytes).map_err(|source| BackendError::DeserializationFailed {
            context: path.display().to_string(),
            source,
        })?;

    let documents: HashMap<DocumentId, History> = snapshot
        .documents
        .into_iter()
        .map(|(id, revisions)| {
            let history = revisions.into_iter().map(|r| (r.version(), r)).collect();
            (id, history)
        })
        .collect();
    Ok(InMemory {
        documents: RwLock::new(documents),
    })
}
