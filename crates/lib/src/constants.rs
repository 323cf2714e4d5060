//! Constants used throughout the Dossier library.

/// Maximum length of a document ID in bytes.
pub const MAX_DOCUMENT_ID_LEN: usize = 256;

/// Default lease lifetime in milliseconds.
pub const DEFAULT_LEASE_TIMEOUT_MS: u64 = 30_000;

/// File name of the SQLite database inside a data directory.
pub const SQLITE_FILE: &str = "dossier.db";

/// File name of the in-memory backend snapshot inside a data directory.
pub const SNAPSHOT_FILE: &str = "dossier.json";
