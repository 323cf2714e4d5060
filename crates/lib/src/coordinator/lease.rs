//! Lease tokens and per-document lease slots.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tokio::time::Instant;
use uuid::Uuid;

use crate::document::DocumentId;

/// Proof of an exclusive mutation lease on one document.
///
/// Tokens are resolved by exactly one `commit` or `abort`. Dropping a token
/// does not release the lease; the lease timeout does.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeaseToken {
    document_id: DocumentId,
    /// Monotonically increasing per coordinator.
    fencing: u64,
    mutation_id: Uuid,
}

impl LeaseToken {
    pub(crate) fn new(document_id: DocumentId, fencing: u64) -> Self {
        Self {
            document_id,
            fencing,
            mutation_id: Uuid::new_v4(),
        }
    }

    pub fn document_id(&self) -> &DocumentId {
        &self.document_id
    }

    /// The fencing token; a later grant always has a larger value.
    pub fn fencing(&self) -> u64 {
        self.fencing
    }

    /// Random identifier correlating log lines of one mutation.
    pub fn mutation_id(&self) -> Uuid {
        self.mutation_id
    }
}

impl std::fmt::Display for LeaseToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.document_id, self.fencing)
    }
}

#[derive(Debug)]
pub(crate) struct Holder {
    pub(crate) token: LeaseToken,
    pub(crate) expires_at: Instant,
    /// Set while a commit is in flight; such a lease is never reclaimed.
    pub(crate) committing: bool,
}

impl Holder {
    pub(crate) fn is_expired(&self, now: Instant) -> bool {
        !self.committing && self.expires_at <= now
    }
}

/// Lease state of one document.
#[derive(Debug, Default)]
pub(crate) struct Slot {
    pub(crate) holder: Option<Holder>,
    /// Woken whenever the holder is cleared.
    pub(crate) released: Arc<Notify>,
}
