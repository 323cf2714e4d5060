//! Version coordinator: exclusive per-document leases and atomic commits.
//!
//! A mutation is `begin_mutation` → compute a patch → `commit` (or `abort`).
//! `begin_mutation` grants an exclusive lease on the document; a concurrent
//! caller for the same document suspends until the lease is resolved or
//! expires. Different documents never wait on each other.
//!
//! A lease that outlives [`VersionCoordinator::lease_timeout`] may be
//! reclaimed by the next acquirer, after which the stale holder's commit
//! fails with [`CoordinatorError::LeaseExpired`]. A lease whose commit is in
//! flight is never reclaimed.
//!
//! `commit` releases the lease whatever the outcome, including when the
//! commit future is dropped before it completes.

pub mod errors;
mod lease;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::Result;
use crate::config::EngineConfig;
use crate::document::{DocumentId, Revision, Version};
use crate::patch::{self, DiffOptions, PatchSet};
use crate::store::{DocumentStore, StoreError};

pub use errors::CoordinatorError;
pub use lease::LeaseToken;
use lease::{Holder, Slot};

/// An open mutation: the revision it starts from and the lease that guards it.
#[derive(Debug, Clone)]
pub struct Mutation {
    base: Revision,
    lease: LeaseToken,
    created: bool,
}

impl Mutation {
    pub fn base(&self) -> &Revision {
        &self.base
    }

    pub fn lease(&self) -> &LeaseToken {
        &self.lease
    }

    /// Whether `begin_mutation_or_create` created the document.
    pub fn created(&self) -> bool {
        self.created
    }

    pub fn into_parts(self) -> (Revision, LeaseToken) {
        (self.base, self.lease)
    }
}

enum Change<'a> {
    Patch(&'a PatchSet),
    Content { base_version: Version, content: Value },
    Tombstone { base_version: Version },
}

impl Change<'_> {
    fn base_version(&self) -> Version {
        match self {
            Change::Patch(patch_set) => patch_set.base_version,
            Change::Content { base_version, .. } | Change::Tombstone { base_version } => *base_version,
        }
    }
}

pub struct VersionCoordinator {
    store: Arc<DocumentStore>,
    lease_timeout: Duration,
    diff: DiffOptions,
    slots: Mutex<HashMap<DocumentId, Slot>>,
    next_fencing: AtomicU64,
}

impl std::fmt::Debug for VersionCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionCoordinator")
            .field("store", self.store())
            .field("lease_timeout", &self.lease_timeout())
            .finish_non_exhaustive()
    }
}

impl VersionCoordinator {
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self::from_config(store, &EngineConfig::default())
    }

    pub fn from_config(store: Arc<DocumentStore>, config: &EngineConfig) -> Self {
        Self {
            store,
            lease_timeout: config.lease_timeout,
            diff: config.diff,
            slots: Mutex::new(HashMap::new()),
            next_fencing: AtomicU64::new(0),
        }
    }

    pub fn with_lease_timeout(mut self, lease_timeout: Duration) -> Self {
        self.lease_timeout = lease_timeout;
        self
    }

    pub fn store(&self) -> &Arc<DocumentStore> {
        &self.store
    }

    pub fn lease_timeout(&self) -> Duration {
        self.lease_timeout
    }

    pub fn diff_options(&self) -> &DiffOptions {
        &self.diff
    }

    /// Never held across an await point.
    fn lock_slots(&self) -> MutexGuard<'_, HashMap<DocumentId, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lease `document_id` and return its current revision.
    ///
    /// Fails with `NotFound` (releasing the lease) if the document does not
    /// exist.
    pub async fn begin_mutation(&self, document_id: &DocumentId) -> Result<Mutation> {
        let lease = self.acquire(document_id).await;
        match self.store.try_latest(document_id).await {
            Ok(Some(base)) => Ok(Mutation {
                base,
                lease,
                created: false,
            }),
            Ok(None) => {
                self.release(&lease);
                Err(StoreError::DocumentNotFound {
                    document_id: document_id.clone(),
                }
                .into())
            }
            Err(err) => {
                self.release(&lease);
                Err(err)
            }
        }
    }

    /// Like [`begin_mutation`](Self::begin_mutation), but creates version 0
    /// with `initial` under the lease when the document is absent.
    pub async fn begin_mutation_or_create(
        &self,
        document_id: &DocumentId,
        initial: Value,
    ) -> Result<Mutation> {
        let lease = self.acquire(document_id).await;
        let base = match self.store.try_latest(document_id).await {
            Ok(Some(base)) => Ok((base, false)),
            Ok(None) => self.store.create(document_id, initial).await.map(|r| (r, true)),
            Err(err) => Err(err),
        };
        match base {
            Ok((base, created)) => {
                if created {
                    info!(document_id = %document_id, mutation_id = %lease.mutation_id(), "document created");
                }
                Ok(Mutation {
                    base,
                    lease,
                    created,
                })
            }
            Err(err) => {
                self.release(&lease);
                Err(err)
            }
        }
    }

    /// Apply `patch_set` to the current revision and append the result.
    pub async fn commit(
        &self,
        document_id: &DocumentId,
        lease: &LeaseToken,
        patch_set: &PatchSet,
    ) -> Result<Revision> {
        self.resolve(document_id, lease, Change::Patch(patch_set))
            .await
    }

    /// Replace the document content wholesale; the patches are diffed.
    ///
    /// Also revives a deleted document.
    pub async fn commit_content(
        &self,
        document_id: &DocumentId,
        lease: &LeaseToken,
        base_version: Version,
        content: Value,
    ) -> Result<Revision> {
        self.resolve(
            document_id,
            lease,
            Change::Content {
                base_version,
                content,
            },
        )
        .await
    }

    /// Append a tombstone revision.
    pub async fn commit_tombstone(
        &self,
        document_id: &DocumentId,
        lease: &LeaseToken,
        base_version: Version,
    ) -> Result<Revision> {
        self.resolve(document_id, lease, Change::Tombstone { base_version })
            .await
    }

    /// Release a lease without committing.
    ///
    /// Aborting a lease that already expired is not an error.
    pub async fn abort(&self, document_id: &DocumentId, lease: &LeaseToken) -> Result<()> {
        check_document(document_id, lease)?;
        {
            let slots = self.lock_slots();
            let committing = slots
                .get(document_id)
                .and_then(|slot| slot.holder.as_ref())
                .is_some_and(|holder| holder.token == *lease && holder.committing);
            if committing {
                return Err(CoordinatorError::InvalidLease {
                    document_id: document_id.clone(),
                    reason: "a commit with this lease is in progress".to_string(),
                }
                .into());
            }
        }
        if self.release(lease) {
            debug!(document_id = %document_id, fencing = lease.fencing(), "lease aborted");
        } else {
            debug!(document_id = %document_id, fencing = lease.fencing(), "abort of a lease no longer held");
        }
        Ok(())
    }

    /// Whether a live lease is currently held on the document.
    pub async fn is_leased(&self, document_id: &DocumentId) -> bool {
        let slots = self.lock_slots();
        let now = Instant::now();
        slots
            .get(document_id)
            .and_then(|slot| slot.holder.as_ref())
            .is_some_and(|holder| !holder.is_expired(now))
    }

    async fn resolve(
        &self,
        document_id: &DocumentId,
        lease: &LeaseToken,
        change: Change<'_>,
    ) -> Result<Revision> {
        self.claim(document_id, lease)?;
        let guard = CommitGuard {
            coordinator: self,
            lease,
            finished: false,
        };
        let outcome = self.apply_change(document_id, change).await;
        guard.finish();

        match &outcome {
            Ok(revision) => info!(
                document_id = %document_id,
                version = revision.version(),
                mutation_id = %lease.mutation_id(),
                "mutation committed"
            ),
            Err(err) => warn!(
                document_id = %document_id,
                mutation_id = %lease.mutation_id(),
                error = %err,
                "mutation rejected"
            ),
        }
        outcome
    }

    async fn apply_change(&self, document_id: &DocumentId, change: Change<'_>) -> Result<Revision> {
        let current = self.store.latest(document_id).await?;
        let base_version = change.base_version();
        if base_version != current.version() {
            return Err(CoordinatorError::Conflict {
                document_id: document_id.clone(),
                expected: Some(base_version),
                current_version: current.version(),
            }
            .into());
        }

        let deleted = || StoreError::DocumentDeleted {
            document_id: document_id.clone(),
            version: current.version(),
        };
        let created_at = self.store.clock().now_rfc3339();
        let revision = match change {
            Change::Patch(patch_set) => {
                if current.is_deleted() {
                    return Err(deleted().into());
                }
                let content = patch::apply(current.content(), &patch_set.operations)?;
                let backward = patch::diff_with(&content, current.content(), &self.diff);
                Revision::successor(
                    &current,
                    content,
                    patch_set.operations.clone(),
                    backward,
                    created_at,
                )
            }
            Change::Content { content, .. } => {
                let forward = patch::diff_with(current.content(), &content, &self.diff);
                let backward = patch::diff_with(&content, current.content(), &self.diff);
                Revision::successor(&current, content, forward, backward, created_at)
            }
            Change::Tombstone { .. } => {
                if current.is_deleted() {
                    return Err(deleted().into());
                }
                Revision::tombstone(&current, created_at)
            }
        };
        self.store.put(revision).await
    }

    async fn acquire(&self, document_id: &DocumentId) -> LeaseToken {
        loop {
            let released: Arc<Notify>;
            let notified;
            let deadline = {
                let mut slots = self.lock_slots();
                let slot = slots.entry(document_id.clone()).or_default();
                let now = Instant::now();

                // Outer `None`: free to take. `Some(None)`: wait for release only.
                let wait = match &slot.holder {
                    None => None,
                    Some(holder) if holder.is_expired(now) => {
                        warn!(
                            document_id = %document_id,
                            fencing = holder.token.fencing(),
                            "reclaiming expired lease"
                        );
                        None
                    }
                    Some(holder) => Some((!holder.committing).then_some(holder.expires_at)),
                };

                let Some(deadline) = wait else {
                    let fencing = self.next_fencing.fetch_add(1, Ordering::SeqCst) + 1;
                    let token = LeaseToken::new(document_id.clone(), fencing);
                    slot.holder = Some(Holder {
                        token: token.clone(),
                        expires_at: now + self.lease_timeout,
                        committing: false,
                    });
                    debug!(document_id = %document_id, fencing, "lease acquired");
                    return token;
                };

                // Created under the lock so a release after unlocking is not missed.
                released = Arc::clone(&slot.released);
                notified = released.notified();
                deadline
            };
            tokio::pin!(notified);
            notified.as_mut().enable();

            debug!(document_id = %document_id, "waiting for lease");
            match deadline {
                Some(deadline) => {
                    let _ = tokio::time::timeout_at(deadline, notified).await;
                }
                None => notified.await,
            }
        }
    }

    /// Mark the lease as committing, or explain why it cannot commit.
    fn claim(&self, document_id: &DocumentId, lease: &LeaseToken) -> Result<()> {
        check_document(document_id, lease)?;
        let expired = || CoordinatorError::LeaseExpired {
            document_id: document_id.clone(),
        };

        let mut slots = self.lock_slots();
        let Some(slot) = slots.get_mut(document_id) else {
            return Err(expired().into());
        };
        let Some(holder) = slot.holder.as_mut().filter(|h| h.token == *lease) else {
            return Err(expired().into());
        };
        if holder.committing {
            return Err(CoordinatorError::InvalidLease {
                document_id: document_id.clone(),
                reason: "a commit with this lease is already in progress".to_string(),
            }
            .into());
        }
        if holder.is_expired(Instant::now()) {
            slot.released.notify_waiters();
            slots.remove(document_id);
            warn!(document_id = %document_id, fencing = lease.fencing(), "lease expired before commit");
            return Err(expired().into());
        }
        holder.committing = true;
        Ok(())
    }

    /// Clear the holder if it is `lease`. Returns whether it was.
    fn release(&self, lease: &LeaseToken) -> bool {
        let mut slots = self.lock_slots();
        let Some(slot) = slots.get_mut(lease.document_id()) else {
            return false;
        };
        if !slot.holder.as_ref().is_some_and(|h| h.token == *lease) {
            return false;
        }
        slot.holder = None;
        slot.released.notify_waiters();
        slots.remove(lease.document_id());
        true
    }
}

/// Releases a claimed lease when dropped.
///
/// A commit future dropped mid-flight (client disconnect, caller timeout)
/// still frees the document.
struct CommitGuard<'a> {
    coordinator: &'a VersionCoordinator,
    lease: &'a LeaseToken,
    finished: bool,
}

impl CommitGuard<'_> {
    fn finish(mut self) {
        self.finished = true;
    }
}

impl Drop for CommitGuard<'_> {
    fn drop(&mut self) {
        let released = self.coordinator.release(self.lease);
        if released && !self.finished {
            warn!(
                document_id = %self.lease.document_id(),
                fencing = self.lease.fencing(),
                "commit cancelled, lease released"
            );
        }
    }
}

fn check_document(document_id: &DocumentId, lease: &LeaseToken) -> Result<()> {
    if lease.document_id() != document_id {
        return Err(CoordinatorError::InvalidLease {
            document_id: document_id.clone(),
            reason: format!("lease was granted for document {}", lease.document_id()),
        }
        .into());
    }
    Ok(())
}
