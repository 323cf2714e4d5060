//! Engine configuration.

use std::num::NonZeroUsize;
use std::time::Duration;

use crate::constants::DEFAULT_LEASE_TIMEOUT_MS;
use crate::patch::DiffOptions;

/// How many revisions of each document the store keeps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RetentionPolicy {
    /// Keep the full history.
    #[default]
    Unbounded,
    /// Keep only the newest `n` revisions.
    KeepLatest(NonZeroUsize),
}

impl RetentionPolicy {
    /// `None` means unbounded.
    pub fn from_max_revisions(max: Option<usize>) -> Self {
        match max.and_then(NonZeroUsize::new) {
            Some(n) => RetentionPolicy::KeepLatest(n),
            None => RetentionPolicy::Unbounded,
        }
    }

    /// Oldest version to keep once `latest` has been written.
    pub fn floor(&self, latest: u64) -> Option<u64> {
        match self {
            RetentionPolicy::Unbounded => None,
            RetentionPolicy::KeepLatest(n) => {
                let keep = n.get() as u64;
                (latest + 1 > keep).then(|| latest + 1 - keep)
            }
        }
    }
}

/// Tunables shared by the store, coordinator and service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Lifetime of a mutation lease before it may be reclaimed.
    pub lease_timeout: Duration,
    pub retention: RetentionPolicy,
    /// Options for diffs computed from submitted full content.
    pub diff: DiffOptions,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lease_timeout: Duration::from_millis(DEFAULT_LEASE_TIMEOUT_MS),
            retention: RetentionPolicy::Unbounded,
            diff: DiffOptions::default(),
        }
    }
}
