//! Per-challenge mutual exclusion
//!
//! The challenge record is the one resource that must not be mutated by
//! two operations at once: resolution and claim settlement both read,
//! decide, then write. A concurrent caller for the same challenge id is
//! rejected with a state-conflict instead of racing.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use fitarena_types::{ArenaError, ChallengeId, Result};

/// Registry of per-challenge-id locks.
#[derive(Default)]
pub struct ChallengeLocks {
    locks: DashMap<ChallengeId, Arc<Mutex<()>>>,
}

/// Held for the duration of one resolution or claim operation.
pub struct ChallengeGuard {
    _guard: OwnedMutexGuard<()>,
}

impl ChallengeLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for `id`, or reject with `OperationInProgress`
    /// when another operation holds it.
    pub fn try_guard(&self, id: ChallengeId) -> Result<ChallengeGuard> {
        let lock = self
            .locks
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = lock
            .try_lock_owned()
            .map_err(|_| ArenaError::OperationInProgress { challenge_id: id })?;
        Ok(ChallengeGuard { _guard: guard })
    }
}
