//! Challenge store interface
//!
//! Challenges are created and matched by an external process; this engine
//! only reads them and writes partial-field patches. The store enforces the
//! forward-only state machine at the patch boundary, so a buggy caller can
//! never resurrect a resolved or claimed challenge.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use fitarena_types::{ArenaError, Challenge, ChallengeId, ChallengePatch, Result};

/// Persistence collaborator for challenge records.
#[async_trait::async_trait]
pub trait ChallengeStore: Send + Sync {
    async fn get(&self, id: &ChallengeId) -> Result<Option<Challenge>>;

    /// Apply a partial-field update. Fails with a state-conflict when the
    /// patch would move the status backward.
    async fn patch(&self, id: &ChallengeId, patch: ChallengePatch) -> Result<()>;
}

/// In-memory challenge store for tests and local runs.
pub struct InMemoryChallengeStore {
    challenges: Arc<RwLock<HashMap<ChallengeId, Challenge>>>,
}

impl InMemoryChallengeStore {
    pub fn new() -> Self {
        Self {
            challenges: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Seed a challenge record (models the external matching process).
    pub async fn insert(&self, challenge: Challenge) {
        self.challenges
            .write()
            .await
            .insert(challenge.id, challenge);
    }
}

impl Default for InMemoryChallengeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ChallengeStore for InMemoryChallengeStore {
    async fn get(&self, id: &ChallengeId) -> Result<Option<Challenge>> {
        Ok(self.challenges.read().await.get(id).cloned())
    }

    async fn patch(&self, id: &ChallengeId, patch: ChallengePatch) -> Result<()> {
        let mut challenges = self.challenges.write().await;
        let challenge = challenges
            .get_mut(id)
            .ok_or(ArenaError::ChallengeNotFound { challenge_id: *id })?;
        patch.apply_to(challenge)
    }
}
