//! Activity provider interface
//!
//! The provider owns activities; the engine only reads them. A missing
//! authorization is a distinct, non-fatal signal: it feeds the
//! `missing_tokens`/`partial` refresh outcomes instead of erroring.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::RwLock;

use fitarena_types::{AccountId, Activity, Result};

/// Read-only adapter onto the external exercise-tracking service.
#[async_trait::async_trait]
pub trait ActivityProvider: Send + Sync {
    /// Every activity the provider holds for the participant.
    async fn list_activities(&self, participant: &AccountId) -> Result<Vec<Activity>>;

    /// Whether the participant has authorized activity access.
    async fn has_authorization(&self, participant: &AccountId) -> Result<bool>;
}

/// In-memory provider for tests and local runs.
///
/// Counts `list_activities` calls per participant so tests can assert the
/// cache short-circuits external fetches.
pub struct InMemoryActivityProvider {
    activities: Arc<RwLock<HashMap<AccountId, Vec<Activity>>>>,
    authorized: Arc<RwLock<HashSet<AccountId>>>,
    fetch_counts: Arc<RwLock<HashMap<AccountId, u64>>>,
}

impl InMemoryActivityProvider {
    pub fn new() -> Self {
        Self {
            activities: Arc::new(RwLock::new(HashMap::new())),
            authorized: Arc::new(RwLock::new(HashSet::new())),
            fetch_counts: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Seed activities and mark the participant authorized.
    pub async fn seed(&self, participant: AccountId, activities: Vec<Activity>) {
        self.authorized.write().await.insert(participant.clone());
        self.activities.write().await.insert(participant, activities);
    }

    /// Mark a participant authorized without seeding any activities.
    pub async fn authorize(&self, participant: AccountId) {
        self.authorized.write().await.insert(participant);
    }

    pub async fn fetch_count(&self, participant: &AccountId) -> u64 {
        self.fetch_counts
            .read()
            .await
            .get(participant)
            .copied()
            .unwrap_or(0)
    }
}

impl Default for InMemoryActivityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ActivityProvider for InMemoryActivityProvider {
    async fn list_activities(&self, participant: &AccountId) -> Result<Vec<Activity>> {
        *self
            .fetch_counts
            .write()
            .await
            .entry(participant.clone())
            .or_insert(0) += 1;
        Ok(self
            .activities
            .read()
            .await
            .get(participant)
            .cloned()
            .unwrap_or_default())
    }

    async fn has_authorization(&self, participant: &AccountId) -> Result<bool> {
        Ok(self.authorized.read().await.contains(participant))
    }
}
