//! FitArena Cache - short-TTL memoization of aggregated progress
//!
//! Bounds repeated external activity fetches when progress-refresh and
//! resolution run close together. The cache is an injected abstraction
//! over a pluggable [`ProgressStore`], never a hidden process-wide
//! singleton. Entries expire lazily on read; there is no background sweep.
//!
//! Concurrent writers race benignly: cached values are idempotent
//! recomputations of the same external truth, so last-write-wins.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use fitarena_types::{AccountId, ActivityKind};

/// Cache key: participant, kind, and the raw window bounds as supplied by
/// the caller. `None` is the sentinel for an open-ended bound.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProgressKey {
    pub participant: AccountId,
    pub kind: ActivityKind,
    pub window_start: Option<DateTime<Utc>>,
    pub window_end: Option<DateTime<Utc>>,
}

/// A cached progress figure and when it was computed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CachedProgress {
    pub progress: f64,
    pub fetched_at: DateTime<Utc>,
}

/// Pluggable backing store for cached progress.
#[async_trait::async_trait]
pub trait ProgressStore: Send + Sync {
    async fn load(&self, key: &ProgressKey) -> Option<CachedProgress>;
    async fn save(&self, key: ProgressKey, value: CachedProgress);
}

/// In-memory backing store behind an async RwLock.
pub struct InMemoryProgressStore {
    entries: Arc<tokio::sync::RwLock<HashMap<ProgressKey, CachedProgress>>>,
}

impl InMemoryProgressStore {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(tokio::sync::RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryProgressStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ProgressStore for InMemoryProgressStore {
    async fn load(&self, key: &ProgressKey) -> Option<CachedProgress> {
        self.entries.read().await.get(key).copied()
    }

    async fn save(&self, key: ProgressKey, value: CachedProgress) {
        self.entries.write().await.insert(key, value);
    }
}

/// TTL cache over a [`ProgressStore`].
pub struct ProgressCache {
    store: Arc<dyn ProgressStore>,
    ttl: Duration,
}

impl ProgressCache {
    pub fn new(store: Arc<dyn ProgressStore>, ttl_secs: u64) -> Self {
        Self {
            store,
            ttl: Duration::seconds(ttl_secs as i64),
        }
    }

    /// Look up fresh progress; entries older than the TTL are absent.
    pub async fn get(&self, key: &ProgressKey) -> Option<f64> {
        let entry = self.store.load(key).await?;
        if Utc::now() - entry.fetched_at > self.ttl {
            return None;
        }
        debug!(participant = %key.participant, kind = %key.kind, "progress cache hit");
        Some(entry.progress)
    }

    /// Record freshly computed progress, stamped now.
    pub async fn put(&self, key: ProgressKey, progress: f64) {
        self.store
            .save(
                key,
                CachedProgress {
                    progress,
                    fetched_at: Utc::now(),
                },
            )
            .await;
    }
}
