//! First-to-goal resolution
//!
//! Two operations mutate a contested challenge: `refresh_progress`
//! recomputes and persists both sides' progress, and `resolve` decides
//! winner/draw from first-crossing timestamps. Both fetch the two
//! participants concurrently and write the store exactly once, after both
//! sides are known, so a reader never observes a half-updated pair.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use fitarena_activity::{aggregate, aggregate_with_finish, ActivityProvider, Aggregation};
use fitarena_cache::{ProgressCache, ProgressKey};
use fitarena_types::{
    AccountId, ActivityKind, ArenaConfig, ArenaError, Challenge, ChallengeId, ChallengePatch,
    ChallengeStatus, Result,
};

use crate::{filter_to_window, resolve_window, ChallengeLocks, ChallengeStore, ChallengeWindow};

/// Outcome of a progress refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RefreshOutcome {
    /// Challenge is not contested; nothing recomputed
    Skipped { status: ChallengeStatus },
    /// Both sides served from cache; no fetch, no persistence
    Cached {
        creator_progress: f64,
        opponent_progress: f64,
    },
    /// Fresh computation persisted, no blocking issue
    Updated {
        creator_progress: f64,
        opponent_progress: f64,
    },
    /// Persisted, but incomplete: listed participants have no provider
    /// authorization and reported zero activities
    Partial {
        creator_progress: f64,
        opponent_progress: f64,
        unauthorized: Vec<AccountId>,
    },
    /// Refusal: authorization is required by configuration and absent for
    /// the listed participants; nothing persisted
    MissingTokens { unauthorized: Vec<AccountId> },
}

/// Outcome of a resolution attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ResolveOutcome {
    /// Challenge is not contested; current status echoed
    Unchanged { status: ChallengeStatus },
    /// Neither side has reached the goal; progress persisted, status kept
    Unresolved {
        creator_progress: f64,
        opponent_progress: f64,
    },
    /// One side crossed the goal first
    Resolved {
        winner: AccountId,
        creator_progress: f64,
        opponent_progress: f64,
        finished_at: DateTime<Utc>,
    },
    /// Both sides crossed at the identical instant
    Draw {
        creator_progress: f64,
        opponent_progress: f64,
        finished_at: DateTime<Utc>,
    },
}

/// One participant's progress reading during a refresh.
struct SideReading {
    account: AccountId,
    progress: f64,
    from_cache: bool,
    /// No authorization and zero observed activities
    degraded: bool,
}

/// Drives progress computation and winner determination.
pub struct ResolutionEngine {
    store: Arc<dyn ChallengeStore>,
    provider: Arc<dyn ActivityProvider>,
    cache: Arc<ProgressCache>,
    locks: Arc<ChallengeLocks>,
    config: ArenaConfig,
}

impl ResolutionEngine {
    pub fn new(
        store: Arc<dyn ChallengeStore>,
        provider: Arc<dyn ActivityProvider>,
        cache: Arc<ProgressCache>,
        locks: Arc<ChallengeLocks>,
        config: ArenaConfig,
    ) -> Self {
        Self {
            store,
            provider,
            cache,
            locks,
            config,
        }
    }

    /// Recompute and persist both sides' progress for a contested
    /// challenge. Never transitions status.
    pub async fn refresh_progress(&self, id: &ChallengeId) -> Result<RefreshOutcome> {
        let _guard = self.locks.try_guard(*id)?;

        let challenge = self
            .store
            .get(id)
            .await?
            .ok_or(ArenaError::ChallengeNotFound { challenge_id: *id })?;
        if !challenge.status.is_contested() {
            return Ok(RefreshOutcome::Skipped {
                status: challenge.status,
            });
        }
        let opponent = contested_opponent(&challenge)?;
        let window = resolve_window(&challenge, &self.config)?;

        let (creator_side, opponent_side) = tokio::join!(
            self.read_side(&challenge.creator, challenge.kind, &window),
            self.read_side(&opponent, challenge.kind, &window),
        );

        if creator_side.from_cache && opponent_side.from_cache {
            debug!(challenge = %id, "both sides served from progress cache");
            return Ok(RefreshOutcome::Cached {
                creator_progress: creator_side.progress,
                opponent_progress: opponent_side.progress,
            });
        }

        let unauthorized: Vec<AccountId> = [&creator_side, &opponent_side]
            .into_iter()
            .filter(|side| side.degraded)
            .map(|side| side.account.clone())
            .collect();

        if !unauthorized.is_empty() && self.config.require_provider_auth {
            warn!(
                challenge = %id,
                participants = unauthorized.len(),
                "refusing progress refresh: provider authorization missing"
            );
            return Ok(RefreshOutcome::MissingTokens { unauthorized });
        }

        self.store
            .patch(
                id,
                ChallengePatch {
                    start_at: Some(window.start_at),
                    end_at: Some(window.end_at),
                    creator_progress: Some(creator_side.progress),
                    opponent_progress: Some(opponent_side.progress),
                    ..Default::default()
                },
            )
            .await?;

        if unauthorized.is_empty() {
            Ok(RefreshOutcome::Updated {
                creator_progress: creator_side.progress,
                opponent_progress: opponent_side.progress,
            })
        } else {
            warn!(
                challenge = %id,
                participants = unauthorized.len(),
                "progress persisted with unauthorized participants"
            );
            Ok(RefreshOutcome::Partial {
                creator_progress: creator_side.progress,
                opponent_progress: opponent_side.progress,
                unauthorized,
            })
        }
    }

    /// Decide winner/draw for a contested challenge with first-to-goal
    /// semantics. Terminal outcomes persist status, winner and timestamps
    /// atomically with both progress figures.
    pub async fn resolve(&self, id: &ChallengeId) -> Result<ResolveOutcome> {
        let _guard = self.locks.try_guard(*id)?;

        let challenge = self
            .store
            .get(id)
            .await?
            .ok_or(ArenaError::ChallengeNotFound { challenge_id: *id })?;
        if !challenge.status.is_contested() {
            return Ok(ResolveOutcome::Unchanged {
                status: challenge.status,
            });
        }
        let opponent = contested_opponent(&challenge)?;
        let window = resolve_window(&challenge, &self.config)?;

        let (creator_agg, opponent_agg) = tokio::join!(
            self.finish_side(&challenge.creator, &challenge, &window),
            self.finish_side(&opponent, &challenge, &window),
        );

        let progress_patch = ChallengePatch {
            start_at: Some(window.start_at),
            end_at: Some(window.end_at),
            creator_progress: Some(creator_agg.progress),
            opponent_progress: Some(opponent_agg.progress),
            ..Default::default()
        };

        match (creator_agg.finished_at, opponent_agg.finished_at) {
            (None, None) => {
                self.store.patch(id, progress_patch).await?;
                if window.has_elapsed(Utc::now()) {
                    // Known gap: no finisher means no natural terminal
                    // state, even after the window closes. Auto-resolution
                    // is a pending product decision.
                    warn!(challenge = %id, "window elapsed with no finisher; challenge stays contested");
                }
                Ok(ResolveOutcome::Unresolved {
                    creator_progress: creator_agg.progress,
                    opponent_progress: opponent_agg.progress,
                })
            }
            (Some(creator_fin), Some(opponent_fin)) if creator_fin == opponent_fin => {
                self.store
                    .patch(
                        id,
                        ChallengePatch {
                            status: Some(ChallengeStatus::Draw),
                            resolved_at: Some(Utc::now()),
                            ..progress_patch
                        },
                    )
                    .await?;
                info!(challenge = %id, finished_at = %creator_fin, "challenge drawn");
                Ok(ResolveOutcome::Draw {
                    creator_progress: creator_agg.progress,
                    opponent_progress: opponent_agg.progress,
                    finished_at: creator_fin,
                })
            }
            (creator_fin, opponent_fin) => {
                let (winner, finished_at) = match (creator_fin, opponent_fin) {
                    (Some(a), Some(b)) => {
                        if a < b {
                            (challenge.creator.clone(), a)
                        } else {
                            (opponent.clone(), b)
                        }
                    }
                    (Some(a), None) => (challenge.creator.clone(), a),
                    (None, Some(b)) => (opponent.clone(), b),
                    (None, None) => unreachable!("handled above"),
                };
                self.store
                    .patch(
                        id,
                        ChallengePatch {
                            status: Some(ChallengeStatus::Resolved),
                            winner: Some(winner.clone()),
                            resolved_at: Some(Utc::now()),
                            ..progress_patch
                        },
                    )
                    .await?;
                info!(challenge = %id, winner = %winner, finished_at = %finished_at, "challenge resolved");
                Ok(ResolveOutcome::Resolved {
                    winner,
                    creator_progress: creator_agg.progress,
                    opponent_progress: opponent_agg.progress,
                    finished_at,
                })
            }
        }
    }

    /// Cache-then-aggregate for one side of a refresh.
    async fn read_side(
        &self,
        account: &AccountId,
        kind: ActivityKind,
        window: &ChallengeWindow,
    ) -> SideReading {
        let key = progress_key(account, kind, window);
        if let Some(progress) = self.cache.get(&key).await {
            return SideReading {
                account: account.clone(),
                progress,
                from_cache: true,
                degraded: false,
            };
        }

        let activities = self.fetch_activities(account).await;
        let degraded = if activities.is_empty() {
            !self.authorized(account).await
        } else {
            false
        };
        let in_window = filter_to_window(activities, window, &self.config);
        let progress = aggregate(&in_window, kind, &self.config);
        if !degraded {
            self.cache.put(key, progress).await;
        }
        SideReading {
            account: account.clone(),
            progress,
            from_cache: false,
            degraded,
        }
    }

    /// Goal-aware aggregation for one side of a resolution. Always fetches
    /// fresh (the cache holds plain progress, not crossing timestamps) and
    /// repopulates the cache so a refresh arriving right after is served
    /// locally.
    async fn finish_side(
        &self,
        account: &AccountId,
        challenge: &Challenge,
        window: &ChallengeWindow,
    ) -> Aggregation {
        let activities = self.fetch_activities(account).await;
        let in_window = filter_to_window(activities, window, &self.config);
        let agg = aggregate_with_finish(&in_window, challenge.kind, challenge.goal, &self.config);
        self.cache
            .put(progress_key(account, challenge.kind, window), agg.progress)
            .await;
        agg
    }

    /// Provider transport failures are a degraded data condition, not an
    /// exception: the side reads as zero activities.
    async fn fetch_activities(&self, account: &AccountId) -> Vec<fitarena_types::Activity> {
        match self.provider.list_activities(account).await {
            Ok(activities) => activities,
            Err(e) => {
                warn!(account = %account, error = %e, "activity provider unreachable; reading zero activities");
                Vec::new()
            }
        }
    }

    async fn authorized(&self, account: &AccountId) -> bool {
        match self.provider.has_authorization(account).await {
            Ok(authorized) => authorized,
            Err(e) => {
                warn!(account = %account, error = %e, "authorization lookup failed; treating as unauthorized");
                false
            }
        }
    }
}

fn progress_key(account: &AccountId, kind: ActivityKind, window: &ChallengeWindow) -> ProgressKey {
    ProgressKey {
        participant: account.clone(),
        kind,
        window_start: Some(window.start_at),
        window_end: Some(window.end_at),
    }
}

/// A contested challenge always carries an opponent; anything else is a
/// corrupt record.
fn contested_opponent(challenge: &Challenge) -> Result<AccountId> {
    challenge.opponent.clone().ok_or_else(|| {
        ArenaError::internal(format!(
            "challenge {} is {} but has no opponent",
            challenge.id, challenge.status
        ))
    })
}
