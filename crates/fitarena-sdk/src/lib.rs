//! FitArena SDK - the composed arena service
//!
//! [`ArenaService`] wires the challenge store, activity provider, progress
//! cache and minting ledger behind the engine's three public operations:
//! `resolve`, `refresh_progress` and `claim`. Raw caller input is
//! validated and canonicalized here, before any I/O, and a terminal
//! challenge short-circuits `resolve` without recomputation.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use fitarena_activity::ActivityProvider;
use fitarena_cache::{ProgressCache, ProgressStore};
use fitarena_engine::{
    ChallengeLocks, ChallengeStore, RefreshOutcome, ResolutionEngine, ResolveOutcome,
};
use fitarena_settlement::{ClaimEngine, ClaimOutcome, MintingLedger};
use fitarena_types::{
    AccountId, ActivityKind, ArenaConfig, ArenaError, Challenge, ChallengeId, Result,
};

/// Report returned by [`ArenaService::resolve`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolveReport {
    pub challenge_id: ChallengeId,
    pub outcome: ResolveOutcome,
    /// Challenge snapshot after the operation
    pub challenge: Challenge,
}

/// Report returned by [`ArenaService::refresh_progress`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshReport {
    pub challenge_id: ChallengeId,
    pub outcome: RefreshOutcome,
    /// Challenge snapshot after the operation
    pub challenge: Challenge,
}

/// Report returned by [`ArenaService::claim`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimReport {
    pub challenge_id: ChallengeId,
    pub claimant: AccountId,
    pub outcome: ClaimOutcome,
}

/// The arena challenge engine behind one façade.
pub struct ArenaService {
    store: Arc<dyn ChallengeStore>,
    resolution: ResolutionEngine,
    claims: ClaimEngine,
    config: ArenaConfig,
}

impl ArenaService {
    /// Compose the engine from its collaborators. The configuration is
    /// validated here so a bad kind table or refund rate never reaches an
    /// operation.
    pub fn new(
        store: Arc<dyn ChallengeStore>,
        provider: Arc<dyn ActivityProvider>,
        ledger: Arc<dyn MintingLedger>,
        cache_store: Arc<dyn ProgressStore>,
        config: ArenaConfig,
    ) -> Result<Self> {
        if let Err(errors) = config.validate() {
            return Err(ArenaError::invalid_input("config", errors.join("; ")));
        }

        let cache = Arc::new(ProgressCache::new(
            cache_store,
            config.progress_cache_ttl_secs,
        ));
        let locks = Arc::new(ChallengeLocks::new());
        let resolution = ResolutionEngine::new(
            store.clone(),
            provider,
            cache,
            locks.clone(),
            config.clone(),
        );
        let claims = ClaimEngine::new(store.clone(), ledger, locks, config.clone());

        Ok(Self {
            store,
            resolution,
            claims,
            config,
        })
    }

    /// Canonicalize a free-text activity kind ("corsa", "Nuoto",
    /// "crossfit", ...) the way challenge intake does.
    pub fn canonicalize_kind(&self, input: &str) -> Result<ActivityKind> {
        self.config
            .kinds
            .canonicalize(input)
            .ok_or_else(|| ArenaError::UnknownActivityKind {
                input: input.to_string(),
            })
    }

    /// Determine winner/draw for a challenge. A challenge that already
    /// reached an outcome is returned as-is, without recomputation.
    pub async fn resolve(&self, challenge_id: &str) -> Result<ResolveReport> {
        let id = ChallengeId::from_input(challenge_id)?;

        let challenge = self.load(&id).await?;
        if challenge.status.is_terminal() {
            return Ok(ResolveReport {
                challenge_id: id,
                outcome: ResolveOutcome::Unchanged {
                    status: challenge.status,
                },
                challenge,
            });
        }

        let outcome = self.resolution.resolve(&id).await?;
        let challenge = self.load(&id).await?;
        Ok(ResolveReport {
            challenge_id: id,
            outcome,
            challenge,
        })
    }

    /// Recompute and persist both sides' progress.
    pub async fn refresh_progress(&self, challenge_id: &str) -> Result<RefreshReport> {
        let id = ChallengeId::from_input(challenge_id)?;

        let outcome = self.resolution.refresh_progress(&id).await?;
        let challenge = self.load(&id).await?;
        Ok(RefreshReport {
            challenge_id: id,
            outcome,
            challenge,
        })
    }

    /// Convert a resolved/draw outcome into an on-ledger payout, exactly
    /// once per participant.
    pub async fn claim(&self, challenge_id: &str, claimant: &str) -> Result<ClaimReport> {
        let id = ChallengeId::from_input(challenge_id)?;
        let claimant = AccountId::parse(claimant)?;

        let outcome = self.claims.claim(&id, &claimant).await?;
        Ok(ClaimReport {
            challenge_id: id,
            claimant,
            outcome,
        })
    }

    async fn load(&self, id: &ChallengeId) -> Result<Challenge> {
        self.store
            .get(id)
            .await?
            .ok_or(ArenaError::ChallengeNotFound { challenge_id: *id })
    }
}
