//! The challenge record and its status state machine

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AccountId, ActivityKind, ArenaError, ChallengeId, Result};

/// Challenge lifecycle states.
///
/// Transitions only move forward; a resolved or claimed challenge is never
/// resurrected. `Matched` and `Active` are formally one contested
/// super-state: the engine accepts either wherever it accepts the other
/// and never writes `Active` itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeStatus {
    /// Created, waiting for an opponent
    Open,
    /// Both participants locked in
    Matched,
    /// Contested; equivalent to `Matched` for every engine decision
    Active,
    /// One side reached the goal first
    Resolved,
    /// Both sides reached the goal at the identical instant
    Draw,
    /// Every eligible side has collected its payout
    Claimed,
}

impl ChallengeStatus {
    /// Whether the challenge is being contested (progress and resolution
    /// apply).
    pub fn is_contested(&self) -> bool {
        matches!(self, Self::Matched | Self::Active)
    }

    /// Whether an outcome exists and payouts may be claimed.
    pub fn is_payout_ready(&self) -> bool {
        matches!(self, Self::Resolved | Self::Draw)
    }

    /// Whether the challenge has reached an outcome (including fully
    /// claimed).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved | Self::Draw | Self::Claimed)
    }

    /// Valid transitions from this state
    pub fn valid_transitions(&self) -> Vec<ChallengeStatus> {
        match self {
            Self::Open => vec![Self::Matched],
            Self::Matched => vec![Self::Active, Self::Resolved, Self::Draw],
            Self::Active => vec![Self::Resolved, Self::Draw],
            Self::Resolved => vec![Self::Claimed],
            Self::Draw => vec![Self::Claimed],
            Self::Claimed => vec![],
        }
    }

    /// Check if transition to target state is valid
    pub fn can_transition_to(&self, target: ChallengeStatus) -> bool {
        self.valid_transitions().contains(&target)
    }
}

impl std::fmt::Display for ChallengeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Open => "open",
            Self::Matched => "matched",
            Self::Active => "active",
            Self::Resolved => "resolved",
            Self::Draw => "draw",
            Self::Claimed => "claimed",
        };
        write!(f, "{s}")
    }
}

/// Which side of a challenge a participant is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Creator,
    Opponent,
}

/// The unit of competition: a two-participant wager on who first
/// accumulates `goal` of a given activity kind within a time window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: ChallengeId,
    pub creator: AccountId,
    /// Set once the matching process (external) pairs an opponent
    pub opponent: Option<AccountId>,
    pub kind: ActivityKind,
    /// Target in the kind's unit (km, meters, or session count)
    pub goal: f64,
    /// Wager per side, denominated in reward tokens
    pub stake: Decimal,
    pub status: ChallengeStatus,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    pub duration_days: Option<i64>,
    pub creator_progress: f64,
    pub opponent_progress: f64,
    pub winner: Option<AccountId>,
    pub creator_claimed: bool,
    pub opponent_claimed: bool,
    pub resolved_at: Option<DateTime<Utc>>,
    /// Absent on records ingested from matching processes that predate
    /// creation-time tracking; the window resolver treats a challenge with
    /// neither start nor creation time as unresolvable
    pub created_at: Option<DateTime<Utc>>,
}

impl Challenge {
    /// Create an open challenge. Stake and goal must be positive.
    pub fn new(creator: AccountId, kind: ActivityKind, goal: f64, stake: Decimal) -> Result<Self> {
        if stake <= Decimal::ZERO {
            return Err(ArenaError::InvalidStake { provided: stake });
        }
        if !(goal > 0.0) {
            return Err(ArenaError::InvalidInput {
                field: "goal".to_string(),
                reason: format!("must be positive, got {goal}"),
            });
        }
        Ok(Self {
            id: ChallengeId::new(),
            creator,
            opponent: None,
            kind,
            goal,
            stake,
            status: ChallengeStatus::Open,
            start_at: None,
            end_at: None,
            duration_days: None,
            creator_progress: 0.0,
            opponent_progress: 0.0,
            winner: None,
            creator_claimed: false,
            opponent_claimed: false,
            resolved_at: None,
            created_at: Some(Utc::now()),
        })
    }

    /// Pair an opponent (the matching process lives outside this engine;
    /// this models its write).
    pub fn match_with(&mut self, opponent: AccountId) -> Result<()> {
        if !self.status.can_transition_to(ChallengeStatus::Matched) {
            return Err(ArenaError::InvalidStateTransition {
                from: self.status,
                to: ChallengeStatus::Matched,
            });
        }
        self.opponent = Some(opponent);
        self.status = ChallengeStatus::Matched;
        Ok(())
    }

    /// Which side `account` plays, if any.
    pub fn side_of(&self, account: &AccountId) -> Option<Side> {
        if &self.creator == account {
            Some(Side::Creator)
        } else if self.opponent.as_ref() == Some(account) {
            Some(Side::Opponent)
        } else {
            None
        }
    }

    pub fn is_participant(&self, account: &AccountId) -> bool {
        self.side_of(account).is_some()
    }

    pub fn claimed_on(&self, side: Side) -> bool {
        match side {
            Side::Creator => self.creator_claimed,
            Side::Opponent => self.opponent_claimed,
        }
    }

    pub fn progress_of(&self, side: Side) -> f64 {
        match side {
            Side::Creator => self.creator_progress,
            Side::Opponent => self.opponent_progress,
        }
    }
}

/// Partial-field update for a challenge record.
///
/// Everything the engine persists goes through one of these; fields left
/// `None` are untouched by the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChallengePatch {
    pub status: Option<ChallengeStatus>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    pub creator_progress: Option<f64>,
    pub opponent_progress: Option<f64>,
    pub winner: Option<AccountId>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub creator_claimed: Option<bool>,
    pub opponent_claimed: Option<bool>,
}

impl ChallengePatch {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.start_at.is_none()
            && self.end_at.is_none()
            && self.creator_progress.is_none()
            && self.opponent_progress.is_none()
            && self.winner.is_none()
            && self.resolved_at.is_none()
            && self.creator_claimed.is_none()
            && self.opponent_claimed.is_none()
    }

    /// Apply to a record in place. Status moves must be forward per the
    /// state machine; claim flags never revert.
    pub fn apply_to(&self, challenge: &mut Challenge) -> Result<()> {
        if let Some(status) = self.status {
            if status != challenge.status && !challenge.status.can_transition_to(status) {
                return Err(ArenaError::InvalidStateTransition {
                    from: challenge.status,
                    to: status,
                });
            }
            challenge.status = status;
        }
        if let Some(start_at) = self.start_at {
            challenge.start_at = Some(start_at);
        }
        if let Some(end_at) = self.end_at {
            challenge.end_at = Some(end_at);
        }
        if let Some(progress) = self.creator_progress {
            challenge.creator_progress = progress;
        }
        if let Some(progress) = self.opponent_progress {
            challenge.opponent_progress = progress;
        }
        if let Some(ref winner) = self.winner {
            challenge.winner = Some(winner.clone());
        }
        if let Some(resolved_at) = self.resolved_at {
            challenge.resolved_at = Some(resolved_at);
        }
        if let Some(claimed) = self.creator_claimed {
            challenge.creator_claimed = challenge.creator_claimed || claimed;
        }
        if let Some(claimed) = self.opponent_claimed {
            challenge.opponent_claimed = challenge.opponent_claimed || claimed;
        }
        Ok(())
    }
}
