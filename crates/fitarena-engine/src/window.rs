//! Challenge window resolution
//!
//! Derives a challenge's effective start/end from stored fields and
//! configured defaults. The configured grace period widens the *filter*
//! only; the persisted window never moves because of it.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use fitarena_types::{Activity, ArenaConfig, ArenaError, Challenge, Result};

/// A challenge's effective competition interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChallengeWindow {
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub duration_days: i64,
}

impl ChallengeWindow {
    /// Lower bound used when filtering activities for inclusion. Sessions
    /// started up to `start_grace_minutes` before the nominal window still
    /// count, tolerating clock skew between challenge creation and the
    /// participant's first qualifying session.
    pub fn activity_filter_start(&self, config: &ArenaConfig) -> DateTime<Utc> {
        self.start_at - Duration::minutes(config.start_grace_minutes)
    }

    pub fn has_elapsed(&self, now: DateTime<Utc>) -> bool {
        now > self.end_at
    }
}

/// Derive the effective window for a challenge.
///
/// `start_at` falls back to creation time; `duration_days` to the
/// configured default; `end_at` to `start_at + duration_days`. A challenge
/// with neither start nor creation time is unresolvable: a domain error,
/// never a silent default.
pub fn resolve_window(challenge: &Challenge, config: &ArenaConfig) -> Result<ChallengeWindow> {
    let start_at = challenge
        .start_at
        .or(challenge.created_at)
        .ok_or(ArenaError::WindowUnresolvable {
            challenge_id: challenge.id,
        })?;
    let duration_days = challenge
        .duration_days
        .unwrap_or(config.default_duration_days);
    let end_at = challenge
        .end_at
        .unwrap_or(start_at + Duration::days(duration_days));

    Ok(ChallengeWindow {
        start_at,
        end_at,
        duration_days,
    })
}

/// Keep only activities inside the window (grace applied to the start).
/// Records without a usable timestamp cannot be placed and are dropped.
pub fn filter_to_window(
    activities: Vec<Activity>,
    window: &ChallengeWindow,
    config: &ArenaConfig,
) -> Vec<Activity> {
    let from = window.activity_filter_start(config);
    activities
        .into_iter()
        .filter(|a| {
            a.occurred_at
                .map(|at| at >= from && at <= window.end_at)
                .unwrap_or(false)
        })
        .collect()
}
