//! Engine configuration
//!
//! Centralized configuration for the challenge engine with production
//! defaults, environment-variable overrides, and load-time validation.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::KindMatcher;

/// Main engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArenaConfig {
    /// Challenge length applied when a record carries no duration
    pub default_duration_days: i64,
    /// Minutes subtracted from the window start when filtering activities
    /// (tolerates clock skew around the first qualifying session); never
    /// persisted into the window itself
    pub start_grace_minutes: i64,
    /// Progress cache entry lifetime in seconds
    pub progress_cache_ttl_secs: u64,
    /// Run sessions shorter than this many meters are noise, not progress
    pub min_run_distance_meters: f64,
    /// Swim sessions shorter than this many meters are noise, not progress
    pub min_swim_distance_meters: f64,
    /// Fraction of stake refunded to each side of a draw; kept below 1 to
    /// disincentivize drawn outcomes
    pub draw_refund_rate: Decimal,
    /// Refuse progress refresh for a participant with no provider
    /// authorization and zero observed activities
    pub require_provider_auth: bool,
    /// Free-text to canonical activity-kind mapping table
    pub kinds: KindMatcher,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            default_duration_days: 7,
            start_grace_minutes: 30,
            progress_cache_ttl_secs: 120, // 2 minutes
            min_run_distance_meters: 500.0,
            min_swim_distance_meters: 25.0,
            draw_refund_rate: dec!(0.5),
            require_provider_auth: true,
            kinds: KindMatcher::default(),
        }
    }
}

impl ArenaConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(days) = env_parse("FITARENA_DEFAULT_DURATION_DAYS") {
            config.default_duration_days = days;
        }
        if let Some(minutes) = env_parse("FITARENA_START_GRACE_MINUTES") {
            config.start_grace_minutes = minutes;
        }
        if let Some(secs) = env_parse("FITARENA_CACHE_TTL_SECS") {
            config.progress_cache_ttl_secs = secs;
        }
        if let Some(rate) = env_parse("FITARENA_DRAW_REFUND_RATE") {
            config.draw_refund_rate = rate;
        }
        if let Some(required) = env_parse("FITARENA_REQUIRE_PROVIDER_AUTH") {
            config.require_provider_auth = required;
        }

        config
    }

    /// Validate the configuration, including the kind mapping table.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.default_duration_days <= 0 {
            errors.push("default_duration_days must be positive".to_string());
        }
        if self.start_grace_minutes < 0 {
            errors.push("start_grace_minutes must not be negative".to_string());
        }
        if self.progress_cache_ttl_secs == 0 {
            errors.push("progress_cache_ttl_secs must be positive".to_string());
        }
        if self.min_run_distance_meters < 0.0 || self.min_swim_distance_meters < 0.0 {
            errors.push("minimum tracked distances must not be negative".to_string());
        }
        if self.draw_refund_rate <= Decimal::ZERO || self.draw_refund_rate > Decimal::ONE {
            errors.push(format!(
                "draw_refund_rate must lie in (0, 1], got {}",
                self.draw_refund_rate
            ));
        }
        errors.extend(self.kinds.validate());

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
