//! Activity records and kind canonicalization
//!
//! Activities are owned by the external activity provider and read-only to
//! the engine. The provider reports the sport as free text; everything the
//! engine does with that text goes through an explicit [`KindMatcher`]
//! mapping table validated at configuration load, never scattered string
//! checks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single exercise session as reported by the activity provider.
///
/// Identity is the provider-assigned `id`; the engine de-duplicates on it.
/// `occurred_at` is `None` when the provider reported an unparsable or zero
/// timestamp; ordering-sensitive paths skip such records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Provider-assigned identifier
    pub id: String,
    /// Sport as reported by the provider, free text
    pub kind: String,
    /// Distance covered in meters
    pub distance_meters: f64,
    /// Moving time in seconds
    pub elapsed_seconds: u64,
    /// Start time of the session
    pub occurred_at: Option<DateTime<Utc>>,
}

/// Canonical challenge activity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityKind {
    /// Running; progress measured in kilometers
    Run,
    /// Swimming; progress measured in meters
    Swim,
    /// Gym sessions; progress measured in session count
    Gym,
}

impl ActivityKind {
    /// Unit label for progress in this kind
    pub fn unit(&self) -> &'static str {
        match self {
            Self::Run => "km",
            Self::Swim => "m",
            Self::Gym => "sessions",
        }
    }

    /// Display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Run => "Run",
            Self::Swim => "Swim",
            Self::Gym => "Gym",
        }
    }

    pub fn all() -> [ActivityKind; 3] {
        [Self::Run, Self::Swim, Self::Gym]
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Matching rule for one canonical kind.
///
/// `exact` is the allow-list of provider kind strings accepted verbatim
/// (compared case-insensitively); `substrings` are fuzzy tokens accepted
/// anywhere inside the reported kind. All patterns are stored lower-case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KindRule {
    pub kind: ActivityKind,
    pub exact: Vec<String>,
    pub substrings: Vec<String>,
}

/// Explicit mapping table from provider free-text kinds to canonical kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KindMatcher {
    rules: Vec<KindRule>,
}

impl Default for KindMatcher {
    fn default() -> Self {
        let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            rules: vec![
                KindRule {
                    kind: ActivityKind::Run,
                    exact: owned(&["run", "corsa", "trailrun", "virtualrun"]),
                    substrings: owned(&["run"]),
                },
                KindRule {
                    kind: ActivityKind::Swim,
                    exact: owned(&["swim", "nuoto", "openwaterswim"]),
                    substrings: owned(&["swim"]),
                },
                KindRule {
                    kind: ActivityKind::Gym,
                    exact: owned(&["gym", "palestra", "workout", "weighttraining", "crossfit"]),
                    substrings: owned(&["workout", "crossfit", "weight"]),
                },
            ],
        }
    }
}

impl KindMatcher {
    pub fn new(rules: Vec<KindRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[KindRule] {
        &self.rules
    }

    /// Canonicalize free-text input (challenge creation or provider kind)
    /// into a challenge kind. Exact names win over substring tokens.
    pub fn canonicalize(&self, input: &str) -> Option<ActivityKind> {
        let normalized = input.trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return None;
        }
        for rule in &self.rules {
            if rule.exact.iter().any(|e| e == &normalized) {
                return Some(rule.kind);
            }
        }
        for rule in &self.rules {
            if rule.substrings.iter().any(|s| normalized.contains(s.as_str())) {
                return Some(rule.kind);
            }
        }
        None
    }

    /// Whether a provider-reported kind string counts toward `kind`.
    pub fn matches(&self, kind: ActivityKind, reported: &str) -> bool {
        self.canonicalize(reported) == Some(kind)
    }

    /// Validate the table: every canonical kind has exactly one rule, every
    /// pattern is non-empty lower-case, and no exact name is claimed by two
    /// kinds. Run at configuration load.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for kind in ActivityKind::all() {
            let count = self.rules.iter().filter(|r| r.kind == kind).count();
            if count != 1 {
                errors.push(format!("kind {kind} must have exactly one rule, found {count}"));
            }
        }

        let mut seen_exact: Vec<(&str, ActivityKind)> = Vec::new();
        for rule in &self.rules {
            if rule.exact.is_empty() && rule.substrings.is_empty() {
                errors.push(format!("kind {} has no accepted patterns", rule.kind));
            }
            for pattern in rule.exact.iter().chain(rule.substrings.iter()) {
                if pattern.is_empty() {
                    errors.push(format!("kind {} has an empty pattern", rule.kind));
                } else if *pattern != pattern.to_ascii_lowercase() {
                    errors.push(format!("pattern '{pattern}' must be lower-case"));
                }
            }
            for exact in &rule.exact {
                if let Some((_, other)) = seen_exact.iter().find(|(p, k)| *p == exact.as_str() && *k != rule.kind) {
                    errors.push(format!("exact name '{exact}' claimed by both {other} and {}", rule.kind));
                }
                seen_exact.push((exact.as_str(), rule.kind));
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_synonyms() {
        let matcher = KindMatcher::default();
        assert_eq!(matcher.canonicalize("corsa"), Some(ActivityKind::Run));
        assert_eq!(matcher.canonicalize("Nuoto"), Some(ActivityKind::Swim));
        assert_eq!(matcher.canonicalize("swim"), Some(ActivityKind::Swim));
        assert_eq!(matcher.canonicalize("palestra"), Some(ActivityKind::Gym));
        assert_eq!(matcher.canonicalize("CrossFit"), Some(ActivityKind::Gym));
        assert_eq!(matcher.canonicalize("yoga"), None);
    }

    #[test]
    fn test_gym_fuzzy_substrings() {
        let matcher = KindMatcher::default();
        assert!(matcher.matches(ActivityKind::Gym, "WeightTraining"));
        assert!(matcher.matches(ActivityKind::Gym, "morning workout"));
        assert!(!matcher.matches(ActivityKind::Gym, "Run"));
    }

    #[test]
    fn test_provider_variants_match_case_insensitively() {
        let matcher = KindMatcher::default();
        assert!(matcher.matches(ActivityKind::Run, "TrailRun"));
        assert!(matcher.matches(ActivityKind::Run, "VIRTUALRUN"));
        assert!(matcher.matches(ActivityKind::Swim, "OpenWaterSwim"));
    }

    #[test]
    fn test_default_table_is_valid() {
        assert!(KindMatcher::default().validate().is_empty());
    }

    #[test]
    fn test_validate_rejects_duplicate_exact_names() {
        let mut matcher = KindMatcher::default();
        let mut rules = matcher.rules().to_vec();
        rules[0].exact.push("swim".to_string());
        matcher = KindMatcher::new(rules);
        assert!(!matcher.validate().is_empty());
    }

    #[test]
    fn test_kind_units() {
        assert_eq!(ActivityKind::Run.unit(), "km");
        assert_eq!(ActivityKind::Swim.unit(), "m");
        assert_eq!(ActivityKind::Gym.unit(), "sessions");
    }
}
