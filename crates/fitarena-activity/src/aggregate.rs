//! Progress aggregation
//!
//! Per-kind unit policy: Run contributes kilometers, Swim raw meters, Gym a
//! flat session count. Run and Swim sessions below the configured minimum
//! tracked distance are noise and contribute nothing. Activities are
//! de-duplicated by provider id before anything else.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fitarena_types::{Activity, ActivityKind, ArenaConfig};

/// Result of goal-aware aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
    /// Total accumulated progress in the kind's unit
    pub progress: f64,
    /// First instant accumulated progress reached the goal, if it did
    pub finished_at: Option<DateTime<Utc>>,
}

/// What a single activity contributes toward a challenge of `kind`, or
/// `None` when it does not qualify.
fn qualifying_delta(activity: &Activity, kind: ActivityKind, config: &ArenaConfig) -> Option<f64> {
    if !config.kinds.matches(kind, &activity.kind) {
        return None;
    }
    match kind {
        ActivityKind::Run => {
            if activity.distance_meters < config.min_run_distance_meters {
                None
            } else {
                Some(activity.distance_meters / 1000.0)
            }
        }
        ActivityKind::Swim => {
            if activity.distance_meters < config.min_swim_distance_meters {
                None
            } else {
                Some(activity.distance_meters)
            }
        }
        ActivityKind::Gym => Some(1.0),
    }
}

fn deduplicate<'a>(activities: &'a [Activity]) -> Vec<&'a Activity> {
    let mut seen: HashSet<&str> = HashSet::new();
    activities
        .iter()
        .filter(|a| seen.insert(a.id.as_str()))
        .collect()
}

/// Total progress of `activities` toward a challenge of `kind`.
pub fn aggregate(activities: &[Activity], kind: ActivityKind, config: &ArenaConfig) -> f64 {
    deduplicate(activities)
        .into_iter()
        .filter_map(|a| qualifying_delta(a, kind, config))
        .sum()
}

/// Goal-aware aggregation with first-crossing detection.
///
/// Activities are ordered ascending by occurrence time; records without a
/// usable timestamp are skipped. Progress accumulates incrementally and the
/// first instant the running total reaches `goal` is recorded, never
/// overwritten by later, larger sessions.
pub fn aggregate_with_finish(
    activities: &[Activity],
    kind: ActivityKind,
    goal: f64,
    config: &ArenaConfig,
) -> Aggregation {
    let mut timed: Vec<(&Activity, DateTime<Utc>)> = deduplicate(activities)
        .into_iter()
        .filter_map(|a| a.occurred_at.map(|at| (a, at)))
        .collect();
    timed.sort_by_key(|(_, at)| *at);

    let mut progress = 0.0;
    let mut finished_at = None;
    for (activity, at) in timed {
        let Some(delta) = qualifying_delta(activity, kind, config) else {
            continue;
        };
        progress += delta;
        if finished_at.is_none() && progress >= goal {
            finished_at = Some(at);
        }
    }

    Aggregation { progress, finished_at }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn cfg() -> ArenaConfig {
        ArenaConfig::default()
    }

    fn day(n: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, n, 8, 0, 0).unwrap()
    }

    fn activity(id: &str, kind: &str, meters: f64, at: Option<DateTime<Utc>>) -> Activity {
        Activity {
            id: id.to_string(),
            kind: kind.to_string(),
            distance_meters: meters,
            elapsed_seconds: 1800,
            occurred_at: at,
        }
    }

    #[test]
    fn test_run_unit_conversion() {
        let activities = vec![activity("1", "Run", 5000.0, Some(day(1)))];
        assert_eq!(aggregate(&activities, ActivityKind::Run, &cfg()), 5.0);
    }

    #[test]
    fn test_run_below_threshold_is_noise() {
        let activities = vec![activity("1", "Run", 400.0, Some(day(1)))];
        assert_eq!(aggregate(&activities, ActivityKind::Run, &cfg()), 0.0);
    }

    #[test]
    fn test_swim_contributes_raw_meters() {
        let activities = vec![
            activity("1", "Swim", 750.0, Some(day(1))),
            activity("2", "nuoto", 250.0, Some(day(2))),
        ];
        assert_eq!(aggregate(&activities, ActivityKind::Swim, &cfg()), 1000.0);
    }

    #[test]
    fn test_gym_is_a_flat_session_count() {
        let activities = vec![
            activity("1", "WeightTraining", 0.0, Some(day(1))),
            activity("2", "Crossfit", 0.0, Some(day(2))),
            activity("3", "Run", 5000.0, Some(day(3))),
        ];
        assert_eq!(aggregate(&activities, ActivityKind::Gym, &cfg()), 2.0);
    }

    #[test]
    fn test_duplicate_provider_ids_count_once() {
        let activities = vec![
            activity("1", "Run", 5000.0, Some(day(1))),
            activity("1", "Run", 5000.0, Some(day(1))),
        ];
        assert_eq!(aggregate(&activities, ActivityKind::Run, &cfg()), 5.0);
    }

    #[test]
    fn test_first_crossing_determinism() {
        // +3 km on day 1, +4 km on day 2 against a 6 km goal: the crossing
        // happens with day 2's session.
        let activities = vec![
            activity("1", "Run", 3000.0, Some(day(1))),
            activity("2", "Run", 4000.0, Some(day(2))),
        ];
        let agg = aggregate_with_finish(&activities, ActivityKind::Run, 6.0, &cfg());
        assert_eq!(agg.progress, 7.0);
        assert_eq!(agg.finished_at, Some(day(2)));
    }

    #[test]
    fn test_first_crossing_survives_unsorted_input() {
        let activities = vec![
            activity("2", "Run", 4000.0, Some(day(2))),
            activity("1", "Run", 3000.0, Some(day(1))),
        ];
        let agg = aggregate_with_finish(&activities, ActivityKind::Run, 6.0, &cfg());
        assert_eq!(agg.finished_at, Some(day(2)));
    }

    #[test]
    fn test_finish_never_overwritten_by_larger_delta() {
        // Goal crossed on day 2; day 3 is the largest single session but
        // must not move the finish.
        let activities = vec![
            activity("1", "Run", 3000.0, Some(day(1))),
            activity("2", "Run", 3000.0, Some(day(2))),
            activity("3", "Run", 20000.0, Some(day(3))),
        ];
        let agg = aggregate_with_finish(&activities, ActivityKind::Run, 6.0, &cfg());
        assert_eq!(agg.finished_at, Some(day(2)));
    }

    #[test]
    fn test_untimed_activities_are_skipped_for_finish() {
        let activities = vec![
            activity("1", "Run", 3000.0, None),
            activity("2", "Run", 4000.0, Some(day(2))),
        ];
        let agg = aggregate_with_finish(&activities, ActivityKind::Run, 6.0, &cfg());
        assert_eq!(agg.progress, 4.0);
        assert_eq!(agg.finished_at, None);
    }

    #[test]
    fn test_goal_not_reached_leaves_no_finish() {
        let activities = vec![activity("1", "Run", 3000.0, Some(day(1)))];
        let agg = aggregate_with_finish(&activities, ActivityKind::Run, 6.0, &cfg());
        assert_eq!(agg.progress, 3.0);
        assert!(agg.finished_at.is_none());
    }
}
