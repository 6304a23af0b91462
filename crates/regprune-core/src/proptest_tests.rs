//! Property-based tests for the retention engine.
//!
//! These tests use proptest to verify invariants across many randomly generated inputs.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use proptest::prelude::*;

use crate::{retention, DecisionReason, RepositoryPolicy, TagRecord};

/// Fixed reference time so generated ages are reproducible.
fn reference_now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-06-30T00:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

/// Strategy for generating tag names.
fn tag_strategy() -> impl Strategy<Value = String> {
    "(v[0-9]{1,2}\\.[0-9]{1,2}\\.[0-9]{1,2}|latest|main|build-[0-9]{1,5}|[a-f0-9]{7})"
}

/// Strategy for generating ages in minutes, including future timestamps.
fn age_minutes_strategy() -> impl Strategy<Value = i64> {
    prop_oneof![
        -10_000i64..0,
        Just(0i64),
        0i64..(400 * 24 * 60),
    ]
}

/// Strategy for generating offsets in seconds (whole minutes, within ±14h).
fn offset_strategy() -> impl Strategy<Value = i32> {
    (-14 * 60..=14 * 60).prop_map(|minutes: i32| minutes * 60)
}

/// Strategy for generating tag record lists with unique tags.
fn records_strategy() -> impl Strategy<Value = Vec<TagRecord>> {
    prop::collection::vec((tag_strategy(), age_minutes_strategy(), offset_strategy()), 0..25)
        .prop_map(|entries| {
            let mut seen = HashSet::new();
            entries
                .into_iter()
                .filter(|(tag, _, _)| seen.insert(tag.clone()))
                .map(|(tag, age, offset)| {
                    let offset = chrono::FixedOffset::east_opt(offset).unwrap();
                    let created = (reference_now() - Duration::minutes(age)).with_timezone(&offset);
                    let digest = format!("sha256:{tag}");
                    TagRecord::new(tag, created, digest)
                })
                .collect()
        })
}

/// Strategy for generating policies.
fn policy_strategy() -> impl Strategy<Value = RepositoryPolicy> {
    (0usize..30, 0u32..400).prop_map(|(count, days)| RepositoryPolicy::new(count, days))
}

proptest! {
    /// A protected set at least as large as the input deletes nothing.
    #[test]
    fn prop_large_recent_count_deletes_nothing(
        records in records_strategy(),
        extra in 0usize..10,
        days in 0u32..400,
    ) {
        let policy = RepositoryPolicy::new(records.len() + extra, days);
        let decisions = retention::decide(&records, &policy, reference_now());
        prop_assert!(decisions.iter().all(|d| !d.delete));
    }

    /// Every input tag receives exactly one decision.
    #[test]
    fn prop_every_tag_accounted_for_once(
        records in records_strategy(),
        policy in policy_strategy(),
    ) {
        let decisions = retention::decide(&records, &policy, reference_now());
        prop_assert_eq!(decisions.len(), records.len());

        let input: HashSet<&str> = records.iter().map(|r| r.tag.as_str()).collect();
        let kept: HashSet<&str> = decisions
            .iter()
            .filter(|d| !d.delete)
            .map(|d| d.tag.as_str())
            .collect();
        let doomed: HashSet<&str> = decisions
            .iter()
            .filter(|d| d.delete)
            .map(|d| d.tag.as_str())
            .collect();

        prop_assert!(kept.is_disjoint(&doomed));
        let union: HashSet<&str> = kept.union(&doomed).copied().collect();
        prop_assert_eq!(union, input);
    }

    /// Nothing created at or after the threshold is ever deleted.
    #[test]
    fn prop_recent_records_never_deleted(
        records in records_strategy(),
        policy in policy_strategy(),
    ) {
        let now = reference_now();
        let threshold = policy.threshold(now);
        let decisions = retention::decide(&records, &policy, now);
        for decision in decisions {
            if decision.created.with_timezone(&Utc) >= threshold {
                prop_assert!(!decision.delete, "{} deleted despite being recent", decision.tag);
            }
        }
    }

    /// The protected set is exactly the newest `recent_count` tags.
    #[test]
    fn prop_protected_set_size(
        records in records_strategy(),
        policy in policy_strategy(),
    ) {
        let decisions = retention::decide(&records, &policy, reference_now());
        let protected = decisions
            .iter()
            .filter(|d| d.reason == DecisionReason::Protected)
            .count();
        prop_assert_eq!(protected, policy.recent_count.min(records.len()));
        prop_assert!(decisions
            .iter()
            .take(policy.recent_count)
            .all(|d| d.reason == DecisionReason::Protected));
    }

    /// Output is sorted newest first.
    #[test]
    fn prop_decisions_sorted_newest_first(
        records in records_strategy(),
        policy in policy_strategy(),
    ) {
        let decisions = retention::decide(&records, &policy, reference_now());
        for pair in decisions.windows(2) {
            prop_assert!(pair[0].created >= pair[1].created);
        }
    }

    /// Identical inputs yield identical output.
    #[test]
    fn prop_decide_is_deterministic(
        records in records_strategy(),
        policy in policy_strategy(),
    ) {
        let first = retention::decide(&records, &policy, reference_now());
        let second = retention::decide(&records, &policy, reference_now());
        prop_assert_eq!(first, second);
    }

    /// With no protection and a zero threshold, deletion means "strictly older than now".
    #[test]
    fn prop_zero_policy_deletes_strictly_older(records in records_strategy()) {
        let now = reference_now();
        let decisions = retention::decide(&records, &RepositoryPolicy::new(0, 0), now);
        for decision in decisions {
            prop_assert_eq!(decision.delete, decision.created.with_timezone(&Utc) < now);
        }
    }
}
