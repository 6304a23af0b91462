//! Retention engine.
//!
//! Given every resolved [`TagRecord`] of a repository, a [`RepositoryPolicy`]
//! and the current time, [`decide`] marks each tag as kept or deleted:
//!
//! 1. Records are ordered newest first. Equal creation times keep their
//!    input order, so the result is reproducible.
//! 2. The first `recent_count` tags form the protected set and are kept.
//! 3. Every other tag is deleted if and only if it was created strictly
//!    before `now - age_threshold_days`.
//!
//! The engine is pure: it performs no I/O and returns the same decisions,
//! in the same order, for the same inputs.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::decision::{DecisionReason, RetentionDecision};
use crate::policy::RepositoryPolicy;
use crate::record::TagRecord;

/// Computes a decision for every record.
///
/// Decisions are returned newest first. An empty input yields no decisions.
///
/// # Examples
///
/// ```rust
/// use chrono::{Duration, Utc};
/// use regprune_core::{retention, RepositoryPolicy, TagRecord};
///
/// let now = Utc::now();
/// let records = vec![
///     TagRecord::new("old", (now - Duration::days(5)).fixed_offset(), "sha256:1"),
///     TagRecord::new("new", now.fixed_offset(), "sha256:2"),
/// ];
///
/// let decisions = retention::decide(&records, &RepositoryPolicy::new(0, 0), now);
/// assert_eq!(decisions[0].tag, "new");
/// assert!(!decisions[0].delete);
/// assert!(decisions[1].delete);
/// ```
#[must_use]
pub fn decide(
    records: &[TagRecord],
    policy: &RepositoryPolicy,
    now: DateTime<Utc>,
) -> Vec<RetentionDecision> {
    if records.is_empty() {
        return Vec::new();
    }

    let mut sorted: Vec<&TagRecord> = records.iter().collect();
    // stable: ties keep input order
    sorted.sort_by(|a, b| b.created.cmp(&a.created));

    let protected: HashSet<&str> = sorted
        .iter()
        .take(policy.recent_count)
        .map(|record| record.tag.as_str())
        .collect();
    let threshold = policy.threshold(now);

    sorted
        .into_iter()
        .map(|record| {
            let reason = if protected.contains(record.tag.as_str()) {
                DecisionReason::Protected
            } else if record.created_utc() < threshold {
                DecisionReason::Expired
            } else {
                DecisionReason::WithinThreshold
            };
            RetentionDecision::from_record(record, reason)
        })
        .collect()
}

/// Decisions for one repository together with convenience accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetentionPlan {
    decisions: Vec<RetentionDecision>,
}

impl RetentionPlan {
    /// Runs [`decide`] and wraps the result.
    #[must_use]
    pub fn compute(records: &[TagRecord], policy: &RepositoryPolicy, now: DateTime<Utc>) -> Self {
        Self::from_decisions(decide(records, policy, now))
    }

    /// Wraps already computed decisions.
    #[must_use]
    pub const fn from_decisions(decisions: Vec<RetentionDecision>) -> Self {
        Self { decisions }
    }

    /// All decisions, newest first.
    #[must_use]
    pub fn decisions(&self) -> &[RetentionDecision] {
        &self.decisions
    }

    /// Consumes the plan and returns its decisions.
    #[must_use]
    pub fn into_decisions(self) -> Vec<RetentionDecision> {
        self.decisions
    }

    /// Decisions marked for deletion.
    pub fn to_delete(&self) -> impl Iterator<Item = &RetentionDecision> {
        self.decisions.iter().filter(|d| d.delete)
    }

    /// Decisions that keep their tag.
    pub fn kept(&self) -> impl Iterator<Item = &RetentionDecision> {
        self.decisions.iter().filter(|d| !d.delete)
    }

    /// Decisions in the protected set.
    pub fn protected(&self) -> impl Iterator<Item = &RetentionDecision> {
        self.decisions
            .iter()
            .filter(|d| d.reason == DecisionReason::Protected)
    }

    /// Number of tags marked for deletion.
    #[must_use]
    pub fn delete_count(&self) -> usize {
        self.to_delete().count()
    }

    /// Returns true if there are no decisions at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }
}
