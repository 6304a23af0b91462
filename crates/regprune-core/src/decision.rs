//! Retention decision types.
//!
//! This module defines the [`RetentionDecision`] produced for every resolved
//! tag by the retention engine.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::record::TagRecord;

/// Why a tag was kept or marked for deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    /// Among the most recent tags; kept regardless of age.
    Protected,

    /// Not protected, but created at or after the age threshold.
    WithinThreshold,

    /// Not protected and created before the age threshold.
    Expired,
}

impl DecisionReason {
    /// Returns a string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Protected => "protected",
            Self::WithinThreshold => "within_threshold",
            Self::Expired => "expired",
        }
    }

    /// Returns true if the reason implies deletion.
    #[must_use]
    pub const fn deletes(&self) -> bool {
        matches!(self, Self::Expired)
    }
}

impl std::fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Keep/delete mark for one tag.
///
/// # Examples
///
/// ```rust
/// use chrono::Utc;
/// use regprune_core::{DecisionReason, RetentionDecision, TagRecord};
///
/// let record = TagRecord::new("v1", Utc::now().fixed_offset(), "sha256:abc");
/// let decision = RetentionDecision::from_record(&record, DecisionReason::Expired);
/// assert!(decision.delete);
/// assert_eq!(decision.manifest_digest, "sha256:abc");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionDecision {
    /// Tag the decision applies to.
    pub tag: String,

    /// Manifest digest used for deletion.
    pub manifest_digest: String,

    /// Creation time of the image.
    pub created: DateTime<FixedOffset>,

    /// Whether the tag is to be deleted.
    pub delete: bool,

    /// Why the decision was made.
    pub reason: DecisionReason,
}

impl RetentionDecision {
    /// Creates a decision for a record.
    #[must_use]
    pub fn from_record(record: &TagRecord, reason: DecisionReason) -> Self {
        Self {
            tag: record.tag.clone(),
            manifest_digest: record.manifest_digest.clone(),
            created: record.created,
            delete: reason.deletes(),
            reason,
        }
    }
}
