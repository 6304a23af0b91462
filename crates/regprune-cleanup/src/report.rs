//! Run reports.
//!
//! Everything the orchestrator did, or would have done in a dry run, is
//! recorded here so it can be logged and printed.

use chrono::{DateTime, Utc};
use regprune_core::{RepositoryPolicy, RetentionDecision};
use regprune_registry::DeleteOutcome;
use serde::Serialize;

use crate::state::RunPhase;

/// What happened to one repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepositoryOutcome {
    /// Listed in the exclusion set; never queried.
    Excluded,

    /// The registry reported no tags.
    NoTags,

    /// No tag could be resolved to a digest and creation time.
    NoResolvableTags,

    /// Decisions were computed and deletions issued.
    Processed,

    /// Interrupted before deletions were issued.
    Cancelled,
}

/// Result of one tag deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum DeletionResult {
    /// The registry accepted the deletion.
    Deleted,

    /// The registry answered with a status other than 202.
    Rejected {
        /// HTTP status code.
        status: u16,
    },

    /// The request did not complete.
    Failed {
        /// Error message.
        message: String,
    },

    /// Dry run; nothing was sent.
    Planned,

    /// The digest is also referenced by a kept tag, so deleting it would remove that tag too.
    SharedWithKeptTag,

    /// The digest was already deleted through another tag in this run.
    AlreadyDeleted,
}

impl From<DeleteOutcome> for DeletionResult {
    fn from(outcome: DeleteOutcome) -> Self {
        match outcome {
            DeleteOutcome::Accepted => Self::Deleted,
            DeleteOutcome::Rejected { status } => Self::Rejected { status },
            DeleteOutcome::Failed { message } => Self::Failed { message },
        }
    }
}

/// One attempted (or planned) tag deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagDeletion {
    /// Tag marked for deletion.
    pub tag: String,

    /// Manifest digest targeted.
    pub digest: String,

    /// What happened.
    #[serde(flatten)]
    pub result: DeletionResult,
}

/// Report for one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryReport {
    /// Repository name.
    pub repository: String,

    /// Outcome.
    pub outcome: RepositoryOutcome,

    /// Effective policy, once one was needed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<RepositoryPolicy>,

    /// Number of tags the registry listed.
    pub tags_listed: usize,

    /// Retention decisions, newest first.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub decisions: Vec<RetentionDecision>,

    /// Deletions attempted or planned.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub deletions: Vec<TagDeletion>,
}

impl RepositoryReport {
    /// Creates a report with no decisions.
    pub fn new(repository: impl Into<String>, outcome: RepositoryOutcome) -> Self {
        Self {
            repository: repository.into(),
            outcome,
            policy: None,
            tags_listed: 0,
            decisions: Vec::new(),
            deletions: Vec::new(),
        }
    }

    /// Number of tags the registry deleted.
    pub fn deleted(&self) -> usize {
        self.count(|r| matches!(r, DeletionResult::Deleted))
    }

    /// Number of deletions the registry rejected or that failed in transit.
    pub fn not_deleted(&self) -> usize {
        self.count(|r| matches!(r, DeletionResult::Rejected { .. } | DeletionResult::Failed { .. }))
    }

    /// Number of deletions planned in a dry run.
    pub fn planned(&self) -> usize {
        self.count(|r| matches!(r, DeletionResult::Planned))
    }

    fn count(&self, predicate: impl Fn(&DeletionResult) -> bool) -> usize {
        self.deletions.iter().filter(|d| predicate(&d.result)).count()
    }
}

/// Outcome of the garbage collection step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GcOutcome {
    /// The run ended before garbage collection.
    NotRun,

    /// Dry run.
    Skipped,

    /// Disabled by configuration.
    Disabled,

    /// Command exited successfully.
    Completed,

    /// Command failed.
    Failed {
        /// Failure description.
        message: String,
    },
}

/// Outcome of removing one orphaned repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum OrphanResult {
    /// Storage directory removed.
    Removed,

    /// Nothing on disk to remove.
    Missing,

    /// Dry run; nothing removed.
    Planned,

    /// Removal failed.
    Failed {
        /// Error message.
        message: String,
    },
}

/// One orphaned repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrphanReport {
    /// Repository name.
    pub repository: String,

    /// What happened.
    #[serde(flatten)]
    pub result: OrphanResult,
}

/// Report for a whole run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Reference time used for age thresholds.
    pub started_at: DateTime<Utc>,

    /// Phase the run ended in.
    pub phase: RunPhase,

    /// Whether this was a dry run.
    pub dry_run: bool,

    /// Per-repository reports in catalog order.
    pub repositories: Vec<RepositoryReport>,

    /// Garbage collection outcome.
    pub garbage_collection: GcOutcome,

    /// Orphaned repositories found by the sweep.
    pub orphans: Vec<OrphanReport>,

    /// Set if the sweep could not list the catalog.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sweep_error: Option<String>,
}

impl RunReport {
    /// Creates an empty report.
    pub fn new(started_at: DateTime<Utc>, dry_run: bool) -> Self {
        Self {
            started_at,
            phase: RunPhase::ListRepos,
            dry_run,
            repositories: Vec::new(),
            garbage_collection: GcOutcome::NotRun,
            orphans: Vec::new(),
            sweep_error: None,
        }
    }

    /// Total tags deleted.
    pub fn deleted_total(&self) -> usize {
        self.repositories.iter().map(RepositoryReport::deleted).sum()
    }

    /// Total deletions rejected or failed.
    pub fn not_deleted_total(&self) -> usize {
        self.repositories.iter().map(RepositoryReport::not_deleted).sum()
    }

    /// Total deletions planned in a dry run.
    pub fn planned_total(&self) -> usize {
        self.repositories.iter().map(RepositoryReport::planned).sum()
    }

    /// Number of orphaned repositories whose storage was removed.
    pub fn orphans_removed(&self) -> usize {
        self.orphans
            .iter()
            .filter(|o| o.result == OrphanResult::Removed)
            .count()
    }

    /// Returns the report for a repository.
    pub fn repository(&self, name: &str) -> Option<&RepositoryReport> {
        self.repositories.iter().find(|r| r.repository == name)
    }
}
