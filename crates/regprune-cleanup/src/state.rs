//! Run phase tracking.
//!
//! A run moves through the phases strictly in order:
//! `ListRepos -> Processing -> GarbageCollect -> SweepOrphans -> Done`.
//! An interrupt moves it to `Cancelled` from whatever phase it was in.

use serde::Serialize;

/// Phase of a cleanup run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    /// Reading the catalog.
    ListRepos,

    /// Resolving, deciding and deleting repository by repository.
    Processing,

    /// Running registry garbage collection.
    GarbageCollect,

    /// Removing repositories left without tags.
    SweepOrphans,

    /// Run finished.
    Done,

    /// Run stopped early by an interrupt.
    Cancelled,
}

impl RunPhase {
    /// Returns true if the run is over.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Cancelled)
    }

    /// Returns a string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ListRepos => "list_repos",
            Self::Processing => "processing",
            Self::GarbageCollect => "garbage_collect",
            Self::SweepOrphans => "sweep_orphans",
            Self::Done => "done",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
