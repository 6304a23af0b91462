//! # regprune Core
//!
//! Core types and the retention engine for regprune, a tool that retires
//! stale images from a Docker registry.
//!
//! This crate provides the foundational data structures used throughout the
//! regprune workspace:
//!
//! - [`TagRecord`] - Resolved metadata for a single repository tag
//! - [`RepositoryPolicy`] / [`PolicySet`] - Retention parameters and per-repository overrides
//! - [`RetentionDecision`] - Keep/delete mark produced for every tag
//! - [`retention`] - The pure decision engine
//! - [`timestamp`] - Image creation timestamp parsing
//! - [`CancellationToken`] - Cooperative stop flag checked between units of work
//!
//! The crate performs no I/O.
//!
//! ## Example
//!
//! ```rust
//! use chrono::{Duration, Utc};
//! use regprune_core::{retention, RepositoryPolicy, TagRecord};
//!
//! let now = Utc::now();
//! let records = vec![
//!     TagRecord::new("v1", (now - Duration::days(40)).fixed_offset(), "sha256:aaa"),
//!     TagRecord::new("v2", (now - Duration::days(10)).fixed_offset(), "sha256:bbb"),
//!     TagRecord::new("v3", (now - Duration::days(1)).fixed_offset(), "sha256:ccc"),
//! ];
//!
//! let decisions = retention::decide(&records, &RepositoryPolicy::new(1, 20), now);
//! let deleted: Vec<_> = decisions.iter().filter(|d| d.delete).map(|d| d.tag.as_str()).collect();
//! assert_eq!(deleted, vec!["v1"]);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cancel;
pub mod decision;
pub mod error;
pub mod policy;
pub mod record;
pub mod retention;
pub mod timestamp;

#[cfg(test)]
mod proptest_tests;

// Re-export main types at crate root
pub use cancel::CancellationToken;
pub use decision::{DecisionReason, RetentionDecision};
pub use error::{Error, Result};
pub use policy::{PolicySet, PolicySetBuilder, RepositoryPolicy};
pub use record::TagRecord;
pub use retention::RetentionPlan;
