//! regprune cleanup orchestration
//!
//! This crate drives a complete cleanup of a Docker registry: it walks the
//! catalog, applies the retention policy of each repository, deletes
//! expired manifests, triggers garbage collection and sweeps repositories
//! that were left without tags.
//!
//! # Overview
//!
//! A run moves through these phases, strictly sequentially:
//! - **ListRepos**: read the full catalog (the only fatal step)
//! - **Processing**: resolve, decide and delete per repository
//! - **GarbageCollect**: run the external collector once
//! - **SweepOrphans**: remove storage of repositories without tags
//!
//! External side effects sit behind traits ([`GarbageCollector`],
//! [`OrphanStore`], and `RegistryApi` from `regprune-registry`) so a run can
//! be exercised end to end without a registry or a filesystem.
//!
//! # Example
//!
//! ```rust,ignore
//! use chrono::Utc;
//! use regprune_cleanup::{CleanupConfig, Orchestrator};
//! use regprune_core::{PolicySet, RepositoryPolicy};
//! use regprune_registry::{RegistryClient, RegistryConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = RegistryClient::new(RegistryConfig::new("http://localhost:5000"))?;
//!     let policies = PolicySet::new(RepositoryPolicy::new(5, 30));
//!     let orchestrator = Orchestrator::new(Box::new(client), CleanupConfig::new(policies));
//!
//!     let report = orchestrator.run(Utc::now()).await?;
//!     println!("deleted {} images", report.deleted_total());
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::unused_async)]

pub mod config;
pub mod error;
pub mod gc;
pub mod orchestrator;
pub mod orphans;
pub mod report;
pub mod state;

// Re-export main types at crate root
pub use config::{
    CleanupConfig, GcConfig, DEFAULT_GC_CONFIG_PATH, DEFAULT_GC_CONTAINER, DEFAULT_REPOSITORY_PATH,
};
pub use error::{CleanupError, Result};
pub use gc::{CommandGarbageCollector, GarbageCollector};
pub use orchestrator::Orchestrator;
pub use orphans::{FsOrphanStore, OrphanStore};
pub use regprune_core::CancellationToken;
pub use report::{
    DeletionResult, GcOutcome, OrphanReport, OrphanResult, RepositoryOutcome, RepositoryReport,
    RunReport, TagDeletion,
};
pub use state::RunPhase;
