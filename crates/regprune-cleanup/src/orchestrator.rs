//! Cleanup orchestration.
//!
//! The [`Orchestrator`] walks the whole catalog one repository at a time,
//! resolves tag metadata, asks the retention engine which tags to delete,
//! deletes them, then runs garbage collection once and finally removes the
//! storage of repositories that were left without tags.
//!
//! Failures are absorbed per tag and per repository. Only a catalog that
//! cannot be listed at the start aborts the run.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use regprune_core::{CancellationToken, RetentionPlan};
use regprune_registry::{MetadataResolver, RegistryApi};
use tracing::{debug, error, info, warn};

use crate::config::CleanupConfig;
use crate::error::Result;
use crate::gc::{CommandGarbageCollector, GarbageCollector};
use crate::orphans::{FsOrphanStore, OrphanStore};
use crate::report::{
    DeletionResult, GcOutcome, OrphanReport, OrphanResult, RepositoryOutcome, RepositoryReport,
    RunReport, TagDeletion,
};
use crate::state::RunPhase;

/// Drives a full cleanup run.
pub struct Orchestrator {
    api: Box<dyn RegistryApi>,
    gc: Box<dyn GarbageCollector>,
    orphans: Box<dyn OrphanStore>,
    config: CleanupConfig,
    cancel: CancellationToken,
}

impl Orchestrator {
    /// Creates an orchestrator using the configured command collector and
    /// filesystem orphan store.
    pub fn new(api: Box<dyn RegistryApi>, config: CleanupConfig) -> Self {
        let gc = Box::new(CommandGarbageCollector::new(config.gc.clone()));
        let orphans = Box::new(FsOrphanStore::new(config.repository_path.clone()));

        Self {
            api,
            gc,
            orphans,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Replaces the garbage collector.
    pub fn with_garbage_collector(mut self, gc: Box<dyn GarbageCollector>) -> Self {
        self.gc = gc;
        self
    }

    /// Replaces the orphan store.
    pub fn with_orphan_store(mut self, orphans: Box<dyn OrphanStore>) -> Self {
        self.orphans = orphans;
        self
    }

    /// Uses the given cancellation token.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Returns the run configuration.
    pub fn config(&self) -> &CleanupConfig {
        &self.config
    }

    /// Runs the full cleanup.
    ///
    /// `now` is the reference time for every age threshold in this run.
    ///
    /// # Errors
    ///
    /// Returns an error only if the catalog cannot be listed at the start.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<RunReport> {
        let mut report = RunReport::new(now, self.config.dry_run);
        info!(dry_run = self.config.dry_run, "starting registry cleanup");

        let repositories = self.api.list_repositories().await?;
        info!(count = repositories.len(), "listed repositories");

        report.phase = RunPhase::Processing;
        for repository in &repositories {
            if self.stop_requested(&mut report) {
                return Ok(report);
            }
            let repo_report = self.process_repository(repository, now).await;
            report.repositories.push(repo_report);
        }

        if self.stop_requested(&mut report) {
            return Ok(report);
        }
        report.phase = RunPhase::GarbageCollect;
        report.garbage_collection = self.collect_garbage().await;

        if self.stop_requested(&mut report) {
            return Ok(report);
        }
        report.phase = RunPhase::SweepOrphans;
        self.sweep_orphans(&mut report).await;

        if report.phase != RunPhase::Cancelled {
            report.phase = RunPhase::Done;
        }
        info!(
            deleted = report.deleted_total(),
            not_deleted = report.not_deleted_total(),
            planned = report.planned_total(),
            orphans_removed = report.orphans_removed(),
            "registry cleanup finished"
        );
        Ok(report)
    }

    /// Resolves, decides and deletes for a single repository.
    pub async fn process_repository(
        &self,
        repository: &str,
        now: DateTime<Utc>,
    ) -> RepositoryReport {
        let policies = &self.config.policies;
        if policies.is_excluded(repository) {
            debug!(repository, "repository excluded");
            return RepositoryReport::new(repository, RepositoryOutcome::Excluded);
        }

        let tags = self.api.list_tags(repository).await;
        if tags.is_empty() {
            info!(repository, "skipping repository: no images found");
            return RepositoryReport::new(repository, RepositoryOutcome::NoTags);
        }

        let policy = policies.policy_for(repository);
        let mut report = RepositoryReport::new(repository, RepositoryOutcome::Processed);
        report.policy = Some(policy);
        report.tags_listed = tags.len();

        let records = MetadataResolver::new(self.api.as_ref())
            .resolve_all(repository, &tags, &self.cancel)
            .await;

        if self.cancel.is_cancelled() {
            report.outcome = RepositoryOutcome::Cancelled;
            return report;
        }
        if records.is_empty() {
            info!(repository, "skipping repository: no eligible images");
            report.outcome = RepositoryOutcome::NoResolvableTags;
            return report;
        }

        let plan = RetentionPlan::compute(&records, &policy, now);
        debug!(
            repository,
            resolved = records.len(),
            to_delete = plan.delete_count(),
            recent_count = policy.recent_count,
            age_threshold_days = policy.age_threshold_days,
            "computed retention plan"
        );

        report.deletions = self.delete_planned(repository, &plan).await;
        if report.deletions.is_empty() {
            info!(repository, "skipping repository: all images are within retention policy");
        }
        report.decisions = plan.into_decisions();
        report
    }

    async fn delete_planned(&self, repository: &str, plan: &RetentionPlan) -> Vec<TagDeletion> {
        let kept_digests: HashSet<&str> = plan.kept().map(|d| d.manifest_digest.as_str()).collect();
        let mut deleted_digests: HashSet<&str> = HashSet::new();
        let mut deletions = Vec::new();

        for decision in plan.to_delete() {
            if self.cancel.is_cancelled() {
                break;
            }

            let digest = decision.manifest_digest.as_str();
            let result = if kept_digests.contains(digest) {
                warn!(
                    repository,
                    tag = %decision.tag,
                    digest,
                    "digest shared with a kept tag, not deleting"
                );
                DeletionResult::SharedWithKeptTag
            } else if deleted_digests.contains(digest) {
                DeletionResult::AlreadyDeleted
            } else if self.config.dry_run {
                info!(repository, tag = %decision.tag, digest, "would delete image");
                DeletionResult::Planned
            } else {
                let outcome = self.api.delete_manifest(repository, digest).await;
                if outcome.is_accepted() {
                    info!(repository, tag = %decision.tag, digest, "deleted image");
                    deleted_digests.insert(digest);
                }
                DeletionResult::from(outcome)
            };

            deletions.push(TagDeletion {
                tag: decision.tag.clone(),
                digest: decision.manifest_digest.clone(),
                result,
            });
        }

        deletions
    }

    async fn collect_garbage(&self) -> GcOutcome {
        if self.config.dry_run {
            return GcOutcome::Skipped;
        }
        if !self.config.gc.enabled {
            debug!("garbage collection disabled");
            return GcOutcome::Disabled;
        }

        match self.gc.collect().await {
            Ok(()) => {
                info!("garbage collection completed successfully");
                GcOutcome::Completed
            }
            Err(e) => {
                error!(error = %e, "garbage collection failed");
                GcOutcome::Failed {
                    message: e.to_string(),
                }
            }
        }
    }

    /// Re-lists the catalog and removes repositories that report no tags.
    async fn sweep_orphans(&self, report: &mut RunReport) {
        let repositories = match self.api.list_repositories().await {
            Ok(repositories) => repositories,
            Err(e) => {
                error!(error = %e, "orphan sweep could not list repositories");
                report.sweep_error = Some(e.to_string());
                return;
            }
        };

        for repository in repositories {
            if self.stop_requested(report) {
                return;
            }
            // Excluded repositories are never queried, not even by the sweep.
            if self.config.policies.is_excluded(&repository) {
                continue;
            }
            if !self.api.list_tags(&repository).await.is_empty() {
                continue;
            }

            let result = if self.config.dry_run {
                info!(repository = %repository, "would remove orphaned repository");
                OrphanResult::Planned
            } else {
                info!(repository = %repository, "removing orphaned repository");
                match self.orphans.remove(&repository).await {
                    Ok(true) => {
                        info!(repository = %repository, "orphaned repository removed");
                        OrphanResult::Removed
                    }
                    Ok(false) => OrphanResult::Missing,
                    Err(e) => {
                        error!(
                            repository = %repository,
                            error = %e,
                            "failed to remove orphaned repository"
                        );
                        OrphanResult::Failed {
                            message: e.to_string(),
                        }
                    }
                }
            };

            report.orphans.push(OrphanReport { repository, result });
        }
    }

    fn stop_requested(&self, report: &mut RunReport) -> bool {
        if self.cancel.is_cancelled() {
            if report.phase != RunPhase::Cancelled {
                info!(phase = %report.phase, "cleanup interrupted, stopping");
            }
            report.phase = RunPhase::Cancelled;
            true
        } else {
            false
        }
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}
