//! Run command implementation.
//!
//! Performs a full cleanup: deletions, garbage collection and the orphan
//! sweep.

use std::future::Future;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use tracing::{info, warn};

use regprune_cleanup::{
    CancellationToken, GcOutcome, Orchestrator, OrphanResult, RepositoryOutcome, RunPhase,
    RunReport,
};
use regprune_registry::RegistryClient;

use crate::settings::Settings;

/// Arguments for the run command.
#[derive(Args)]
pub struct RunArgs {
    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Runs the cleanup.
///
/// # Errors
///
/// Returns an error if the registry client cannot be created or the
/// catalog cannot be listed.
pub async fn execute(args: &RunArgs, settings: &Settings) -> Result<()> {
    let report = cleanup(settings, false).await?;

    if args.json {
        print_json(&report)?;
    } else {
        print_summary(&report);
    }
    Ok(())
}

/// Builds an orchestrator from the settings and runs it once.
///
/// Ctrl-C stops the run at the next repository or tag boundary.
pub async fn cleanup(settings: &Settings, dry_run: bool) -> Result<RunReport> {
    let client = RegistryClient::new(settings.registry_config())
        .context("Failed to create registry client")?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    let watcher = tokio::spawn(watch_interrupts(tokio::signal::ctrl_c, on_interrupt, || {
        std::process::exit(0);
    }));

    info!(registry = %settings.registry, dry_run, "connecting to registry");
    let orchestrator = Orchestrator::new(Box::new(client), settings.cleanup_config(dry_run))
        .with_cancellation(cancel);
    let result = orchestrator.run(Utc::now()).await;
    watcher.abort();

    result.context("Cleanup run failed")
}

/// Cancels the run on the first interrupt and calls `exit` on the second,
/// abandoning whatever request is in flight.
async fn watch_interrupts<S, F>(mut next_signal: S, cancel: CancellationToken, exit: impl FnOnce())
where
    S: FnMut() -> F,
    F: Future<Output = std::io::Result<()>>,
{
    if next_signal().await.is_err() {
        return;
    }
    warn!("interrupted, stopping after in-flight requests (interrupt again to exit now)");
    cancel.cancel();

    if next_signal().await.is_ok() {
        warn!("interrupted again, exiting");
        exit();
    }
}

/// Prints the report as pretty JSON.
pub fn print_json(report: &RunReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize run report")?;
    println!("{json}");
    Ok(())
}

fn print_summary(report: &RunReport) {
    println!("Registry cleanup {}", report.phase);
    println!();

    for repo in &report.repositories {
        match repo.outcome {
            RepositoryOutcome::Processed => {
                let failed = repo.not_deleted();
                if failed > 0 {
                    println!(
                        "  {}: {} deleted, {} not deleted",
                        repo.repository,
                        repo.deleted(),
                        failed
                    );
                } else {
                    println!("  {}: {} deleted", repo.repository, repo.deleted());
                }
            }
            other => println!("  {}: {}", repo.repository, outcome_label(other)),
        }
    }

    println!();
    println!("Images deleted:      {}", report.deleted_total());
    println!("Deletions failed:    {}", report.not_deleted_total());
    println!("Garbage collection:  {}", gc_label(&report.garbage_collection));
    println!("Orphans removed:     {}", report.orphans_removed());

    for orphan in &report.orphans {
        if let OrphanResult::Failed { message } = &orphan.result {
            println!("  failed to remove {}: {message}", orphan.repository);
        }
    }
    if let Some(error) = &report.sweep_error {
        println!("Orphan sweep skipped: {error}");
    }
    if report.phase == RunPhase::Cancelled {
        println!();
        println!("Run was interrupted; remaining repositories were not processed.");
    }
}

pub(crate) fn outcome_label(outcome: RepositoryOutcome) -> &'static str {
    match outcome {
        RepositoryOutcome::Excluded => "excluded",
        RepositoryOutcome::NoTags => "no images found",
        RepositoryOutcome::NoResolvableTags => "no eligible images",
        RepositoryOutcome::Processed => "processed",
        RepositoryOutcome::Cancelled => "interrupted",
    }
}

fn gc_label(outcome: &GcOutcome) -> String {
    match outcome {
        GcOutcome::NotRun => "not run".to_string(),
        GcOutcome::Skipped => "skipped (dry run)".to_string(),
        GcOutcome::Disabled => "disabled".to_string(),
        GcOutcome::Completed => "completed".to_string(),
        GcOutcome::Failed { message } => format!("failed ({message})"),
    }
}
