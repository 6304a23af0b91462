//! Plan command implementation.
//!
//! Resolves every repository and prints the retention decisions without
//! deleting anything, collecting garbage or touching the filesystem.

use anyhow::Result;
use clap::Args;

use regprune_cleanup::{DeletionResult, OrphanResult, RepositoryOutcome, RunReport};

use super::run::{cleanup, outcome_label, print_json};
use crate::settings::Settings;

/// Arguments for the plan command.
#[derive(Args)]
pub struct PlanArgs {
    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,

    /// Also list tags that are kept
    #[arg(long)]
    pub show_kept: bool,
}

/// Runs the plan command.
///
/// # Errors
///
/// Returns an error if the catalog cannot be listed.
pub async fn execute(args: &PlanArgs, settings: &Settings) -> Result<()> {
    let report = cleanup(settings, true).await?;

    if args.json {
        print_json(&report)
    } else {
        print_plan(&report, args.show_kept);
        Ok(())
    }
}

fn print_plan(report: &RunReport, show_kept: bool) {
    println!("Retention plan (dry run, nothing was deleted)");
    println!();

    for repo in &report.repositories {
        if repo.outcome != RepositoryOutcome::Processed {
            println!("{}: {}", repo.repository, outcome_label(repo.outcome));
            continue;
        }

        match repo.policy {
            Some(policy) => println!(
                "{}: keep {} recent, expire after {} days",
                repo.repository, policy.recent_count, policy.age_threshold_days
            ),
            None => println!("{}", repo.repository),
        }

        for decision in repo.decisions.iter().filter(|d| d.delete || show_kept) {
            let action = if decision.delete {
                let deletion = repo.deletions.iter().find(|d| d.tag == decision.tag);
                deletion_label(deletion.map(|d| &d.result))
            } else {
                "keep"
            };
            println!(
                "  {action:<8} {:<30} {}  {}",
                decision.tag,
                decision.created.to_rfc3339(),
                decision.reason
            );
        }
    }

    let orphans: Vec<&str> = report
        .orphans
        .iter()
        .filter(|o| o.result == OrphanResult::Planned)
        .map(|o| o.repository.as_str())
        .collect();
    if !orphans.is_empty() {
        println!();
        println!("Repositories that would be removed as orphaned:");
        for repository in orphans {
            println!("  {repository}");
        }
    }

    println!();
    println!("Images to delete: {}", report.planned_total());
}

fn deletion_label(result: Option<&DeletionResult>) -> &'static str {
    match result {
        Some(DeletionResult::SharedWithKeptTag) => "shared",
        Some(DeletionResult::AlreadyDeleted) => "alias",
        // Interrupted before this tag was reached.
        None => "pending",
        Some(_) => "delete",
    }
}
