//! CLI commands and argument parsing.

pub mod plan;
pub mod run;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::settings::{Settings, SettingsArgs};

/// regprune - retire stale images from a Docker registry
#[derive(Parser)]
#[command(name = "regprune")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub settings: SettingsArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Delete expired images, collect garbage and remove orphaned repositories
    Run(run::RunArgs),

    /// Show what a run would delete without changing anything
    Plan(plan::PlanArgs),

    /// Print version information
    Version,
}

/// Dispatches a command that needs configuration.
pub async fn execute(command: Commands, settings: &Settings) -> Result<()> {
    match command {
        Commands::Run(args) => run::execute(&args, settings).await,
        Commands::Plan(args) => plan::execute(&args, settings).await,
        Commands::Version => {
            println!("regprune {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
