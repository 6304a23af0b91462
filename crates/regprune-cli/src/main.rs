//! regprune CLI - retention cleanup for Docker registries.

use clap::Parser;
use tracing::error;

mod commands;
mod logging;
mod settings;

use commands::{Cli, Commands};
use settings::Settings;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if matches!(cli.command, Commands::Version) {
        println!("regprune {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let settings = Settings::load(&cli.settings);

    // Logging goes to stderr even when the configuration is unusable.
    let log_file = settings.as_ref().ok().map(|s| s.log_file.clone());
    logging::init(log_file.as_deref());

    let result = match settings {
        Ok(settings) => commands::execute(cli.command, &settings).await,
        Err(e) => Err(e),
    };

    // Failures are reported, never turned into a non-zero exit status.
    if let Err(e) = result {
        error!(error = format!("{e:#}"), "registry cleanup failed");
    }
}
