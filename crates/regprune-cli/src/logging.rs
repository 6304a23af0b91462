//! Tracing subscriber setup.
//!
//! Events go to stderr for humans and, when a log file is configured, are
//! appended without ANSI colours to that file as well.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing::warn;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when `RUST_LOG` is not set.
const DEFAULT_FILTER: &str = "regprune=info";

/// Installs the global subscriber.
///
/// A log file that cannot be opened is reported and skipped.
pub fn init(log_file: Option<&Path>) {
    let (file, open_error) = match log_file.map(open_append) {
        Some(Ok(file)) => (Some(file), None),
        Some(Err(e)) => (None, Some(e)),
        None => (None, None),
    };

    let file_layer = file.map(|file| {
        fmt::layer()
            .with_ansi(false)
            .with_writer(Mutex::new(file))
    });

    let installed = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init();

    if installed.is_ok() {
        if let (Some(path), Some(e)) = (log_file, open_error) {
            warn!(
                path = %path.display(),
                error = %e,
                "cannot open log file, logging to stderr only"
            );
        }
    }
}

fn open_append(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}
