//! Registry garbage collection trigger.
//!
//! Deleting manifests only unlinks them; blob storage is reclaimed by the
//! registry's own `garbage-collect` command, which runs as an external
//! process.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::config::GcConfig;
use crate::error::{CleanupError, Result};

/// Trait for triggering storage garbage collection.
#[async_trait]
pub trait GarbageCollector: Send + Sync {
    /// Runs garbage collection once.
    async fn collect(&self) -> Result<()>;
}

/// Runs the configured command with output discarded.
///
/// Success is decided by the exit status alone.
#[derive(Debug, Clone)]
pub struct CommandGarbageCollector {
    config: GcConfig,
}

impl CommandGarbageCollector {
    /// Creates a collector for the given command.
    pub fn new(config: GcConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl GarbageCollector for CommandGarbageCollector {
    async fn collect(&self) -> Result<()> {
        debug!(
            program = %self.config.program,
            args = ?self.config.args,
            "running garbage collection"
        );

        let status = Command::new(&self.config.program)
            .args(&self.config.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| CleanupError::GarbageCollection {
                message: format!("failed to start '{}': {e}", self.config.program),
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(CleanupError::GarbageCollection {
                message: format!("'{}' exited with {status}", self.config.program),
            })
        }
    }
}
