//! Error types for the cleanup crate.
//!
//! This module defines all errors that can occur while cleaning a registry.
//! Most failures are absorbed per tag or per repository and only show up
//! in the [`RunReport`](crate::RunReport); the variants here are the ones
//! collaborators return to the orchestrator.

use std::path::PathBuf;

use regprune_registry::RegistryError;
use thiserror::Error;

/// Result type alias for cleanup operations.
pub type Result<T> = std::result::Result<T, CleanupError>;

/// Errors that can occur during cleanup.
#[derive(Error, Debug)]
pub enum CleanupError {
    /// The registry could not be queried.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// The garbage collection command could not run or exited unsuccessfully.
    #[error("garbage collection failed: {message}")]
    GarbageCollection {
        /// Failure description.
        message: String,
    },

    /// Filesystem operation failed.
    #[error("I/O error at '{path}': {source}")]
    Io {
        /// Path being operated on.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A repository name would resolve outside the storage root.
    #[error("refusing to remove repository '{repository}': path escapes the storage root")]
    UnsafePath {
        /// Repository name.
        repository: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_gc() {
        let err = CleanupError::GarbageCollection {
            message: "exit status: 1".to_string(),
        };
        assert_eq!(err.to_string(), "garbage collection failed: exit status: 1");
    }

    #[test]
    fn test_error_display_unsafe_path() {
        let err = CleanupError::UnsafePath {
            repository: "../etc".to_string(),
        };
        assert!(err.to_string().contains("'../etc'"));
    }

    #[test]
    fn test_error_from_registry() {
        let err: CleanupError = RegistryError::HttpError {
            status: 500,
            message: "boom".to_string(),
        }
        .into();
        assert!(matches!(err, CleanupError::Registry(_)));
    }
}
