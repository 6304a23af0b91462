//! Error types for regprune core operations.
//!
//! This module defines the error types used throughout the `regprune-core` crate.

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in regprune core operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An image creation timestamp could not be parsed.
    #[error("Invalid creation timestamp '{value}': {reason}")]
    InvalidTimestamp {
        /// The raw timestamp value.
        value: String,
        /// Reason the value was rejected.
        reason: String,
    },

    /// Policy configuration is inconsistent.
    #[error("Invalid retention policy: {reason}")]
    InvalidPolicy {
        /// Reason the policy is invalid.
        reason: String,
    },
}
