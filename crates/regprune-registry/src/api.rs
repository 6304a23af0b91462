//! Registry operations used by cleanup.
//!
//! [`RegistryApi`] is the seam between the cleanup logic and the HTTP
//! client. Expected absences (a tag that vanished, a blob that cannot be
//! fetched) are returned as empty values rather than errors so that callers
//! branch on them explicitly.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::RegistryError;

/// Digests resolved from a manifest fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestRef {
    /// Canonical manifest digest from the `Docker-Content-Digest` header.
    pub content_digest: String,

    /// Digest of the image config blob referenced by the manifest.
    pub config_digest: String,
}

/// Outcome of a manifest deletion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeleteOutcome {
    /// The registry answered `202 Accepted`.
    Accepted,

    /// The registry answered with any other status.
    Rejected {
        /// HTTP status code.
        status: u16,
    },

    /// No response was received.
    Failed {
        /// Transport error message.
        message: String,
    },
}

impl DeleteOutcome {
    /// Returns true if the manifest was deleted.
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Registry operations needed to inspect and prune repositories.
#[async_trait]
pub trait RegistryApi: Send + Sync {
    /// Lists every repository in the catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be read; without it there is
    /// nothing to process.
    async fn list_repositories(&self) -> Result<Vec<String>, RegistryError>;

    /// Lists the tags of a repository. Any failure yields an empty list.
    async fn list_tags(&self, repository: &str) -> Vec<String>;

    /// Fetches a manifest by tag or digest. Any failure or missing digest yields `None`.
    async fn fetch_manifest(&self, repository: &str, reference: &str) -> Option<ManifestRef>;

    /// Fetches a blob by digest. Any failure yields `None`.
    async fn fetch_blob(&self, repository: &str, digest: &str) -> Option<Vec<u8>>;

    /// Deletes a manifest by digest. Never retried.
    async fn delete_manifest(&self, repository: &str, digest: &str) -> DeleteOutcome;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_outcome_is_accepted() {
        assert!(DeleteOutcome::Accepted.is_accepted());
        assert!(!DeleteOutcome::Rejected { status: 404 }.is_accepted());
        assert!(!DeleteOutcome::Failed {
            message: "connection reset".to_string()
        }
        .is_accepted());
    }

    #[test]
    fn test_delete_outcome_serialization() {
        let json = serde_json::to_string(&DeleteOutcome::Rejected { status: 405 }).unwrap();
        assert_eq!(json, r#"{"outcome":"rejected","status":405}"#);
    }
}
