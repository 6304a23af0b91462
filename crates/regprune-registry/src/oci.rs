//! Registry wire types.
//!
//! This module defines the subset of the Docker Registry HTTP API v2 (and
//! the OCI Distribution Specification it grew into) that cleanup needs:
//! catalog and tag listings, image manifests and image config blobs.

use serde::{Deserialize, Serialize};

/// Response header carrying the canonical manifest digest.
pub const CONTENT_DIGEST_HEADER: &str = "Docker-Content-Digest";

/// Media types sent and expected by the client.
#[derive(Debug)]
pub enum MediaType {}

impl MediaType {
    /// Docker image manifest, schema 2.
    pub const DOCKER_MANIFEST_V2: &'static str =
        "application/vnd.docker.distribution.manifest.v2+json";

    /// Docker image config blob.
    pub const DOCKER_CONFIG: &'static str = "application/vnd.docker.container.image.v1+json";
}

/// Content descriptor, reduced to the digest that addresses the content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Descriptor {
    /// Digest of the targeted content.
    #[serde(default)]
    pub digest: String,
}

/// Image manifest.
///
/// Only the fields needed to locate the config blob are modelled.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Schema version (always 2).
    pub schema_version: u32,

    /// Image config descriptor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Descriptor>,
}

impl Manifest {
    /// Returns the config blob digest, if the manifest names one.
    ///
    /// # Examples
    ///
    /// ```
    /// use regprune_registry::Manifest;
    ///
    /// let manifest: Manifest = serde_json::from_str(
    ///     r#"{"schemaVersion": 2, "config": {"digest": "sha256:c0ffee", "size": 7}}"#,
    /// ).unwrap();
    /// assert_eq!(manifest.config_digest(), Some("sha256:c0ffee"));
    /// ```
    #[must_use]
    pub fn config_digest(&self) -> Option<&str> {
        self.config
            .as_ref()
            .map(|config| config.digest.as_str())
            .filter(|digest| !digest.is_empty())
    }
}

/// Response from the `/v2/_catalog` endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    /// Repository names.
    #[serde(default)]
    pub repositories: Vec<String>,
}

/// Response from the `/v2/<name>/tags/list` endpoint.
///
/// The registry reports `"tags": null` for a repository whose tags have
/// all been deleted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TagList {
    /// Repository name.
    #[serde(default)]
    pub name: String,

    /// List of tags.
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// The parts of an image config blob that cleanup reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageConfig {
    /// Image creation timestamp, as written by the build tool.
    #[serde(default)]
    pub created: Option<String>,
}
