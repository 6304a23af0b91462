//! Tag metadata resolution.
//!
//! For every tag the resolver fetches the manifest (for its content digest
//! and config digest) and then the config blob (for the creation time).
//! Any failure along the way drops the tag for this run: a tag that cannot
//! be resolved is never considered for deletion.

use std::collections::HashSet;

use regprune_core::{timestamp, CancellationToken, TagRecord};
use tracing::debug;

use crate::api::RegistryApi;
use crate::oci::ImageConfig;

/// Builds [`TagRecord`]s from live registry state.
pub struct MetadataResolver<'a> {
    api: &'a dyn RegistryApi,
}

impl<'a> MetadataResolver<'a> {
    /// Creates a resolver backed by the given registry.
    #[must_use]
    pub fn new(api: &'a dyn RegistryApi) -> Self {
        Self { api }
    }

    /// Resolves a single tag, or returns `None` if any piece is unavailable.
    pub async fn resolve(&self, repository: &str, tag: &str) -> Option<TagRecord> {
        let manifest = self.api.fetch_manifest(repository, tag).await?;

        let blob = self
            .api
            .fetch_blob(repository, &manifest.config_digest)
            .await?;

        let config: ImageConfig = match serde_json::from_slice(&blob) {
            Ok(config) => config,
            Err(e) => {
                debug!(repository, tag, error = %e, "Config blob is not valid JSON");
                return None;
            }
        };

        let Some(raw) = config.created else {
            debug!(repository, tag, "Config blob has no creation timestamp");
            return None;
        };

        match timestamp::parse_created(&raw) {
            Ok(created) => Some(TagRecord::new(tag, created, manifest.content_digest)),
            Err(e) => {
                debug!(repository, tag, error = %e, "Unparseable creation timestamp");
                None
            }
        }
    }

    /// Resolves tags in order, skipping those that fail.
    ///
    /// Stops early, returning what was resolved so far, once `cancel` fires.
    /// Duplicate tag names are resolved once.
    pub async fn resolve_all(
        &self,
        repository: &str,
        tags: &[String],
        cancel: &CancellationToken,
    ) -> Vec<TagRecord> {
        let mut records: Vec<TagRecord> = Vec::with_capacity(tags.len());
        let mut seen: HashSet<&str> = HashSet::with_capacity(tags.len());

        for tag in tags {
            if cancel.is_cancelled() {
                debug!(repository, "Resolution cancelled");
                break;
            }
            if !seen.insert(tag.as_str()) {
                continue;
            }
            if let Some(record) = self.resolve(repository, tag).await {
                records.push(record);
            }
        }

        records
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::api::{DeleteOutcome, ManifestRef};
    use crate::error::RegistryError;

    #[derive(Default)]
    struct FakeRegistry {
        manifests: HashMap<String, ManifestRef>,
        blobs: HashMap<String, Vec<u8>>,
        manifest_fetches: AtomicUsize,
    }

    impl FakeRegistry {
        fn with_image(mut self, tag: &str, created: Option<&str>) -> Self {
            let config_digest = format!("sha256:config-{tag}");
            self.manifests.insert(
                tag.to_string(),
                ManifestRef {
                    content_digest: format!("sha256:manifest-{tag}"),
                    config_digest: config_digest.clone(),
                },
            );
            let blob = created.map_or_else(
                || serde_json::json!({"os": "linux"}),
                |c| serde_json::json!({"created": c}),
            );
            self.blobs.insert(config_digest, blob.to_string().into_bytes());
            self
        }
    }

    #[async_trait]
    impl RegistryApi for FakeRegistry {
        async fn list_repositories(&self) -> Result<Vec<String>, RegistryError> {
            Ok(Vec::new())
        }

        async fn list_tags(&self, _repository: &str) -> Vec<String> {
            Vec::new()
        }

        async fn fetch_manifest(&self, _repository: &str, reference: &str) -> Option<ManifestRef> {
            self.manifest_fetches.fetch_add(1, Ordering::SeqCst);
            self.manifests.get(reference).cloned()
        }

        async fn fetch_blob(&self, _repository: &str, digest: &str) -> Option<Vec<u8>> {
            self.blobs.get(digest).cloned()
        }

        async fn delete_manifest(&self, _repository: &str, _digest: &str) -> DeleteOutcome {
            DeleteOutcome::Rejected { status: 405 }
        }
    }

    #[tokio::test]
    async fn test_resolve_builds_record() {
        let registry = FakeRegistry::default().with_image("v1", Some("2024-01-02T03:04:05Z"));
        let resolver = MetadataResolver::new(&registry);

        let record = resolver.resolve("app", "v1").await.unwrap();
        assert_eq!(record.tag, "v1");
        assert_eq!(record.manifest_digest, "sha256:manifest-v1");
        assert_eq!(record.created.to_rfc3339(), "2024-01-02T03:04:05+00:00");
    }

    #[tokio::test]
    async fn test_resolve_corrects_truncated_offset() {
        let registry = FakeRegistry::default().with_image("v1", Some("2024-01-02T03:04:05+05:3"));
        let resolver = MetadataResolver::new(&registry);

        let record = resolver.resolve("app", "v1").await.unwrap();
        assert_eq!(record.created.offset().local_minus_utc(), 5 * 3600 + 3 * 60);
    }

    #[tokio::test]
    async fn test_resolve_missing_manifest() {
        let registry = FakeRegistry::default();
        let resolver = MetadataResolver::new(&registry);
        assert!(resolver.resolve("app", "ghost").await.is_none());
    }

    #[tokio::test]
    async fn test_resolve_missing_blob() {
        let mut registry = FakeRegistry::default().with_image("v1", Some("2024-01-02T03:04:05Z"));
        registry.blobs.clear();
        let resolver = MetadataResolver::new(&registry);
        assert!(resolver.resolve("app", "v1").await.is_none());
    }

    #[tokio::test]
    async fn test_resolve_missing_created() {
        let registry = FakeRegistry::default().with_image("v1", None);
        let resolver = MetadataResolver::new(&registry);
        assert!(resolver.resolve("app", "v1").await.is_none());
    }

    #[tokio::test]
    async fn test_resolve_unparseable_created() {
        let registry = FakeRegistry::default().with_image("v1", Some("not a date"));
        let resolver = MetadataResolver::new(&registry);
        assert!(resolver.resolve("app", "v1").await.is_none());
    }

    #[tokio::test]
    async fn test_resolve_all_skips_failures_and_duplicates() {
        let registry = FakeRegistry::default()
            .with_image("a", Some("2024-01-01T00:00:00Z"))
            .with_image("b", None)
            .with_image("c", Some("2024-03-01T00:00:00Z"));
        let resolver = MetadataResolver::new(&registry);
        let tags: Vec<String> = ["a", "b", "c", "a", "missing"]
            .iter()
            .map(ToString::to_string)
            .collect();

        let records = resolver
            .resolve_all("app", &tags, &CancellationToken::new())
            .await;
        let names: Vec<_> = records.iter().map(|r| r.tag.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_resolve_all_fetches_each_tag_once() {
        let registry = FakeRegistry::default().with_image("a", Some("2024-01-01T00:00:00Z"));
        let resolver = MetadataResolver::new(&registry);
        let tags: Vec<String> = ["gone", "a", "gone", "a", "a"]
            .iter()
            .map(ToString::to_string)
            .collect();

        let records = resolver
            .resolve_all("app", &tags, &CancellationToken::new())
            .await;

        assert_eq!(records.len(), 1);
        assert_eq!(registry.manifest_fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_resolve_all_honours_cancellation() {
        let registry = FakeRegistry::default().with_image("a", Some("2024-01-01T00:00:00Z"));
        let resolver = MetadataResolver::new(&registry);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let records = resolver
            .resolve_all("app", &["a".to_string()], &cancel)
            .await;
        assert!(records.is_empty());
    }
}
