//! Docker Registry HTTP API v2 client.
//!
//! This module provides [`RegistryClient`], the reqwest-backed
//! implementation of [`RegistryApi`].

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, LINK};
use reqwest::StatusCode;
use tracing::{debug, info, warn};
use url::Url;

use crate::api::{DeleteOutcome, ManifestRef, RegistryApi};
use crate::config::{RegistryAuth, RegistryConfig};
use crate::error::RegistryError;
use crate::oci::{Catalog, Manifest, MediaType, TagList, CONTENT_DIGEST_HEADER};

/// Client for a Docker Registry v2 API.
#[derive(Debug)]
pub struct RegistryClient {
    config: RegistryConfig,
    base: Url,
    http: reqwest::Client,
}

impl RegistryClient {
    /// Creates a new registry client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid, a certificate cannot be
    /// loaded, or the HTTP client cannot be created.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use regprune_registry::{RegistryClient, RegistryConfig};
    ///
    /// let config = RegistryConfig::new("http://localhost:5000");
    /// let client = RegistryClient::new(config)?;
    /// # Ok::<(), regprune_registry::RegistryError>(())
    /// ```
    pub fn new(config: RegistryConfig) -> Result<Self, RegistryError> {
        let base = Url::parse(config.base_url()).map_err(|_| RegistryError::InvalidUrl {
            url: config.url.clone(),
        })?;
        let http = Self::build_http_client(&config)?;

        Ok(Self { config, base, http })
    }

    /// Returns the registry configuration.
    #[must_use]
    pub const fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Fetches one catalog page and returns its repositories and the next page URL.
    async fn fetch_catalog_page(
        &self,
        url: &str,
    ) -> Result<(Vec<String>, Option<String>), RegistryError> {
        let response = self
            .http
            .get(url)
            .headers(self.auth_headers()?)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RegistryError::HttpError {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let next = response
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_next_link)
            .and_then(|link| self.base.join(&link).ok())
            .map(String::from);

        let catalog: Catalog = serde_json::from_slice(&response.bytes().await?)?;
        Ok((catalog.repositories, next))
    }

    async fn try_list_tags(&self, repository: &str) -> Result<Vec<String>, RegistryError> {
        let url = self.config.endpoint(&format!("/v2/{repository}/tags/list"));

        let response = self
            .http
            .get(&url)
            .headers(self.auth_headers()?)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RegistryError::HttpError {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let tag_list: TagList = serde_json::from_slice(&response.bytes().await?)?;
        Ok(tag_list.tags.unwrap_or_default())
    }

    async fn try_fetch_manifest(
        &self,
        repository: &str,
        reference: &str,
    ) -> Result<Option<ManifestRef>, RegistryError> {
        let url = self
            .config
            .endpoint(&format!("/v2/{repository}/manifests/{reference}"));

        let response = self
            .http
            .get(&url)
            .headers(self.auth_headers()?)
            .header(ACCEPT, MediaType::DOCKER_MANIFEST_V2)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RegistryError::HttpError {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let content_digest = response
            .headers()
            .get(CONTENT_DIGEST_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(ToString::to_string);

        let manifest: Manifest = serde_json::from_slice(&response.bytes().await?)?;

        Ok(match (content_digest, manifest.config_digest()) {
            (Some(content_digest), Some(config_digest)) => Some(ManifestRef {
                content_digest,
                config_digest: config_digest.to_string(),
            }),
            _ => None,
        })
    }

    async fn try_fetch_blob(
        &self,
        repository: &str,
        digest: &str,
    ) -> Result<Vec<u8>, RegistryError> {
        let url = self.config.endpoint(&format!("/v2/{repository}/blobs/{digest}"));

        let response = self
            .http
            .get(&url)
            .headers(self.auth_headers()?)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RegistryError::HttpError {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        response.bytes().await.map(|b| b.to_vec()).map_err(Into::into)
    }

    /// Builds the HTTP client with proper configuration.
    fn build_http_client(config: &RegistryConfig) -> Result<reqwest::Client, RegistryError> {
        let mut builder = reqwest::Client::builder().user_agent(&config.user_agent);

        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(ref tls) = config.tls {
            if tls.insecure_skip_verify {
                builder = builder.danger_accept_invalid_certs(true);
            }

            if let Some(ref ca_cert) = tls.ca_cert {
                let cert_pem = std::fs::read(ca_cert).map_err(|e| RegistryError::IoError {
                    path: ca_cert.clone(),
                    source: e,
                })?;
                let cert = reqwest::Certificate::from_pem(&cert_pem).map_err(|e| {
                    RegistryError::InvalidCertificate {
                        message: format!("Invalid CA certificate: {e}"),
                    }
                })?;
                builder = builder.add_root_certificate(cert);
            }
        }

        builder.build().map_err(|e| RegistryError::ConnectionFailed {
            url: config.url.clone(),
            source: e,
        })
    }

    /// Creates authentication headers based on configuration.
    fn auth_headers(&self) -> Result<HeaderMap, RegistryError> {
        let mut headers = HeaderMap::new();

        match &self.config.auth {
            RegistryAuth::None => {}
            RegistryAuth::Basic { username, password } => {
                let credentials = base64::Engine::encode(
                    &base64::engine::general_purpose::STANDARD,
                    format!("{username}:{password}"),
                );
                headers.insert(
                    AUTHORIZATION,
                    HeaderValue::from_str(&format!("Basic {credentials}")).map_err(|_| {
                        RegistryError::AuthenticationFailed {
                            message: "Invalid credentials".to_string(),
                        }
                    })?,
                );
            }
            RegistryAuth::Bearer { token } => {
                headers.insert(
                    AUTHORIZATION,
                    HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                        RegistryError::AuthenticationFailed {
                            message: "Invalid token".to_string(),
                        }
                    })?,
                );
            }
        }

        Ok(headers)
    }
}

#[async_trait]
impl RegistryApi for RegistryClient {
    async fn list_repositories(&self) -> Result<Vec<String>, RegistryError> {
        let mut repositories = Vec::new();
        let mut next = Some(self.config.endpoint("/v2/_catalog"));

        while let Some(url) = next.take() {
            let (page, following) = self.fetch_catalog_page(&url).await?;
            repositories.extend(page);
            // A registry that echoes the same page back would loop forever.
            next = following.filter(|following| *following != url);
        }

        debug!(count = repositories.len(), "Listed catalog");
        Ok(repositories)
    }

    async fn list_tags(&self, repository: &str) -> Vec<String> {
        match self.try_list_tags(repository).await {
            Ok(tags) => tags,
            Err(e) => {
                debug!(repository, error = %e, "Tag listing unavailable");
                Vec::new()
            }
        }
    }

    async fn fetch_manifest(&self, repository: &str, reference: &str) -> Option<ManifestRef> {
        match self.try_fetch_manifest(repository, reference).await {
            Ok(Some(manifest)) => Some(manifest),
            Ok(None) => {
                debug!(repository, reference, "Manifest lacks content or config digest");
                None
            }
            Err(e) => {
                debug!(repository, reference, error = %e, "Manifest unavailable");
                None
            }
        }
    }

    async fn fetch_blob(&self, repository: &str, digest: &str) -> Option<Vec<u8>> {
        match self.try_fetch_blob(repository, digest).await {
            Ok(blob) => Some(blob),
            Err(e) => {
                debug!(repository, digest, error = %e, "Blob unavailable");
                None
            }
        }
    }

    async fn delete_manifest(&self, repository: &str, digest: &str) -> DeleteOutcome {
        let url = self
            .config
            .endpoint(&format!("/v2/{repository}/manifests/{digest}"));

        let headers = match self.auth_headers() {
            Ok(headers) => headers,
            Err(e) => {
                return DeleteOutcome::Failed {
                    message: e.to_string(),
                }
            }
        };

        match self.http.delete(&url).headers(headers).send().await {
            Ok(response) if response.status() == StatusCode::ACCEPTED => {
                info!(repository, digest, "Deleted manifest");
                DeleteOutcome::Accepted
            }
            Ok(response) => {
                let status = response.status().as_u16();
                warn!(repository, digest, status, "Registry rejected manifest deletion");
                DeleteOutcome::Rejected { status }
            }
            Err(e) => {
                warn!(repository, digest, error = %e, "Manifest deletion request failed");
                DeleteOutcome::Failed {
                    message: e.to_string(),
                }
            }
        }
    }
}

/// Extracts the target of a `rel="next"` entry from a `Link` header.
///
/// # Examples
///
/// ```text
/// </v2/_catalog?last=b&n=100>; rel="next"  ->  /v2/_catalog?last=b&n=100
/// ```
fn parse_next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|entry| {
        let (target, params) = entry.split_once(';')?;
        let is_next = params
            .split(';')
            .any(|p| p.trim().trim_start_matches("rel=").trim_matches('"') == "next");
        if !is_next {
            return None;
        }
        let target = target.trim();
        target
            .strip_prefix('<')
            .and_then(|t| t.strip_suffix('>'))
            .map(ToString::to_string)
    })
}
