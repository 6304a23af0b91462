//! # regprune Registry
//!
//! Docker Registry HTTP API v2 client and tag metadata resolver for regprune.
//!
//! This crate talks to the registry that is being cleaned up. It lists the
//! catalog and tags, resolves each tag to its manifest digest and image
//! creation time, and issues manifest deletions.
//!
//! ## Features
//!
//! - **Registry API v2**: catalog (with pagination), tags, manifests, blobs, deletion
//! - **Explicit absence**: expected "not found" conditions are empty values, not errors
//! - **Pass-through auth**: Basic or Bearer credentials sent as-is
//! - **Resolution**: manifest digest, config digest and creation time per tag
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use regprune_core::CancellationToken;
//! use regprune_registry::{MetadataResolver, RegistryApi, RegistryClient, RegistryConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = RegistryClient::new(RegistryConfig::new("http://localhost:5000"))?;
//!
//!     for repository in client.list_repositories().await? {
//!         let tags = client.list_tags(&repository).await;
//!         let records = MetadataResolver::new(&client)
//!             .resolve_all(&repository, &tags, &CancellationToken::new())
//!             .await;
//!         println!("{repository}: {} resolvable tags", records.len());
//!     }
//!
//!     Ok(())
//! }
//! ```

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod api;
mod client;
mod config;
mod error;
mod oci;
mod resolver;

pub use api::{DeleteOutcome, ManifestRef, RegistryApi};
pub use client::RegistryClient;
pub use config::{RegistryAuth, RegistryConfig, TlsConfig};
pub use error::RegistryError;
pub use oci::{
    Catalog, Descriptor, ImageConfig, Manifest, MediaType, TagList, CONTENT_DIGEST_HEADER,
};
pub use resolver::MetadataResolver;
