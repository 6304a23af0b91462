//! Orphaned repository removal.
//!
//! Garbage collection does not remove the directory of a repository whose
//! tags are all gone, so the catalog keeps listing it. The sweep deletes
//! those directories from the registry's storage root.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use crate::error::{CleanupError, Result};

/// Trait for removing the storage of an orphaned repository.
#[async_trait]
pub trait OrphanStore: Send + Sync {
    /// Removes the repository's storage.
    ///
    /// Returns `Ok(false)` if there was nothing to remove.
    async fn remove(&self, repository: &str) -> Result<bool>;
}

/// Removes repository directories under a base path on the local filesystem.
#[derive(Debug, Clone)]
pub struct FsOrphanStore {
    root: PathBuf,
}

impl FsOrphanStore {
    /// Creates a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the directory of a repository, refusing names that leave the root.
    ///
    /// # Errors
    ///
    /// Returns [`CleanupError::UnsafePath`] for empty, absolute or `..` names.
    pub fn location(&self, repository: &str) -> Result<PathBuf> {
        let relative = Path::new(repository);
        let mut components = relative.components().peekable();
        let safe = components.peek().is_some()
            && components.all(|c| matches!(c, Component::Normal(_)));

        if safe {
            Ok(self.root.join(relative))
        } else {
            Err(CleanupError::UnsafePath {
                repository: repository.to_string(),
            })
        }
    }
}

#[async_trait]
impl OrphanStore for FsOrphanStore {
    async fn remove(&self, repository: &str) -> Result<bool> {
        let path = self.location(repository)?;

        match tokio::fs::metadata(&path).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(CleanupError::Io { path, source: e }),
        }

        tokio::fs::remove_dir_all(&path)
            .await
            .map_err(|e| CleanupError::Io { path, source: e })?;
        Ok(true)
    }
}
