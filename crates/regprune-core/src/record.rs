//! Resolved tag metadata.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

/// Metadata resolved for one tag of a repository.
///
/// Records are built fresh from live registry state on every run and are
/// never mutated afterwards. Within one repository every record carries a
/// distinct tag.
///
/// # Examples
///
/// ```rust
/// use chrono::DateTime;
/// use regprune_core::TagRecord;
///
/// let created = DateTime::parse_from_rfc3339("2024-03-01T12:00:00+02:00").unwrap();
/// let record = TagRecord::new("v1.4.0", created, "sha256:9f86d081");
///
/// assert_eq!(record.tag, "v1.4.0");
/// assert_eq!(record.created_utc().to_rfc3339(), "2024-03-01T10:00:00+00:00");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRecord {
    /// Tag name (a mutable alias for the manifest).
    pub tag: String,

    /// Image creation time, with the offset it was recorded in.
    pub created: DateTime<FixedOffset>,

    /// Content digest of the manifest; the deletion key.
    pub manifest_digest: String,
}

impl TagRecord {
    /// Creates a new tag record.
    #[must_use]
    pub fn new(
        tag: impl Into<String>,
        created: DateTime<FixedOffset>,
        manifest_digest: impl Into<String>,
    ) -> Self {
        Self {
            tag: tag.into(),
            created,
            manifest_digest: manifest_digest.into(),
        }
    }

    /// Returns the creation time normalized to UTC.
    #[must_use]
    pub fn created_utc(&self) -> DateTime<Utc> {
        self.created.with_timezone(&Utc)
    }
}
