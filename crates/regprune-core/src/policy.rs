//! Retention policy model.
//!
//! A [`RepositoryPolicy`] holds the two retention knobs for one repository.
//! A [`PolicySet`] carries the global defaults, the per-repository overrides
//! and the exclusion list, and derives the effective policy for any
//! repository. It is built once at startup and never mutated afterwards.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Retention parameters for a single repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryPolicy {
    /// Number of most recent tags that are always kept.
    pub recent_count: usize,

    /// Tags older than this many days (and not protected) are deleted.
    pub age_threshold_days: u32,
}

impl RepositoryPolicy {
    /// Creates a new repository policy.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use regprune_core::RepositoryPolicy;
    ///
    /// let policy = RepositoryPolicy::new(5, 30);
    /// assert_eq!(policy.recent_count, 5);
    /// assert_eq!(policy.age_threshold_days, 30);
    /// ```
    #[must_use]
    pub const fn new(recent_count: usize, age_threshold_days: u32) -> Self {
        Self {
            recent_count,
            age_threshold_days,
        }
    }

    /// Returns the age cut-off relative to `now`.
    ///
    /// Saturates at the earliest representable instant instead of overflowing.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chrono::{Duration, Utc};
    /// use regprune_core::RepositoryPolicy;
    ///
    /// let now = Utc::now();
    /// assert_eq!(RepositoryPolicy::new(0, 7).threshold(now), now - Duration::days(7));
    /// ```
    #[must_use]
    pub fn threshold(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(Duration::days(i64::from(self.age_threshold_days)))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// Global defaults, per-repository overrides and exclusions.
///
/// The two override maps are independent: a repository may override only
/// its recent-image count, only its age threshold, or both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicySet {
    /// Policy applied when a repository has no override.
    pub defaults: RepositoryPolicy,

    /// Repository name to recent-image count.
    #[serde(default)]
    pub recent_overrides: BTreeMap<String, usize>,

    /// Repository name to age threshold in days.
    #[serde(default)]
    pub age_overrides: BTreeMap<String, u32>,

    /// Repositories that are never touched (case-sensitive exact match).
    #[serde(default)]
    pub excluded: BTreeSet<String>,
}

impl PolicySet {
    /// Creates a policy set with the given defaults and no overrides.
    #[must_use]
    pub fn new(defaults: RepositoryPolicy) -> Self {
        Self {
            defaults,
            recent_overrides: BTreeMap::new(),
            age_overrides: BTreeMap::new(),
            excluded: BTreeSet::new(),
        }
    }

    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> PolicySetBuilder {
        PolicySetBuilder::default()
    }

    /// Returns the effective policy for a repository.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use regprune_core::{PolicySet, RepositoryPolicy};
    ///
    /// let set = PolicySet::builder()
    ///     .defaults(RepositoryPolicy::new(5, 30))
    ///     .recent_override("team/api", 10)
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(set.policy_for("team/api"), RepositoryPolicy::new(10, 30));
    /// assert_eq!(set.policy_for("team/web"), RepositoryPolicy::new(5, 30));
    /// ```
    #[must_use]
    pub fn policy_for(&self, repository: &str) -> RepositoryPolicy {
        RepositoryPolicy {
            recent_count: self
                .recent_overrides
                .get(repository)
                .copied()
                .unwrap_or(self.defaults.recent_count),
            age_threshold_days: self
                .age_overrides
                .get(repository)
                .copied()
                .unwrap_or(self.defaults.age_threshold_days),
        }
    }

    /// Returns true if the repository is excluded from cleanup.
    #[must_use]
    pub fn is_excluded(&self, repository: &str) -> bool {
        self.excluded.contains(repository)
    }
}

impl Default for PolicySet {
    fn default() -> Self {
        Self::new(RepositoryPolicy::new(0, 0))
    }
}

/// Builder for [`PolicySet`].
#[derive(Debug, Default)]
pub struct PolicySetBuilder {
    defaults: Option<RepositoryPolicy>,
    recent_overrides: BTreeMap<String, usize>,
    age_overrides: BTreeMap<String, u32>,
    excluded: BTreeSet<String>,
}

impl PolicySetBuilder {
    /// Sets the global defaults.
    #[must_use]
    pub const fn defaults(mut self, defaults: RepositoryPolicy) -> Self {
        self.defaults = Some(defaults);
        self
    }

    /// Overrides the recent-image count for one repository.
    #[must_use]
    pub fn recent_override(mut self, repository: impl Into<String>, count: usize) -> Self {
        self.recent_overrides.insert(repository.into(), count);
        self
    }

    /// Overrides the age threshold for one repository.
    #[must_use]
    pub fn age_override(mut self, repository: impl Into<String>, days: u32) -> Self {
        self.age_overrides.insert(repository.into(), days);
        self
    }

    /// Excludes a repository from cleanup.
    #[must_use]
    pub fn exclude(mut self, repository: impl Into<String>) -> Self {
        self.excluded.insert(repository.into());
        self
    }

    /// Excludes every repository in the iterator.
    #[must_use]
    pub fn exclude_all<I, S>(mut self, repositories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded.extend(repositories.into_iter().map(Into::into));
        self
    }

    /// Builds the policy set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPolicy`] if no defaults were given or a
    /// repository name is empty.
    pub fn build(self) -> Result<PolicySet> {
        let defaults = self.defaults.ok_or_else(|| Error::InvalidPolicy {
            reason: "global defaults are required".to_string(),
        })?;

        let names = self
            .recent_overrides
            .keys()
            .chain(self.age_overrides.keys())
            .chain(self.excluded.iter());
        for name in names {
            if name.trim().is_empty() {
                return Err(Error::InvalidPolicy {
                    reason: "repository name cannot be empty".to_string(),
                });
            }
        }

        Ok(PolicySet {
            defaults,
            recent_overrides: self.recent_overrides,
            age_overrides: self.age_overrides,
            excluded: self.excluded,
        })
    }
}
