//! Configuration types for a cleanup run.

use std::path::PathBuf;

use regprune_core::PolicySet;

/// Default on-disk location of repository metadata for the reference registry.
pub const DEFAULT_REPOSITORY_PATH: &str = "/var/lib/registry/docker/registry/v2/repositories";

/// Default name of the container running the registry.
pub const DEFAULT_GC_CONTAINER: &str = "docker-registry";

/// Default path of the registry configuration inside its container.
pub const DEFAULT_GC_CONFIG_PATH: &str = "/etc/docker/registry/config.yml";

/// Configuration for a cleanup run.
#[derive(Debug, Clone)]
pub struct CleanupConfig {
    /// Retention defaults, overrides and exclusions.
    pub policies: PolicySet,

    /// Base directory holding one directory per repository.
    pub repository_path: PathBuf,

    /// Garbage collection settings.
    pub gc: GcConfig,

    /// Compute and report decisions without deleting anything.
    pub dry_run: bool,
}

impl CleanupConfig {
    /// Creates a configuration with default paths and garbage collection.
    #[must_use]
    pub fn new(policies: PolicySet) -> Self {
        Self {
            policies,
            repository_path: PathBuf::from(DEFAULT_REPOSITORY_PATH),
            gc: GcConfig::default(),
            dry_run: false,
        }
    }

    /// Sets the repository storage root.
    #[must_use]
    pub fn with_repository_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.repository_path = path.into();
        self
    }

    /// Sets the garbage collection settings.
    #[must_use]
    pub fn with_gc(mut self, gc: GcConfig) -> Self {
        self.gc = gc;
        self
    }

    /// Enables or disables dry-run mode.
    #[must_use]
    pub const fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// External garbage collection command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GcConfig {
    /// Whether garbage collection runs at all.
    pub enabled: bool,

    /// Program to execute.
    pub program: String,

    /// Program arguments.
    pub args: Vec<String>,
}

impl GcConfig {
    /// Runs `registry garbage-collect` inside a container via `docker exec`.
    ///
    /// # Examples
    ///
    /// ```
    /// use regprune_cleanup::GcConfig;
    ///
    /// let gc = GcConfig::docker_exec("registry", "/etc/registry.yml");
    /// assert_eq!(gc.program, "docker");
    /// assert_eq!(
    ///     gc.args,
    ///     ["exec", "registry", "registry", "garbage-collect", "/etc/registry.yml"]
    /// );
    /// ```
    #[must_use]
    pub fn docker_exec(container: impl Into<String>, config_path: impl Into<String>) -> Self {
        Self {
            enabled: true,
            program: "docker".to_string(),
            args: vec![
                "exec".to_string(),
                container.into(),
                "registry".to_string(),
                "garbage-collect".to_string(),
                config_path.into(),
            ],
        }
    }

    /// Uses an arbitrary command.
    #[must_use]
    pub fn command<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            enabled: true,
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Disables garbage collection.
    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

impl Default for GcConfig {
    fn default() -> Self {
        Self::docker_exec(DEFAULT_GC_CONTAINER, DEFAULT_GC_CONFIG_PATH)
    }
}
