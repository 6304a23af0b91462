//! Configuration loading.
//!
//! Options come from a YAML file whose keys match the legacy `config.ini`
//! names, then from environment variables of the same name, then from
//! command-line flags. The result is an immutable [`Settings`] value built
//! once at startup.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use regprune_cleanup::{
    CleanupConfig, GcConfig, DEFAULT_GC_CONFIG_PATH, DEFAULT_GC_CONTAINER, DEFAULT_REPOSITORY_PATH,
};
use regprune_core::{PolicySet, RepositoryPolicy};
use regprune_registry::{RegistryAuth, RegistryConfig, TlsConfig};
use serde::Deserialize;

/// Configuration file read when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "config.yml";

/// Log file used when `LOG_FILE` is not set.
pub const DEFAULT_LOG_FILE: &str = "docker_registry_cleanup.log";

/// Option overrides shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct SettingsArgs {
    /// Path to the YAML configuration file
    #[arg(short, long, env = "REGPRUNE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Registry base URL (e.g., `<http://localhost:5000>`)
    #[arg(long, env = "REGISTRY", global = true)]
    pub registry: Option<String>,

    /// Default age threshold in days
    #[arg(long, env = "DEFAULT_DAYS_THRESHOLD", global = true)]
    pub default_days_threshold: Option<u32>,

    /// Default number of recent images to keep
    #[arg(long, env = "DEFAULT_RECENT_IMAGES", global = true)]
    pub default_recent_images: Option<usize>,

    /// Comma-separated repositories to leave untouched
    #[arg(long, env = "EXCLUDE_REPOS", global = true)]
    pub exclude_repos: Option<String>,

    /// Registry storage directory holding one directory per repository
    #[arg(long, env = "REPOSITORY_PATH", global = true)]
    pub repository_path: Option<PathBuf>,

    /// File that log output is appended to
    #[arg(long, env = "LOG_FILE", global = true)]
    pub log_file: Option<PathBuf>,

    /// Container running the registry, used for garbage collection
    #[arg(long, env = "GC_CONTAINER", global = true)]
    pub gc_container: Option<String>,

    /// Registry configuration path inside the container
    #[arg(long, env = "GC_CONFIG_PATH", global = true)]
    pub gc_config_path: Option<String>,

    /// Run registry garbage collection after deletions
    #[arg(long, env = "GC_ENABLED", global = true)]
    pub gc_enabled: Option<bool>,

    /// Username for basic authentication
    #[arg(long, env = "REGISTRY_USERNAME", global = true)]
    pub username: Option<String>,

    /// Password for basic authentication
    #[arg(long, env = "REGISTRY_PASSWORD", hide_env_values = true, global = true)]
    pub password: Option<String>,

    /// Bearer token for authentication
    #[arg(long, env = "REGISTRY_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// CA certificate (PEM) for registries with a private certificate authority
    #[arg(long, env = "REGISTRY_CA_CERT", global = true)]
    pub ca_cert: Option<PathBuf>,

    /// Skip TLS certificate verification
    #[arg(long, env = "REGISTRY_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (no timeout when unset)
    #[arg(long, env = "REGISTRY_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

/// Repository list given either as a comma-separated string or a YAML list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RepositoryList {
    /// `"a,b,c"`
    Csv(String),
    /// `[a, b, c]`
    List(Vec<String>),
}

impl RepositoryList {
    /// Returns the trimmed, non-empty names.
    pub fn names(&self) -> Vec<String> {
        match self {
            Self::Csv(csv) => split_names(csv.split(',')),
            Self::List(list) => split_names(list.iter().map(String::as_str)),
        }
    }
}

fn split_names<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    names
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Raw contents of the configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileSettings {
    #[serde(rename = "REGISTRY")]
    registry: Option<String>,

    #[serde(rename = "DEFAULT_DAYS_THRESHOLD")]
    default_days_threshold: Option<u32>,

    #[serde(rename = "DEFAULT_RECENT_IMAGES")]
    default_recent_images: Option<usize>,

    #[serde(rename = "EXCLUDE_REPOS")]
    exclude_repos: Option<RepositoryList>,

    #[serde(rename = "REPOSITORY_PATH")]
    repository_path: Option<PathBuf>,

    #[serde(rename = "LOG_FILE")]
    log_file: Option<PathBuf>,

    #[serde(rename = "SPECIFIC_RECENT_IMAGES")]
    specific_recent_images: BTreeMap<String, usize>,

    #[serde(rename = "SPECIFIC_DAYS_THRESHOLD")]
    specific_days_threshold: BTreeMap<String, u32>,

    #[serde(rename = "GC_CONTAINER")]
    gc_container: Option<String>,

    #[serde(rename = "GC_CONFIG_PATH")]
    gc_config_path: Option<String>,

    #[serde(rename = "GC_ENABLED")]
    gc_enabled: Option<bool>,
}

impl FileSettings {
    /// Parses YAML configuration text.
    pub fn from_yaml(text: &str) -> Result<Self> {
        // An empty document deserializes to unit, not a map.
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).context("Invalid configuration file")
    }

    /// Reads a configuration file.
    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
        Self::from_yaml(&text)
            .with_context(|| format!("Failed to parse configuration file {}", path.display()))
    }
}

/// Effective configuration for a run.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Registry base URL.
    pub registry: String,
    /// Credentials passed through to the registry.
    pub auth: RegistryAuth,
    /// TLS settings, if any were given.
    pub tls: Option<TlsConfig>,
    /// Request timeout, if any.
    pub timeout: Option<Duration>,
    /// Retention defaults, overrides and exclusions.
    pub policies: PolicySet,
    /// Registry storage directory.
    pub repository_path: PathBuf,
    /// Log file path.
    pub log_file: PathBuf,
    /// Garbage collection command.
    pub gc: GcConfig,
}

impl Settings {
    /// Loads the configuration file and applies overrides.
    ///
    /// A missing default `config.yml` is tolerated so everything can be set
    /// through the environment; an explicit `--config` must exist.
    pub fn load(args: &SettingsArgs) -> Result<Self> {
        let file = match &args.config {
            Some(path) => FileSettings::read(path)?,
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    FileSettings::read(path)?
                } else {
                    FileSettings::default()
                }
            }
        };
        Self::resolve(file, args)
    }

    /// Merges file settings with overrides.
    pub fn resolve(file: FileSettings, args: &SettingsArgs) -> Result<Self> {
        let registry = args
            .registry
            .clone()
            .or(file.registry)
            .context("Missing required option REGISTRY")?;
        let days = args
            .default_days_threshold
            .or(file.default_days_threshold)
            .context("Missing required option DEFAULT_DAYS_THRESHOLD")?;
        let recent = args
            .default_recent_images
            .or(file.default_recent_images)
            .context("Missing required option DEFAULT_RECENT_IMAGES")?;

        let excluded = args
            .exclude_repos
            .clone()
            .map(RepositoryList::Csv)
            .or(file.exclude_repos)
            .map(|list| list.names())
            .unwrap_or_default();

        let mut builder = PolicySet::builder()
            .defaults(RepositoryPolicy::new(recent, days))
            .exclude_all(excluded);
        for (repository, count) in file.specific_recent_images {
            builder = builder.recent_override(repository, count);
        }
        for (repository, days) in file.specific_days_threshold {
            builder = builder.age_override(repository, days);
        }
        let policies = builder.build().context("Invalid retention policy")?;

        let gc = GcConfig::docker_exec(
            args.gc_container
                .clone()
                .or(file.gc_container)
                .unwrap_or_else(|| DEFAULT_GC_CONTAINER.to_string()),
            args.gc_config_path
                .clone()
                .or(file.gc_config_path)
                .unwrap_or_else(|| DEFAULT_GC_CONFIG_PATH.to_string()),
        );
        let gc = if args.gc_enabled.or(file.gc_enabled).unwrap_or(true) {
            gc
        } else {
            gc.disabled()
        };

        let auth = match (&args.username, &args.password, &args.token) {
            (Some(username), Some(password), None) => RegistryAuth::basic(username, password),
            (None, None, Some(token)) => RegistryAuth::bearer(token),
            (None, None, None) => RegistryAuth::None,
            (_, _, Some(_)) => {
                anyhow::bail!("REGISTRY_TOKEN cannot be combined with a username or password")
            }
            _ => anyhow::bail!("Both REGISTRY_USERNAME and REGISTRY_PASSWORD must be set"),
        };

        let tls = match (&args.ca_cert, args.insecure) {
            (None, false) => None,
            (ca_cert, insecure) => {
                let mut tls = TlsConfig::new();
                if let Some(path) = ca_cert {
                    tls = tls.with_ca_cert(path);
                }
                if insecure {
                    tls = tls.insecure();
                }
                Some(tls)
            }
        };

        Ok(Self {
            registry,
            auth,
            tls,
            timeout: args.timeout.map(Duration::from_secs),
            policies,
            repository_path: args
                .repository_path
                .clone()
                .or(file.repository_path)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_REPOSITORY_PATH)),
            log_file: args
                .log_file
                .clone()
                .or(file.log_file)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
            gc,
        })
    }

    /// Registry client configuration.
    pub fn registry_config(&self) -> RegistryConfig {
        let mut config = RegistryConfig::new(&self.registry).with_auth(self.auth.clone());
        if let Some(tls) = &self.tls {
            config = config.with_tls(tls.clone());
        }
        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }
        config
    }

    /// Cleanup configuration.
    pub fn cleanup_config(&self, dry_run: bool) -> CleanupConfig {
        CleanupConfig::new(self.policies.clone())
            .with_repository_path(&self.repository_path)
            .with_gc(self.gc.clone())
            .dry_run(dry_run)
    }
}
