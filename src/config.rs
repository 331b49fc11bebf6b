//! Configuration loading and management
//!
//! Handles parsing of `.bytecraft.toml` in the data directory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cache::manifest::{self, Manifest, DEFAULT_ASSETS, DEFAULT_OFFLINE_PAGE, DEFAULT_PREFIX};
use crate::error::{Error, Result};
use crate::notify::DEFAULT_NOTIFICATION_CAP;
use crate::store::{store_key, StoreOptions, DEFAULT_NAMESPACE};

/// Config file name inside the data directory
pub const CONFIG_FILE: &str = ".bytecraft.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub notifications: NotificationsConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Storage key is `<namespace>_db`
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Milliseconds to wait for the write lock
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_lock_timeout_ms() -> u64 {
    crate::lock::DEFAULT_LOCK_TIMEOUT_MS
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// Entries kept in the log
    #[serde(default = "default_cap")]
    pub cap: usize,

    /// Desktop notification permission
    #[serde(default)]
    pub desktop: bool,
}

fn default_cap() -> usize {
    DEFAULT_NOTIFICATION_CAP
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            cap: default_cap(),
            desktop: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Initial connectivity state
    #[serde(default = "default_true")]
    pub online: bool,

    /// `host:port` probed to decide connectivity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probe: Option<String>,

    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
}

fn default_true() -> bool {
    true
}

fn default_probe_timeout_ms() -> u64 {
    1500
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            online: true,
            probe: None,
            probe_timeout_ms: default_probe_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Bucket name prefix
    #[serde(default = "default_prefix")]
    pub prefix: String,

    #[serde(default = "default_offline_page")]
    pub offline_page: String,

    /// Asset paths relative to `origin`
    #[serde(default = "default_manifest")]
    pub manifest: Vec<String>,

    #[serde(default = "default_origin")]
    pub origin: String,

    /// Serve assets from this directory instead of the network
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_dir: Option<PathBuf>,
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

fn default_offline_page() -> String {
    DEFAULT_OFFLINE_PAGE.to_string()
}

fn default_manifest() -> Vec<String> {
    DEFAULT_ASSETS.iter().map(|path| path.to_string()).collect()
}

fn default_origin() -> String {
    "http://localhost:8080/".to_string()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            offline_page: default_offline_page(),
            manifest: default_manifest(),
            origin: default_origin(),
            source_dir: None,
        }
    }
}

impl CacheConfig {
    pub fn to_manifest(&self) -> Result<Manifest> {
        Manifest::new(
            self.prefix.clone(),
            self.manifest.clone(),
            self.offline_page.clone(),
        )
    }

    pub fn origin_url(&self) -> Result<reqwest::Url> {
        manifest::parse_origin(&self.origin)
    }

    fn validate(&self) -> Result<()> {
        self.to_manifest()?;
        self.origin_url()?;
        Ok(())
    }
}

impl Config {
    /// Load configuration from a `.bytecraft.toml` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the data directory, or return defaults
    pub fn load_from_dir(data_dir: &Path) -> Self {
        let config_path = data_dir.join(CONFIG_FILE);
        if !config_path.exists() {
            return Self::default();
        }
        match Self::load(&config_path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(path = %config_path.display(), error = %err, "ignoring unreadable config");
                Self::default()
            }
        }
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            key: store_key(&self.store.namespace),
            notification_cap: self.notifications.cap,
        }
    }

    fn validate(&self) -> Result<()> {
        let namespace = self.store.namespace.trim();
        if namespace.is_empty() {
            return Err(Error::InvalidConfig(
                "store.namespace cannot be empty".to_string(),
            ));
        }
        if !namespace
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
        {
            return Err(Error::InvalidConfig(
                "store.namespace must use only [A-Za-z0-9_-]".to_string(),
            ));
        }
        if self.notifications.cap == 0 || self.notifications.cap > DEFAULT_NOTIFICATION_CAP {
            return Err(Error::InvalidConfig(format!(
                "notifications.cap must be between 1 and {DEFAULT_NOTIFICATION_CAP}"
            )));
        }
        if let Some(probe) = &self.network.probe {
            if !probe.contains(':') {
                return Err(Error::InvalidConfig(format!(
                    "network.probe '{probe}' must be host:port"
                )));
            }
        }
        self.cache.validate()?;
        Ok(())
    }
}

/// Data directory: explicit path, else the platform data dir
pub fn resolve_data_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    directories::ProjectDirs::from("com", "ByteCraft", "bytecraft")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| {
            Error::InvalidConfig(
                "no home directory found; pass --data-dir or set BYTECRAFT_DATA_DIR".to_string(),
            )
        })
}
