//! Install manifest and bucket versioning.

use reqwest::Url;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

pub const DEFAULT_PREFIX: &str = "bytecraft";
pub const DEFAULT_OFFLINE_PAGE: &str = "./offline.html";

/// The application shell
pub const DEFAULT_ASSETS: [&str; 14] = [
    "./",
    "./offline.html",
    "./login.html",
    "./login.css",
    "./login.js",
    "./dashboard.html",
    "./dashboard.css",
    "./dashboard.js",
    "./manifest.json",
    "./72x72.png",
    "./96x96.png",
    "./128x128.png",
    "./192x192.png",
    "./512x512.png",
];

/// Hex digits of the version kept in the bucket name
const BUCKET_HASH_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    prefix: String,
    assets: Vec<String>,
    offline_page: String,
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            assets: DEFAULT_ASSETS.iter().map(|path| path.to_string()).collect(),
            offline_page: DEFAULT_OFFLINE_PAGE.to_string(),
        }
    }
}

impl Manifest {
    /// The offline page must itself be part of the manifest
    pub fn new(
        prefix: impl Into<String>,
        assets: Vec<String>,
        offline_page: impl Into<String>,
    ) -> Result<Self> {
        let prefix = prefix.into();
        let offline_page = offline_page.into();

        if prefix.is_empty()
            || !prefix
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
        {
            return Err(Error::InvalidConfig(format!(
                "cache prefix '{prefix}' must be non-empty and use only [A-Za-z0-9_-]"
            )));
        }
        if assets.is_empty() {
            return Err(Error::InvalidConfig("cache manifest is empty".to_string()));
        }
        if !assets.contains(&offline_page) {
            return Err(Error::InvalidConfig(format!(
                "offline page '{offline_page}' is not listed in the cache manifest"
            )));
        }

        Ok(Self {
            prefix,
            assets,
            offline_page,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    pub fn offline_page(&self) -> &str {
        &self.offline_page
    }

    /// SHA-256 over the asset list, one path per line
    pub fn version(&self) -> String {
        let mut hasher = Sha256::new();
        for asset in &self.assets {
            hasher.update(asset.as_bytes());
            hasher.update(b"\n");
        }
        format!("{:x}", hasher.finalize())
    }

    /// `<prefix>-<version prefix>`
    pub fn bucket_name(&self) -> String {
        let version = self.version();
        format!("{}-{}", self.prefix, &version[..BUCKET_HASH_LEN])
    }
}

/// Parse the origin the relative asset paths resolve against
///
/// A missing trailing slash is added so `./x` lands inside the origin path.
pub fn parse_origin(raw: &str) -> Result<Url> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    Url::parse(&normalized)
        .map_err(|err| Error::InvalidConfig(format!("invalid cache origin '{raw}': {err}")))
}

/// Absolute URL of a manifest path
pub fn resolve(origin: &Url, path: &str) -> Result<String> {
    origin
        .join(path)
        .map(String::from)
        .map_err(|err| Error::InvalidArgument(format!("cannot resolve '{path}': {err}")))
}
