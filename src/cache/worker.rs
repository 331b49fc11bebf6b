//! Install, activate and fetch routing.

use reqwest::{Method, Url};
use serde::Serialize;

use super::manifest::{self, Manifest};
use super::{CacheStorage, CachedResponse, Fetcher, Request};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub bucket: String,
    pub version: String,
    /// Entries written; zero when any asset failed
    pub cached: usize,
    pub warnings: Vec<String>,
}

impl InstallReport {
    pub fn is_complete(&self) -> bool {
        self.warnings.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivateReport {
    pub bucket: String,
    pub deleted: Vec<String>,
}

/// How a fetch was answered
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Cache(CachedResponse),
    Network(CachedResponse),
    /// Navigation while the network is unreachable
    OfflinePage(CachedResponse),
    /// Not a GET; left to the caller untouched
    Passthrough,
}

impl FetchOutcome {
    pub fn source(&self) -> &'static str {
        match self {
            FetchOutcome::Cache(_) => "cache",
            FetchOutcome::Network(_) => "network",
            FetchOutcome::OfflinePage(_) => "offline_page",
            FetchOutcome::Passthrough => "passthrough",
        }
    }

    pub fn response(&self) -> Option<&CachedResponse> {
        match self {
            FetchOutcome::Cache(r) | FetchOutcome::Network(r) | FetchOutcome::OfflinePage(r) => {
                Some(r)
            }
            FetchOutcome::Passthrough => None,
        }
    }
}

pub struct CacheWorker<C, F> {
    manifest: Manifest,
    origin: Url,
    cache: C,
    fetcher: F,
}

impl<C: CacheStorage, F: Fetcher> CacheWorker<C, F> {
    pub fn new(manifest: Manifest, origin: Url, cache: C, fetcher: F) -> Self {
        Self {
            manifest,
            origin,
            cache,
            fetcher,
        }
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn bucket(&self) -> String {
        self.manifest.bucket_name()
    }

    /// Absolute URL of a manifest-relative path
    pub fn resolve(&self, path: &str) -> Result<String> {
        manifest::resolve(&self.origin, path)
    }

    /// Open the current bucket and fill it with the whole manifest
    ///
    /// Every asset is fetched before anything is written, so a single
    /// failure leaves the bucket empty. Asset failures become warnings.
    /// A failed write is an error and empties the bucket again.
    pub async fn install(&self) -> Result<InstallReport> {
        let bucket = self.bucket();
        self.cache.open(&bucket).await?;
        tracing::info!(bucket = %bucket, assets = self.manifest.assets().len(), "installing cache");

        let mut fetched = Vec::with_capacity(self.manifest.assets().len());
        let mut warnings = Vec::new();
        for path in self.manifest.assets() {
            match self.fetch_asset(path).await {
                Ok(response) => fetched.push(response),
                Err(err) => {
                    tracing::warn!(asset = %path, error = %err, "asset failed; cache left unpopulated");
                    warnings.push(format!("{path}: {err}"));
                }
            }
        }

        let mut report = InstallReport {
            bucket: bucket.clone(),
            version: self.manifest.version(),
            cached: 0,
            warnings,
        };
        if report.is_complete() {
            for response in &fetched {
                if let Err(err) = self.cache.put(&bucket, response).await {
                    tracing::error!(bucket = %bucket, url = %response.url, error = %err, "cache write failed; discarding bucket");
                    self.discard(&bucket).await;
                    return Err(err);
                }
            }
            report.cached = fetched.len();
        }
        Ok(report)
    }

    /// Replace a half-written bucket with an empty one
    async fn discard(&self, bucket: &str) {
        let reset = match self.cache.delete(bucket).await {
            Ok(_) => self.cache.open(bucket).await,
            Err(err) => Err(err),
        };
        if let Err(err) = reset {
            tracing::warn!(bucket = %bucket, error = %err, "could not empty bucket");
        }
    }

    async fn fetch_asset(&self, path: &str) -> Result<CachedResponse> {
        let url = self.resolve(path)?;
        let response = self.fetcher.fetch(&Request::get(url.clone())).await?;
        if !response.is_success() {
            return Err(Error::Network {
                url,
                reason: format!("unexpected status {}", response.status),
            });
        }
        Ok(response)
    }

    /// Delete every bucket other than the current one
    pub async fn activate(&self) -> Result<ActivateReport> {
        let bucket = self.bucket();
        let mut deleted = Vec::new();
        for name in self.cache.keys().await? {
            if name != bucket {
                tracing::info!(bucket = %name, "deleting stale cache");
                self.cache.delete(&name).await?;
                deleted.push(name);
            }
        }
        Ok(ActivateReport { bucket, deleted })
    }

    /// Cache first, then network, then the offline page for navigations
    pub async fn handle_fetch(&self, request: &Request) -> Result<FetchOutcome> {
        if request.method != Method::GET {
            tracing::debug!(method = %request.method, url = %request.url, "passthrough");
            return Ok(FetchOutcome::Passthrough);
        }

        if let Some(hit) = self.cache.lookup_any(&request.url).await? {
            tracing::debug!(url = %request.url, "cache hit");
            return Ok(FetchOutcome::Cache(hit));
        }

        match self.fetcher.fetch(request).await {
            Ok(response) => {
                tracing::debug!(url = %request.url, status = response.status, "network");
                Ok(FetchOutcome::Network(response))
            }
            Err(err) if request.is_navigation() => {
                let offline_url = self.resolve(self.manifest.offline_page())?;
                match self.cache.lookup_any(&offline_url).await? {
                    Some(page) => {
                        tracing::debug!(url = %request.url, error = %err, "network failed; serving offline page");
                        Ok(FetchOutcome::OfflinePage(page))
                    }
                    None => Err(err),
                }
            }
            Err(err) => Err(err),
        }
    }
}
