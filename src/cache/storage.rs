//! Cache buckets.
//!
//! On disk each bucket is a directory under the cache root; each entry is
//! a body file plus a JSON sidecar with the URL, status and content type,
//! both named by the SHA-256 of the URL:
//!
//! ```text
//! cache/
//!   bytecraft-2f1c0a9e7b3d4c11/
//!     <sha>.body
//!     <sha>.json
//! ```

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::CachedResponse;
use crate::error::{Error, Result};

/// Named buckets of cached responses keyed by URL
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Create the bucket if missing
    async fn open(&self, bucket: &str) -> Result<()>;

    /// All bucket names
    async fn keys(&self) -> Result<Vec<String>>;

    /// Returns whether the bucket existed
    async fn delete(&self, bucket: &str) -> Result<bool>;

    async fn put(&self, bucket: &str, response: &CachedResponse) -> Result<()>;

    async fn lookup(&self, bucket: &str, url: &str) -> Result<Option<CachedResponse>>;

    /// URLs stored in a bucket
    async fn entries(&self, bucket: &str) -> Result<Vec<String>>;

    /// First match across every bucket
    async fn lookup_any(&self, url: &str) -> Result<Option<CachedResponse>> {
        for bucket in self.keys().await? {
            if let Some(hit) = self.lookup(&bucket, url).await? {
                return Ok(Some(hit));
            }
        }
        Ok(None)
    }
}

fn validate_bucket(bucket: &str) -> Result<()> {
    let valid = !bucket.is_empty()
        && bucket
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || ch == '.')
        && !bucket.starts_with('.');
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!("invalid cache bucket name '{bucket}'")))
    }
}

fn entry_stem(url: &str) -> String {
    format!("{:x}", Sha256::digest(url.as_bytes()))
}

/// Buckets as directories under a cache root
#[derive(Debug, Clone)]
pub struct FsCacheStorage {
    root: PathBuf,
}

impl FsCacheStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn bucket_dir(&self, bucket: &str) -> Result<PathBuf> {
        validate_bucket(bucket)?;
        Ok(self.root.join(bucket))
    }
}

#[async_trait]
impl CacheStorage for FsCacheStorage {
    async fn open(&self, bucket: &str) -> Result<()> {
        tokio::fs::create_dir_all(self.bucket_dir(bucket)?).await?;
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut dir = match tokio::fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut names = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    if validate_bucket(name).is_ok() {
                        names.push(name.to_string());
                    }
                }
            }
        }
        names.sort();
        Ok(names)
    }

    async fn delete(&self, bucket: &str) -> Result<bool> {
        match tokio::fs::remove_dir_all(self.bucket_dir(bucket)?).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, bucket: &str, response: &CachedResponse) -> Result<()> {
        let dir = self.bucket_dir(bucket)?;
        tokio::fs::create_dir_all(&dir).await?;
        let stem = entry_stem(&response.url);
        tokio::fs::write(dir.join(format!("{stem}.body")), &response.body).await?;
        let meta = serde_json::to_vec_pretty(response)?;
        // Sidecar last: an entry only counts once its metadata exists.
        tokio::fs::write(dir.join(format!("{stem}.json")), meta).await?;
        Ok(())
    }

    async fn lookup(&self, bucket: &str, url: &str) -> Result<Option<CachedResponse>> {
        let dir = self.bucket_dir(bucket)?;
        let stem = entry_stem(url);
        let meta = match tokio::fs::read(dir.join(format!("{stem}.json"))).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut response: CachedResponse = serde_json::from_slice(&meta)?;
        response.body = tokio::fs::read(dir.join(format!("{stem}.body"))).await?;
        Ok(Some(response))
    }

    async fn entries(&self, bucket: &str) -> Result<Vec<String>> {
        let dir = self.bucket_dir(bucket)?;
        let mut read = match tokio::fs::read_dir(&dir).await {
            Ok(read) => read,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut urls = Vec::new();
        while let Some(entry) = read.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                let meta = tokio::fs::read(&path).await?;
                let response: CachedResponse = serde_json::from_slice(&meta)?;
                urls.push(response.url);
            }
        }
        urls.sort();
        Ok(urls)
    }
}

type Buckets = BTreeMap<String, BTreeMap<String, CachedResponse>>;

/// In-process buckets for tests
#[derive(Debug, Default)]
pub struct MemoryCacheStorage {
    buckets: Mutex<Buckets>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<T>(&self, f: impl FnOnce(&mut Buckets) -> T) -> Result<T> {
        let mut buckets = self
            .buckets
            .lock()
            .map_err(|_| Error::Storage("cache storage mutex poisoned".to_string()))?;
        Ok(f(&mut buckets))
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn open(&self, bucket: &str) -> Result<()> {
        validate_bucket(bucket)?;
        self.with(|buckets| {
            buckets.entry(bucket.to_string()).or_default();
        })
    }

    async fn keys(&self) -> Result<Vec<String>> {
        self.with(|buckets| buckets.keys().cloned().collect())
    }

    async fn delete(&self, bucket: &str) -> Result<bool> {
        self.with(|buckets| buckets.remove(bucket).is_some())
    }

    async fn put(&self, bucket: &str, response: &CachedResponse) -> Result<()> {
        validate_bucket(bucket)?;
        self.with(|buckets| {
            buckets
                .entry(bucket.to_string())
                .or_default()
                .insert(response.url.clone(), response.clone());
        })
    }

    async fn lookup(&self, bucket: &str, url: &str) -> Result<Option<CachedResponse>> {
        self.with(|buckets| buckets.get(bucket).and_then(|entries| entries.get(url).cloned()))
    }

    async fn entries(&self, bucket: &str) -> Result<Vec<String>> {
        self.with(|buckets| {
            buckets
                .get(bucket)
                .map(|entries| entries.keys().cloned().collect())
                .unwrap_or_default()
        })
    }
}
