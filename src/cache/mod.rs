//! Offline cache worker for the application shell.
//!
//! - [`manifest`]: the asset list and the versioned bucket name
//! - [`storage`]: named buckets of cached responses
//! - [`fetcher`]: where responses come from when the cache misses
//! - [`worker`]: install, activate and fetch routing

pub mod fetcher;
pub mod manifest;
pub mod storage;
pub mod worker;

use serde::{Deserialize, Serialize};

pub use fetcher::{DirFetcher, Fetcher, HttpFetcher};
pub use manifest::Manifest;
pub use storage::{CacheStorage, FsCacheStorage, MemoryCacheStorage};
pub use worker::{ActivateReport, CacheWorker, FetchOutcome, InstallReport};

/// How the request was initiated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestMode {
    /// Top-level page load
    Navigate,
    Subresource,
}

/// What the response will be used as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    Document,
    Script,
    Style,
    Image,
    Other,
}

impl Destination {
    /// Guess from the path's extension
    pub fn infer(url: &str) -> Self {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        if path.ends_with('/') {
            return Destination::Document;
        }
        match path.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()) {
            Some(ext) if ext == "html" || ext == "htm" => Destination::Document,
            Some(ext) if ext == "js" || ext == "mjs" => Destination::Script,
            Some(ext) if ext == "css" => Destination::Style,
            Some(ext) if matches!(ext.as_str(), "png" | "jpg" | "jpeg" | "gif" | "svg" | "ico" | "webp") => {
                Destination::Image
            }
            _ => Destination::Other,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Request {
    pub method: reqwest::Method,
    /// Absolute URL; also the cache key
    pub url: String,
    pub mode: RequestMode,
    pub destination: Destination,
}

impl Request {
    pub fn new(method: reqwest::Method, url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            method,
            destination: Destination::infer(&url),
            url,
            mode: RequestMode::Subresource,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(reqwest::Method::GET, url)
    }

    pub fn navigate(url: impl Into<String>) -> Self {
        Self {
            mode: RequestMode::Navigate,
            destination: Destination::Document,
            ..Self::get(url)
        }
    }

    /// Page loads fall back to the offline page when the network fails
    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate || self.destination == Destination::Document
    }
}

/// A stored (or freshly fetched) response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
    pub url: String,
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip)]
    pub body: Vec<u8>,
}

impl CachedResponse {
    pub fn ok(url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            url: url.into(),
            status: 200,
            content_type: None,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destination_follows_extension() {
        assert_eq!(Destination::infer("http://h/app/"), Destination::Document);
        assert_eq!(Destination::infer("http://h/login.html?x=1"), Destination::Document);
        assert_eq!(Destination::infer("http://h/dashboard.js"), Destination::Script);
        assert_eq!(Destination::infer("http://h/72x72.PNG"), Destination::Image);
        assert_eq!(Destination::infer("http://h/manifest.json"), Destination::Other);
    }

    #[test]
    fn document_requests_count_as_navigation() {
        assert!(Request::navigate("http://h/app").is_navigation());
        assert!(Request::get("http://h/dashboard.html").is_navigation());
        assert!(!Request::get("http://h/login.css").is_navigation());
    }
}
