//! Network access for the cache worker.

use std::io;
use std::path::PathBuf;

use async_trait::async_trait;
use reqwest::Url;

use super::{CachedResponse, Request};
use crate::error::{Error, Result};

/// Performs a request against the network
///
/// `Err` means the request could not complete at all; an HTTP error status
/// is still an `Ok` response.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<CachedResponse>;
}

/// Fetches over HTTP(S)
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &Request) -> Result<CachedResponse> {
        let network = |err: reqwest::Error| Error::Network {
            url: request.url.clone(),
            reason: err.to_string(),
        };

        let response = self
            .client
            .request(request.method.clone(), &request.url)
            .send()
            .await
            .map_err(network)?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(network)?;

        Ok(CachedResponse {
            url: request.url.clone(),
            status,
            content_type,
            body: body.to_vec(),
        })
    }
}

/// Serves files from a local directory as if it were the origin
///
/// A missing file is a 404; a URL outside the origin cannot be reached.
#[derive(Debug, Clone)]
pub struct DirFetcher {
    root: PathBuf,
    origin: Url,
}

impl DirFetcher {
    pub fn new(root: impl Into<PathBuf>, origin: Url) -> Self {
        Self {
            root: root.into(),
            origin,
        }
    }

    fn local_path(&self, url: &str) -> Result<PathBuf> {
        let unreachable = |reason: &str| Error::Network {
            url: url.to_string(),
            reason: reason.to_string(),
        };

        let base = self.origin.as_str();
        let relative = url
            .strip_prefix(base)
            .ok_or_else(|| unreachable("outside of the served origin"))?;
        let relative = relative.split(['?', '#']).next().unwrap_or_default();

        let mut path = self.root.clone();
        for segment in relative.split('/').filter(|s| !s.is_empty() && *s != ".") {
            if segment == ".." {
                return Err(unreachable("path escapes the served directory"));
            }
            path.push(segment);
        }
        if relative.is_empty() || relative.ends_with('/') {
            path.push("index.html");
        }
        Ok(path)
    }
}

fn content_type_for(path: &std::path::Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" => "application/json",
        "png" => "image/png",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        _ => return None,
    };
    Some(mime)
}

#[async_trait]
impl Fetcher for DirFetcher {
    async fn fetch(&self, request: &Request) -> Result<CachedResponse> {
        let path = self.local_path(&request.url)?;
        match tokio::fs::read(&path).await {
            Ok(body) => Ok(CachedResponse {
                url: request.url.clone(),
                status: 200,
                content_type: content_type_for(&path).map(str::to_string),
                body,
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(CachedResponse {
                url: request.url.clone(),
                status: 404,
                content_type: None,
                body: Vec::new(),
            }),
            Err(e) => Err(Error::Network {
                url: request.url.clone(),
                reason: e.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::manifest::parse_origin;
    use tempfile::TempDir;

    #[tokio::test]
    async fn dir_fetcher_serves_files_under_origin() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("index.html"), "<h1>home</h1>").unwrap();
        std::fs::write(temp.path().join("login.css"), "body{}").unwrap();
        let origin = parse_origin("http://localhost:8080/app").unwrap();
        let fetcher = DirFetcher::new(temp.path(), origin);

        let root = fetcher.fetch(&Request::get("http://localhost:8080/app/")).await.unwrap();
        assert_eq!(root.body, b"<h1>home</h1>");
        assert_eq!(root.content_type.as_deref(), Some("text/html; charset=utf-8"));

        let css = fetcher
            .fetch(&Request::get("http://localhost:8080/app/login.css?v=2"))
            .await
            .unwrap();
        assert_eq!(css.body, b"body{}");

        let missing = fetcher
            .fetch(&Request::get("http://localhost:8080/app/nope.js"))
            .await
            .unwrap();
        assert_eq!(missing.status, 404);
        assert!(!missing.is_success());
    }

    #[tokio::test]
    async fn dir_fetcher_refuses_foreign_urls() {
        let temp = TempDir::new().unwrap();
        let origin = parse_origin("http://localhost:8080/app").unwrap();
        let fetcher = DirFetcher::new(temp.path(), origin);

        let err = fetcher
            .fetch(&Request::get("http://elsewhere/app/x"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Network { .. }));
        assert!(fetcher
            .fetch(&Request::get("http://localhost:8080/app/../secret"))
            .await
            .is_err());
    }
}
