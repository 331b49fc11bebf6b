//! bytecraft cache command implementation

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Serialize;

use super::{CacheCommands, Context};
use crate::cache::{
    CacheStorage, CacheWorker, CachedResponse, DirFetcher, Fetcher, FsCacheStorage, HttpFetcher,
    Request,
};
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput};

/// Network, or a local directory standing in for it
enum ShellFetcher {
    Http(HttpFetcher),
    Dir(DirFetcher),
}

#[async_trait]
impl Fetcher for ShellFetcher {
    async fn fetch(&self, request: &Request) -> Result<CachedResponse> {
        match self {
            ShellFetcher::Http(fetcher) => fetcher.fetch(request).await,
            ShellFetcher::Dir(fetcher) => fetcher.fetch(request).await,
        }
    }
}

fn worker(
    ctx: &Context,
    from_dir: Option<PathBuf>,
) -> Result<CacheWorker<FsCacheStorage, ShellFetcher>> {
    let manifest = ctx.config.cache.to_manifest()?;
    let origin = ctx.config.cache.origin_url()?;
    let fetcher = match from_dir.or_else(|| ctx.config.cache.source_dir.clone()) {
        Some(dir) => ShellFetcher::Dir(DirFetcher::new(dir, origin.clone())),
        None => ShellFetcher::Http(HttpFetcher::new()),
    };
    Ok(CacheWorker::new(
        manifest,
        origin,
        FsCacheStorage::new(ctx.cache_root()),
        fetcher,
    ))
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}

pub fn run(ctx: &Context, cmd: CacheCommands) -> Result<()> {
    let rt = runtime()?;
    match cmd {
        CacheCommands::Install { from_dir } => rt.block_on(run_install(ctx, from_dir)),
        CacheCommands::Activate => rt.block_on(run_activate(ctx)),
        CacheCommands::Fetch {
            url,
            method,
            navigate,
            from_dir,
            output,
        } => rt.block_on(run_fetch(ctx, url, method, navigate, from_dir, output)),
        CacheCommands::Status => rt.block_on(run_status(ctx)),
    }
}

async fn run_install(ctx: &Context, from_dir: Option<PathBuf>) -> Result<()> {
    let worker = worker(ctx, from_dir)?;
    let report = worker.install().await?;

    let mut human = HumanOutput::new(format!("bytecraft cache install: {}", report.bucket));
    human.push_summary("cached", report.cached.to_string());
    human.push_summary("version", report.version.clone());
    for warning in &report.warnings {
        human.push_warning(warning.clone());
    }
    if !report.is_complete() {
        human.push_warning("bucket left unpopulated; pages will come from the network");
    }
    human.push_next_step("bytecraft cache activate");

    emit_success(ctx.output(), "cache install", &report, Some(&human))
}

async fn run_activate(ctx: &Context) -> Result<()> {
    let worker = worker(ctx, None)?;
    let report = worker.activate().await?;

    let mut human = HumanOutput::new(format!("bytecraft cache activate: {}", report.bucket));
    human.push_summary("deleted", report.deleted.len().to_string());
    for name in &report.deleted {
        human.push_detail(format!("deleted {name}"));
    }

    emit_success(ctx.output(), "cache activate", &report, Some(&human))
}

#[derive(Serialize)]
struct FetchReport {
    url: String,
    source: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_type: Option<String>,
    bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    written_to: Option<PathBuf>,
}

async fn run_fetch(
    ctx: &Context,
    url: String,
    method: String,
    navigate: bool,
    from_dir: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<()> {
    let worker = worker(ctx, from_dir)?;
    let url = if url.contains("://") {
        url
    } else {
        worker.resolve(&url)?
    };
    let method = reqwest::Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .map_err(|_| Error::InvalidArgument(format!("invalid HTTP method '{method}'")))?;
    let mut request = Request::new(method, url.clone());
    if navigate {
        request = Request {
            method: request.method,
            ..Request::navigate(url.clone())
        };
    }

    let outcome = worker.handle_fetch(&request).await?;
    let response = outcome.response();
    let written_to = match (response, output) {
        (Some(response), Some(path)) => {
            tokio::fs::write(&path, &response.body).await?;
            Some(path)
        }
        _ => None,
    };
    let report = FetchReport {
        url,
        source: outcome.source(),
        status: response.map(|r| r.status),
        content_type: response.and_then(|r| r.content_type.clone()),
        bytes: response.map(|r| r.body.len()).unwrap_or(0),
        written_to,
    };

    let mut human = HumanOutput::new(format!("bytecraft cache fetch: {}", report.url));
    human.push_summary("source", report.source);
    if let Some(status) = report.status {
        human.push_summary("status", status.to_string());
    }
    human.push_summary("bytes", report.bytes.to_string());
    if report.source == "passthrough" {
        human.push_detail("not a GET request; left to the network untouched");
    }

    emit_success(ctx.output(), "cache fetch", &report, Some(&human))
}

#[derive(Serialize)]
struct BucketStatus {
    name: String,
    current: bool,
    entries: usize,
}

#[derive(Serialize)]
struct StatusReport {
    current: String,
    version: String,
    assets: usize,
    buckets: Vec<BucketStatus>,
}

async fn run_status(ctx: &Context) -> Result<()> {
    let worker = worker(ctx, None)?;
    let current = worker.bucket();
    let mut buckets = Vec::new();
    for name in worker.cache().keys().await? {
        let entries = worker.cache().entries(&name).await?.len();
        buckets.push(BucketStatus {
            current: name == current,
            name,
            entries,
        });
    }
    let report = StatusReport {
        current: current.clone(),
        version: worker.manifest().version(),
        assets: worker.manifest().assets().len(),
        buckets,
    };

    let mut human = HumanOutput::new(format!("bytecraft cache: {current}"));
    human.push_summary("manifest assets", report.assets.to_string());
    for bucket in &report.buckets {
        let marker = if bucket.current { " (current)" } else { "" };
        human.push_detail(format!("{}{marker}: {} entries", bucket.name, bucket.entries));
    }
    if !report.buckets.iter().any(|b| b.current) {
        human.push_next_step("bytecraft cache install");
    } else if report.buckets.len() > 1 {
        human.push_next_step("bytecraft cache activate");
    }

    emit_success(ctx.output(), "cache status", &report, Some(&human))
}
