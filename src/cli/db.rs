//! bytecraft db command implementation
//!
//! Whole-document operations: backup export, import, factory reset, show.

use std::path::{Path, PathBuf};

use serde::Serialize;

use super::Context;
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput};
use crate::store::{date_of, now_ms, LoadOrigin};

#[derive(Serialize)]
struct ExportReport {
    path: PathBuf,
    clients: usize,
    projects: usize,
    tasks: usize,
    collaborators: usize,
    deleted_items: usize,
}

pub fn run_export(ctx: &Context, out: Option<PathBuf>) -> Result<()> {
    let dir = match out {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    std::fs::create_dir_all(&dir)?;

    let mut store = ctx.open_store()?;
    let path = store.export_to_dir(&dir, date_of(now_ms()))?;
    let doc = store.document();
    let report = ExportReport {
        path: path.clone(),
        clients: doc.clients.len(),
        projects: doc.projects.len(),
        tasks: doc.tasks.len(),
        collaborators: doc.collaborators.len(),
        deleted_items: doc.deleted_items.len(),
    };

    let mut human = HumanOutput::new(format!("bytecraft db export: {}", path.display()));
    human.push_summary("clients", report.clients.to_string());
    human.push_summary("projects", report.projects.to_string());
    human.push_summary("tasks", report.tasks.to_string());
    human.push_summary("collaborators", report.collaborators.to_string());
    human.push_summary("trash", report.deleted_items.to_string());
    human.push_next_step(format!("bytecraft db import {}", path.display()));

    emit_success(ctx.output(), "db export", &report, Some(&human))
}

pub fn run_import(ctx: &Context, file: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(file)?;
    let mut store = ctx.open_store()?;
    let report = store.import_str(&raw)?;

    let mut human = HumanOutput::new(format!("bytecraft db import: {}", file.display()));
    human.push_summary("clients", report.clients.to_string());
    human.push_summary("projects", report.projects.to_string());
    human.push_summary("tasks", report.tasks.to_string());
    human.push_summary("collaborators", report.collaborators.to_string());
    human.push_summary("trash", report.deleted_items.to_string());
    human.push_next_step("bytecraft dashboard");

    emit_success(ctx.output(), "db import", &report, Some(&human))
}

pub fn run_reset(ctx: &Context, yes: bool) -> Result<()> {
    if !yes {
        return Err(Error::InvalidArgument(
            "reset deletes every record; pass --yes to confirm".to_string(),
        ));
    }
    let mut store = ctx.open_store()?;
    store.reset()?;

    let mut human = HumanOutput::new("bytecraft db reset: stored document deleted");
    human.push_detail("factory data is seeded on the next run");
    emit_success(
        ctx.output(),
        "db reset",
        &serde_json::json!({ "key": store.key(), "reset": true }),
        Some(&human),
    )
}

#[derive(Serialize)]
struct ShowReport<'a> {
    key: &'a str,
    path: PathBuf,
    origin: LoadOrigin,
    document: &'a crate::document::Document,
}

pub fn run_show(ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let path = store.storage().key_path(store.key());
    let report = ShowReport {
        key: store.key(),
        path: path.clone(),
        origin: store.origin(),
        document: store.document(),
    };

    let mut human = HumanOutput::new(format!("bytecraft db: {}", path.display()));
    human.push_detail(serde_json::to_string_pretty(store.document())?);
    if store.origin() != LoadOrigin::Persisted {
        human.push_warning("no readable document was stored; factory data was seeded");
    }

    emit_success(ctx.output(), "db show", &report, Some(&human))
}
