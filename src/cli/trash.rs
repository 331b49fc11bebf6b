//! bytecraft trash command implementation

use super::Context;
use crate::error::Result;
use crate::model::{EntityId, EntityKind};
use crate::output::{cli_group, emit_success, HumanOutput};
use crate::store::now_ms;
use crate::view;

fn parse_kind(raw: Option<&str>) -> Result<Option<EntityKind>> {
    raw.map(str::parse).transpose()
}

pub fn run_ls(ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let rows = view::trash_rows(&store.document().deleted_items, now_ms());

    let header = if rows.is_empty() {
        "bytecraft trash: empty".to_string()
    } else {
        format!("bytecraft trash: {} item(s)", rows.len())
    };
    let mut human = HumanOutput::new(header);
    for row in &rows {
        human.push_detail(format!(
            "{} {} \"{}\" deleted {} ago",
            row.id,
            row.kind.tag(),
            row.name,
            row.deleted_ago
        ));
    }
    if let Some(first) = rows.first() {
        let shared = rows.iter().filter(|row| row.id == first.id).count() > 1;
        if shared {
            human.push_next_step(format!(
                "bytecraft trash restore {} --type {}",
                first.id,
                first.kind.tag()
            ));
        } else {
            human.push_next_step(format!("bytecraft trash restore {}", first.id));
        }
    }

    emit_success(ctx.output(), "trash ls", &rows, Some(&human))
}

pub fn run_restore(ctx: &Context, id: EntityId, kind: Option<&str>) -> Result<()> {
    let kind = parse_kind(kind)?;
    let mut store = ctx.open_store()?;
    let report = store.restore(id, kind)?;

    let kind = report.entity.kind();
    let mut human = HumanOutput::new(format!(
        "bytecraft trash restore: {} \"{}\"",
        kind.tag(),
        report.entity.display_name()
    ));
    human.push_summary("id", id.to_string());
    for field in &report.detached {
        human.push_warning(format!(
            "{}.{} cleared; its target no longer exists",
            field.owner().tag(),
            field.name()
        ));
    }
    human.push_next_step(format!("bytecraft {} ls", cli_group(kind)));

    emit_success(ctx.output(), "trash restore", &report, Some(&human))
}

pub fn run_purge(ctx: &Context, id: EntityId, kind: Option<&str>) -> Result<()> {
    let kind = parse_kind(kind)?;
    let mut store = ctx.open_store()?;
    let item = store.purge(id, kind)?;

    let mut human = HumanOutput::new(format!(
        "bytecraft trash purge: {} \"{}\" deleted permanently",
        item.kind().tag(),
        item.entity.display_name()
    ));
    human.push_summary("id", id.to_string());

    emit_success(ctx.output(), "trash purge", &item, Some(&human))
}
