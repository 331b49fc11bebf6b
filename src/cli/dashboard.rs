//! bytecraft dashboard and notify command implementations

use serde::Serialize;

use super::Context;
use crate::error::Result;
use crate::notify;
use crate::output::{emit_success, HumanOutput};
use crate::store::now_ms;
use crate::view::{self, NotificationRow};

pub fn run(ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let board = view::dashboard(store.document(), now_ms());

    let mut human = HumanOutput::new("bytecraft dashboard");
    human.push_summary("pending tasks", board.stats.pending_tasks.to_string());
    human.push_summary("total tasks", board.stats.total_tasks.to_string());
    human.push_summary("clients", board.stats.clients.to_string());
    human.push_summary("projects", board.stats.projects.to_string());
    if let Some(badge) = &board.badge {
        human.push_summary("unread notifications", badge.clone());
    }

    if board.priority_tasks.is_empty() {
        human.push_detail("no high-priority tasks");
    }
    for task in &board.priority_tasks {
        let due = task
            .duedate
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "no due date".to_string());
        human.push_detail(format!("[{}] {} (due {due})", task.priority, task.title));
    }
    for client in &board.recent_clients {
        human.push_detail(format!("client {} {}", client.id, client.name));
    }
    if !board.priority_tasks.is_empty() {
        human.push_next_step(format!("bytecraft task toggle {}", board.priority_tasks[0].id));
    }

    emit_success(ctx.output(), "dashboard", &board, Some(&human))
}

#[derive(Serialize)]
struct NotifyReport {
    unread: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    badge: Option<String>,
    notifications: Vec<NotificationRow>,
}

pub fn run_notify_ls(ctx: &Context, limit: usize) -> Result<()> {
    let store = ctx.open_store()?;
    let log = &store.document().notifications;
    let now = now_ms();

    let report = NotifyReport {
        unread: notify::unread_count(log),
        badge: notify::unread_badge(log),
        notifications: log
            .iter()
            .take(limit)
            .map(|n| NotificationRow {
                id: n.id,
                message: n.message.clone(),
                read: n.read,
                ago: view::time_ago(n.timestamp, now),
            })
            .collect(),
    };

    let mut human = HumanOutput::new(format!("bytecraft notify: {} unread", report.unread));
    for row in &report.notifications {
        let marker = if row.read { " " } else { "*" };
        human.push_detail(format!("{marker} {} ({} ago)", row.message, row.ago));
    }
    if report.unread > 0 {
        human.push_next_step("bytecraft notify read-all");
    }

    emit_success(ctx.output(), "notify ls", &report, Some(&human))
}

pub fn run_notify_read_all(ctx: &Context) -> Result<()> {
    let mut store = ctx.open_store()?;
    let changed = store.mark_all_notifications_read()?;

    let human = HumanOutput::new(format!("bytecraft notify read-all: {changed} marked read"));
    emit_success(
        ctx.output(),
        "notify read-all",
        &serde_json::json!({ "marked": changed }),
        Some(&human),
    )
}
