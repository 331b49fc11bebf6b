//! Read-models derived from a document snapshot.

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::document::Document;
use crate::error::{Error, Result};
use crate::model::{Client, DeletedItem, EntityId, EntityKind, Notification, Priority, Task, Timestamp};
use crate::notify;

/// Rows shown in each dashboard list
pub const DASHBOARD_LIST_LEN: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub pending_tasks: usize,
    pub total_tasks: usize,
    pub clients: usize,
    pub projects: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PriorityTask {
    pub id: EntityId,
    pub title: String,
    pub priority: Priority,
    pub duedate: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationRow {
    pub id: EntityId,
    pub message: String,
    pub read: bool,
    pub ago: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub stats: DashboardStats,
    pub priority_tasks: Vec<PriorityTask>,
    pub recent_clients: Vec<Client>,
    pub notifications: Vec<NotificationRow>,
    pub unread: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrashRow {
    pub id: EntityId,
    #[serde(rename = "type")]
    pub kind: EntityKind,
    pub name: String,
    pub deleted_at: Timestamp,
    pub deleted_ago: String,
}

pub fn stats(doc: &Document) -> DashboardStats {
    DashboardStats {
        pending_tasks: doc.tasks.iter().filter(|t| t.status.is_open()).count(),
        total_tasks: doc.tasks.len(),
        clients: doc.clients.len(),
        projects: doc.projects.len(),
    }
}

/// Open High/Urgent tasks, soonest due first; undated tasks last
pub fn priority_tasks(tasks: &[Task]) -> Vec<PriorityTask> {
    let mut open: Vec<&Task> = tasks
        .iter()
        .filter(|t| t.priority.is_elevated() && t.status.is_open())
        .collect();
    open.sort_by_key(|t| (t.duedate.is_none(), t.duedate));
    open.into_iter()
        .take(DASHBOARD_LIST_LEN)
        .map(|t| PriorityTask {
            id: t.id,
            title: t.title.clone(),
            priority: t.priority,
            duedate: t.duedate,
        })
        .collect()
}

/// Newest clients by id
pub fn recent_clients(clients: &[Client]) -> Vec<Client> {
    let mut sorted = clients.to_vec();
    sorted.sort_by(|a, b| b.id.cmp(&a.id));
    sorted.truncate(DASHBOARD_LIST_LEN);
    sorted
}

pub fn latest_notifications(log: &[Notification], now: Timestamp) -> Vec<NotificationRow> {
    log.iter()
        .take(DASHBOARD_LIST_LEN)
        .map(|n| NotificationRow {
            id: n.id,
            message: n.message.clone(),
            read: n.read,
            ago: time_ago(n.timestamp, now),
        })
        .collect()
}

pub fn dashboard(doc: &Document, now: Timestamp) -> Dashboard {
    Dashboard {
        stats: stats(doc),
        priority_tasks: priority_tasks(&doc.tasks),
        recent_clients: recent_clients(&doc.clients),
        notifications: latest_notifications(&doc.notifications, now),
        unread: notify::unread_count(&doc.notifications),
        badge: notify::unread_badge(&doc.notifications),
    }
}

pub fn trash_rows(items: &[DeletedItem], now: Timestamp) -> Vec<TrashRow> {
    items
        .iter()
        .map(|item| TrashRow {
            id: item.id(),
            kind: item.kind(),
            name: item.entity.display_name().to_string(),
            deleted_at: item.deleted_at,
            deleted_ago: time_ago(item.deleted_at, now),
        })
        .collect()
}

/// Coarse elapsed time: the largest unit that fits more than once
pub fn time_ago(timestamp: Timestamp, now: Timestamp) -> String {
    const UNITS: [(i64, &str); 5] = [
        (31_536_000, "years"),
        (2_592_000, "months"),
        (86_400, "days"),
        (3_600, "hours"),
        (60, "minutes"),
    ];

    let seconds = now.saturating_sub(timestamp).max(0) / 1000;
    for (size, unit) in UNITS {
        if seconds > size {
            return format!("{} {unit}", seconds / size);
        }
    }
    format!("{seconds} seconds")
}

/// `1h 30m`, `45m`, `0m`
pub fn format_duration(millis: u64) -> String {
    let minutes = millis / 60_000;
    let (hours, minutes) = (minutes / 60, minutes % 60);
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Parse tracked time such as `45m`, `2h`, `1h30m` or a bare minute
/// count into milliseconds
pub fn parse_duration_ms(raw: &str) -> Result<u64> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(Error::InvalidArgument("Duration cannot be empty".to_string()));
    }
    if s.chars().all(|c| c.is_ascii_digit()) {
        return minutes_ms(s, raw);
    }

    let mut total = Duration::zero();
    let mut rest = s;
    while !rest.is_empty() {
        let split = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        let (num_str, tail) = rest.split_at(split);
        let unit_len = tail.find(|c: char| c.is_ascii_digit()).unwrap_or(tail.len());
        let (unit, next) = tail.split_at(unit_len);

        let num: i64 = num_str.parse().map_err(|_| {
            Error::InvalidArgument(format!("Invalid duration '{raw}'"))
        })?;
        let part = match unit.to_lowercase().as_str() {
            "s" | "sec" => Duration::try_seconds(num),
            "m" | "min" => Duration::try_minutes(num),
            "h" | "hr" => Duration::try_hours(num),
            _ => {
                return Err(Error::InvalidArgument(format!(
                    "Invalid duration unit '{unit}'. Expected: s, m, h"
                )));
            }
        };
        total = part
            .and_then(|part| total.checked_add(&part))
            .ok_or_else(|| Error::InvalidArgument(format!("Duration '{raw}' is too large")))?;
        rest = next;
    }

    u64::try_from(total.num_milliseconds())
        .map_err(|_| Error::InvalidArgument(format!("Invalid duration '{raw}'")))
}

fn minutes_ms(digits: &str, raw: &str) -> Result<u64> {
    let minutes: u64 = digits
        .parse()
        .map_err(|_| Error::InvalidArgument(format!("Invalid duration '{raw}'")))?;
    Ok(minutes.saturating_mul(60_000))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Client, WorkStatus};

    #[test]
    fn factory_dashboard() {
        let doc = Document::factory_default(0);
        let board = dashboard(&doc, 0);
        assert_eq!(
            board.stats,
            DashboardStats {
                pending_tasks: 2,
                total_tasks: 3,
                clients: 2,
                projects: 2,
            }
        );
        // Task 3 is due before task 1; task 2 is completed.
        let ids: Vec<_> = board.priority_tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![3, 1]);
        assert_eq!(board.recent_clients[0].id, 2);
        assert_eq!(board.unread, 3);
        assert_eq!(board.badge.as_deref(), Some("3"));
    }

    #[test]
    fn priority_list_skips_completed_and_caps_at_five() {
        let mut doc = Document::factory_default(0);
        doc.tasks[0].status = WorkStatus::Completed;
        for i in 0..8 {
            let mut task = doc.tasks[2].clone();
            task.id = 100 + i;
            task.duedate = None;
            task.priority = Priority::Urgent;
            doc.tasks.push(task);
        }
        let rows = priority_tasks(&doc.tasks);
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].id, 3);
        assert!(rows[1..].iter().all(|row| row.duedate.is_none()));
    }

    #[test]
    fn recent_clients_are_newest_first() {
        let clients: Vec<Client> = (1..=7)
            .map(|id| Client {
                id,
                name: format!("c{id}"),
                contact: String::new(),
            })
            .collect();
        let ids: Vec<_> = recent_clients(&clients).iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![7, 6, 5, 4, 3]);
    }

    #[test]
    fn trash_rows_name_each_kind() {
        let mut doc = Document::factory_default(0);
        let task = doc.tasks.remove(0);
        doc.deleted_items.push(DeletedItem {
            entity: crate::model::Entity::Task(task),
            deleted_at: 0,
        });
        let rows = trash_rows(&doc.deleted_items, 90_000);
        assert_eq!(rows[0].name, "Review main server");
        assert_eq!(rows[0].kind, EntityKind::Task);
        assert_eq!(rows[0].deleted_ago, "1 minutes");
    }

    #[test]
    fn time_ago_picks_largest_unit() {
        assert_eq!(time_ago(0, 30_000), "30 seconds");
        assert_eq!(time_ago(0, 60_000), "60 seconds");
        assert_eq!(time_ago(0, 3 * 3_600_000), "3 hours");
        assert_eq!(time_ago(0, 3 * 86_400_000), "3 days");
        assert_eq!(time_ago(10, 0), "0 seconds");
    }

    #[test]
    fn time_ago_survives_extreme_timestamps() {
        assert!(time_ago(i64::MIN, 0).ends_with("years"));
        assert_eq!(time_ago(i64::MAX, i64::MIN), "0 seconds");
    }

    #[test]
    fn durations_print_hours_and_minutes() {
        assert_eq!(format_duration(0), "0m");
        assert_eq!(format_duration(45 * 60_000), "45m");
        assert_eq!(format_duration(5_400_000), "1h 30m");
    }

    #[test]
    fn durations_parse_units_and_bare_minutes() {
        assert_eq!(parse_duration_ms("45").unwrap(), 45 * 60_000);
        assert_eq!(parse_duration_ms("2h").unwrap(), 7_200_000);
        assert_eq!(parse_duration_ms("1h30m").unwrap(), 5_400_000);
        assert_eq!(parse_duration_ms("90s").unwrap(), 90_000);
        assert!(parse_duration_ms("").is_err());
        assert!(parse_duration_ms("3d").is_err());
        assert!(parse_duration_ms("h").is_err());
    }

    #[test]
    fn oversized_durations_are_rejected() {
        assert!(matches!(
            parse_duration_ms("3000000000000h"),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            parse_duration_ms("2000000000000h2000000000000h"),
            Err(Error::InvalidArgument(_))
        ));
        assert!(parse_duration_ms("99999999999999999999m").is_err());
    }
}
