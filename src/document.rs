//! The persisted document and its import/export shapes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    Client, Collaborator, DeletedItem, EntityId, EntityKind, Notification, Priority, Project,
    Role, Task, Timestamp, WorkStatus,
};

/// Collections an import must carry
pub const REQUIRED_COLLECTIONS: [&str; 3] = ["clients", "projects", "tasks"];

const HOUR_MS: i64 = 3_600_000;

/// Every collection of the dashboard in one JSON document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub clients: Vec<Client>,
    pub projects: Vec<Project>,
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub collaborators: Vec<Collaborator>,
    /// Newest first
    #[serde(default)]
    pub notifications: Vec<Notification>,
    /// Newest deletion first
    #[serde(default)]
    pub deleted_items: Vec<DeletedItem>,
}

impl Document {
    /// Factory state: two clients, two projects, three tasks, two
    /// collaborators and three notifications stamped relative to `now`.
    pub fn factory_default(now: Timestamp) -> Self {
        Self {
            clients: vec![
                Client {
                    id: 1,
                    name: "Innovatech Solutions".to_string(),
                    contact: "contact@innovatech.com".to_string(),
                },
                Client {
                    id: 2,
                    name: "Global Marketing Corp".to_string(),
                    contact: "info@globalmkt.net".to_string(),
                },
            ],
            projects: vec![
                Project {
                    id: 1,
                    name: "E-commerce Platform V2".to_string(),
                    client_id: Some(1),
                    duedate: NaiveDate::from_ymd_opt(2026, 3, 1),
                    status: WorkStatus::InProgress,
                },
                Project {
                    id: 2,
                    name: "Q4 Launch Campaign".to_string(),
                    client_id: Some(2),
                    duedate: NaiveDate::from_ymd_opt(2025, 12, 15),
                    status: WorkStatus::Pending,
                },
            ],
            tasks: vec![
                Task {
                    id: 1,
                    title: "Review main server".to_string(),
                    description: "Monthly review of logs and performance.".to_string(),
                    status: WorkStatus::Pending,
                    priority: Priority::High,
                    duedate: NaiveDate::from_ymd_opt(2025, 12, 1),
                    assignee_id: Some(1),
                    client_id: Some(1),
                    time_spent: 0,
                },
                Task {
                    id: 2,
                    title: "Update app icons".to_string(),
                    description: "Swap the icon set for the new branding.".to_string(),
                    status: WorkStatus::Completed,
                    priority: Priority::Medium,
                    duedate: NaiveDate::from_ymd_opt(2025, 11, 20),
                    assignee_id: None,
                    client_id: None,
                    time_spent: 3_600_000,
                },
                Task {
                    id: 3,
                    title: "Sprint planning meeting".to_string(),
                    description: "Prepare the agenda and documents.".to_string(),
                    status: WorkStatus::InProgress,
                    priority: Priority::High,
                    duedate: NaiveDate::from_ymd_opt(2025, 11, 28),
                    assignee_id: Some(2),
                    client_id: Some(2),
                    time_spent: 7_200_000,
                },
            ],
            collaborators: vec![
                Collaborator {
                    id: 1,
                    name: "Ana Fernández".to_string(),
                    email: "ana@bytecraft.com".to_string(),
                    role: Role::SeniorDeveloper,
                },
                Collaborator {
                    id: 2,
                    name: "Carlos Ruiz".to_string(),
                    email: "carlos@bytecraft.com".to_string(),
                    role: Role::UiUxDesigner,
                },
            ],
            notifications: vec![
                Notification {
                    id: 1,
                    message: "Task \"Review main server\" is due soon.".to_string(),
                    read: false,
                    timestamp: now - HOUR_MS,
                },
                Notification {
                    id: 2,
                    message: "New client \"SoftStream\" added.".to_string(),
                    read: false,
                    timestamp: now - 2 * HOUR_MS,
                },
                Notification {
                    id: 3,
                    message: "Project E-commerce Platform V2 moved to \"In Progress\".".to_string(),
                    read: false,
                    timestamp: now - 3 * HOUR_MS,
                },
            ],
            deleted_items: Vec::new(),
        }
    }

    /// Largest id in any collection, ledger included
    pub fn max_id(&self) -> EntityId {
        let live = self
            .clients
            .iter()
            .map(|c| c.id)
            .chain(self.projects.iter().map(|p| p.id))
            .chain(self.tasks.iter().map(|t| t.id))
            .chain(self.collaborators.iter().map(|c| c.id))
            .chain(self.notifications.iter().map(|n| n.id));
        live.chain(self.deleted_items.iter().map(DeletedItem::id))
            .max()
            .unwrap_or(0)
    }

    /// Ids currently live in the collection for `kind`
    pub fn live_ids(&self, kind: EntityKind) -> Vec<EntityId> {
        match kind {
            EntityKind::Client => self.clients.iter().map(|c| c.id).collect(),
            EntityKind::Project => self.projects.iter().map(|p| p.id).collect(),
            EntityKind::Task => self.tasks.iter().map(|t| t.id).collect(),
            EntityKind::Collaborator => self.collaborators.iter().map(|c| c.id).collect(),
        }
    }

    pub fn contains(&self, kind: EntityKind, id: EntityId) -> bool {
        match kind {
            EntityKind::Client => self.clients.iter().any(|c| c.id == id),
            EntityKind::Project => self.projects.iter().any(|p| p.id == id),
            EntityKind::Task => self.tasks.iter().any(|t| t.id == id),
            EntityKind::Collaborator => self.collaborators.iter().any(|c| c.id == id),
        }
    }

    pub fn deleted_item(&self, id: EntityId) -> Option<&DeletedItem> {
        self.deleted_items.iter().find(|item| item.id() == id)
    }

    /// Backup shape written by export
    pub fn to_export(&self) -> ExportDocument<'_> {
        ExportDocument {
            clients: &self.clients,
            projects: &self.projects,
            tasks: &self.tasks,
            collaborators: &self.collaborators,
            deleted_items: &self.deleted_items,
        }
    }
}

/// Backup file contents: the document minus notifications
#[derive(Debug, Serialize)]
pub struct ExportDocument<'a> {
    pub clients: &'a [Client],
    pub projects: &'a [Project],
    pub tasks: &'a [Task],
    pub collaborators: &'a [Collaborator],
    pub deleted_items: &'a [DeletedItem],
}

/// Collections read from an import file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImportDocument {
    pub clients: Vec<Client>,
    pub projects: Vec<Project>,
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub collaborators: Vec<Collaborator>,
    #[serde(default)]
    pub deleted_items: Vec<DeletedItem>,
}

impl ImportDocument {
    /// Parse and structurally validate an import file
    ///
    /// The three core collections must be present and array-valued before
    /// any record is decoded; every failure is a [`Error::Validation`].
    pub fn parse(raw: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(raw)
            .map_err(|err| Error::Validation(format!("file is not valid JSON: {err}")))?;
        Self::from_value(value)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| Error::Validation("expected a JSON object".to_string()))?;

        let missing: Vec<&str> = REQUIRED_COLLECTIONS
            .iter()
            .copied()
            .filter(|key| !object.get(*key).is_some_and(serde_json::Value::is_array))
            .collect();
        if !missing.is_empty() {
            return Err(Error::Validation(format!(
                "missing required collections: {}",
                missing.join(", ")
            )));
        }

        serde_json::from_value(value)
            .map_err(|err| Error::Validation(format!("unreadable record: {err}")))
    }
}
