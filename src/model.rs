//! Domain records held by the store.
//!
//! Field names follow the persisted JSON document (`clientId`, `assigneeId`,
//! `duedate`, `time_spent`) so backups written by earlier dashboard builds
//! load unchanged. Enumerations also accept the Spanish labels those
//! builds wrote.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;

/// Identifier of a record: its creation time in epoch milliseconds
pub type EntityId = i64;

/// Epoch milliseconds
pub type Timestamp = i64;

/// The four soft-deletable collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Client,
    Project,
    Task,
    Collaborator,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Client,
        EntityKind::Project,
        EntityKind::Task,
        EntityKind::Collaborator,
    ];

    /// Value of the `type` tag on ledger entries
    pub fn tag(self) -> &'static str {
        match self {
            EntityKind::Client => "client",
            EntityKind::Project => "project",
            EntityKind::Task => "task",
            EntityKind::Collaborator => "collaborator",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntityKind::Client => "Client",
            EntityKind::Project => "Project",
            EntityKind::Task => "Task",
            EntityKind::Collaborator => "Collaborator",
        };
        f.write_str(label)
    }
}

impl FromStr for EntityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "client" | "clients" => Ok(EntityKind::Client),
            "project" | "projects" => Ok(EntityKind::Project),
            "task" | "tasks" => Ok(EntityKind::Task),
            "collaborator" | "collaborators" | "collab" => Ok(EntityKind::Collaborator),
            other => Err(Error::InvalidArgument(format!(
                "unknown record type '{other}' (expected client|project|task|collaborator)"
            ))),
        }
    }
}

/// Progress of a project or task
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkStatus {
    #[default]
    #[serde(alias = "Pendiente")]
    Pending,
    #[serde(alias = "En Curso")]
    InProgress,
    #[serde(alias = "Completada")]
    Completed,
}

impl WorkStatus {
    pub fn is_open(self) -> bool {
        self != WorkStatus::Completed
    }

    /// Pending <-> Completed; an in-progress task completes
    pub fn toggled(self) -> Self {
        match self {
            WorkStatus::Completed => WorkStatus::Pending,
            WorkStatus::Pending | WorkStatus::InProgress => WorkStatus::Completed,
        }
    }
}

impl fmt::Display for WorkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WorkStatus::Pending => "Pending",
            WorkStatus::InProgress => "In Progress",
            WorkStatus::Completed => "Completed",
        };
        f.write_str(label)
    }
}

impl FromStr for WorkStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_label(s).as_str() {
            "pending" | "pendiente" | "todo" => Ok(WorkStatus::Pending),
            "inprogress" | "encurso" | "active" => Ok(WorkStatus::InProgress),
            "completed" | "completada" | "done" => Ok(WorkStatus::Completed),
            _ => Err(Error::InvalidArgument(format!(
                "invalid status '{s}' (expected pending|in-progress|completed)"
            ))),
        }
    }
}

/// Task urgency, ordered from least to most urgent
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Priority {
    #[serde(alias = "Baja")]
    Low,
    #[default]
    #[serde(alias = "Media")]
    Medium,
    #[serde(alias = "Alta")]
    High,
    #[serde(alias = "Urgente")]
    Urgent,
}

impl Priority {
    /// High and Urgent tasks surface on the dashboard
    pub fn is_elevated(self) -> bool {
        self >= Priority::High
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
            Priority::Urgent => "Urgent",
        };
        f.write_str(label)
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_label(s).as_str() {
            "low" | "baja" => Ok(Priority::Low),
            "medium" | "media" => Ok(Priority::Medium),
            "high" | "alta" => Ok(Priority::High),
            "urgent" | "urgente" => Ok(Priority::Urgent),
            _ => Err(Error::InvalidArgument(format!(
                "invalid priority '{s}' (expected low|medium|high|urgent)"
            ))),
        }
    }
}

/// Fixed set of collaborator roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "Administrator", alias = "Administrador")]
    Administrator,
    #[serde(rename = "Worker", alias = "Trabajador")]
    Worker,
    #[serde(rename = "Senior Developer", alias = "Desarrollador Senior")]
    SeniorDeveloper,
    #[serde(rename = "UI/UX Designer", alias = "Diseñador UI/UX")]
    UiUxDesigner,
    #[serde(rename = "Tester")]
    Tester,
    #[serde(rename = "Accountant", alias = "Contador")]
    Accountant,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Administrator,
        Role::Worker,
        Role::SeniorDeveloper,
        Role::UiUxDesigner,
        Role::Tester,
        Role::Accountant,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Role::Administrator => "Administrator",
            Role::Worker => "Worker",
            Role::SeniorDeveloper => "Senior Developer",
            Role::UiUxDesigner => "UI/UX Designer",
            Role::Tester => "Tester",
            Role::Accountant => "Accountant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_label(s).as_str() {
            "administrator" | "admin" | "administrador" => Ok(Role::Administrator),
            "worker" | "trabajador" => Ok(Role::Worker),
            "seniordeveloper" | "desarrolladorsenior" => Ok(Role::SeniorDeveloper),
            "uiuxdesigner" | "designer" | "diseñadoruiux" => Ok(Role::UiUxDesigner),
            "tester" => Ok(Role::Tester),
            "accountant" | "contador" => Ok(Role::Accountant),
            _ => {
                let expected: Vec<&str> = Role::ALL.iter().map(|role| role.label()).collect();
                Err(Error::InvalidArgument(format!(
                    "invalid role '{s}' (expected one of: {})",
                    expected.join(", ")
                )))
            }
        }
    }
}

/// Lowercase and drop separators so "In Progress", "in-progress" and
/// "in_progress" compare equal.
fn normalize_label(s: &str) -> String {
    s.trim()
        .chars()
        .filter(|ch| !matches!(ch, ' ' | '-' | '_' | '/'))
        .flat_map(char::to_lowercase)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub contact: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: EntityId,
    pub name: String,
    #[serde(rename = "clientId", default)]
    pub client_id: Option<EntityId>,
    #[serde(default, with = "due_date")]
    pub duedate: Option<NaiveDate>,
    #[serde(default)]
    pub status: WorkStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: EntityId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: WorkStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, with = "due_date")]
    pub duedate: Option<NaiveDate>,
    #[serde(rename = "assigneeId", default)]
    pub assignee_id: Option<EntityId>,
    #[serde(rename = "clientId", default)]
    pub client_id: Option<EntityId>,
    /// Accumulated tracked time in milliseconds
    #[serde(default)]
    pub time_spent: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collaborator {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: EntityId,
    pub message: String,
    #[serde(default)]
    pub read: bool,
    pub timestamp: Timestamp,
}

/// Any live record, tagged by kind when written to the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Entity {
    Client(Client),
    Project(Project),
    Task(Task),
    Collaborator(Collaborator),
}

impl Entity {
    pub fn id(&self) -> EntityId {
        match self {
            Entity::Client(client) => client.id,
            Entity::Project(project) => project.id,
            Entity::Task(task) => task.id,
            Entity::Collaborator(collaborator) => collaborator.id,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Client(_) => EntityKind::Client,
            Entity::Project(_) => EntityKind::Project,
            Entity::Task(_) => EntityKind::Task,
            Entity::Collaborator(_) => EntityKind::Collaborator,
        }
    }

    /// Name for clients, projects and collaborators; title for tasks
    pub fn display_name(&self) -> &str {
        match self {
            Entity::Client(client) => &client.name,
            Entity::Project(project) => &project.name,
            Entity::Task(task) => &task.title,
            Entity::Collaborator(collaborator) => &collaborator.name,
        }
    }
}

/// Ledger entry: the removed record plus its deletion stamp
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedItem {
    #[serde(flatten)]
    pub entity: Entity,
    pub deleted_at: Timestamp,
}

impl DeletedItem {
    pub fn id(&self) -> EntityId {
        self.entity.id()
    }

    pub fn kind(&self) -> EntityKind {
        self.entity.kind()
    }
}

/// Due dates are `YYYY-MM-DD`; an empty string (an unfilled form field)
/// reads as no date.
mod due_date {
    use super::*;

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S>(value: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(date) => serializer.serialize_str(&date.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => NaiveDate::parse_from_str(value, FORMAT)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

/// Parse a CLI due date (`YYYY-MM-DD`)
pub fn parse_due_date(raw: &str) -> crate::error::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|err| {
        Error::InvalidArgument(format!("invalid due date '{raw}' (expected YYYY-MM-DD): {err}"))
    })
}
