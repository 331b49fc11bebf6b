//! bytecraft client/project/task/collab command implementations

use chrono::NaiveDate;
use serde::Serialize;

use super::{ClientCommands, CollabCommands, Context, ProjectCommands, TaskCommands};
use crate::error::{Error, Result};
use crate::ledger::DeleteReport;
use crate::model::{
    parse_due_date, Client, Collaborator, EntityId, EntityKind, Priority, Project, Role, Task,
    WorkStatus,
};
use crate::output::{cli_group, emit_success, HumanOutput};
use crate::records::{
    ClientPatch, CollaboratorPatch, NewClient, NewCollaborator, NewProject, NewTask, ProjectPatch,
    TaskPatch,
};
use crate::view::{format_duration, parse_duration_ms};

/// `none` clears a nullable field
fn parse_nullable_id(raw: &str) -> Result<Option<EntityId>> {
    match raw.trim() {
        "none" | "null" | "" => Ok(None),
        value => value
            .parse()
            .map(Some)
            .map_err(|_| Error::InvalidArgument(format!("invalid id '{raw}'"))),
    }
}

fn parse_nullable_date(raw: &str) -> Result<Option<NaiveDate>> {
    match raw.trim() {
        "none" | "null" | "" => Ok(None),
        value => parse_due_date(value).map(Some),
    }
}

fn due_label(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn client_line(client: &Client) -> String {
    if client.contact.is_empty() {
        format!("{} {}", client.id, client.name)
    } else {
        format!("{} {} <{}>", client.id, client.name, client.contact)
    }
}

fn project_line(project: &Project) -> String {
    format!(
        "{} {} [{}] due {} client {}",
        project.id,
        project.name,
        project.status,
        due_label(project.duedate),
        project
            .client_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string())
    )
}

fn task_line(task: &Task) -> String {
    let assignee = task
        .assignee_id
        .map(|id| format!(" @{id}"))
        .unwrap_or_default();
    format!(
        "{} {} [{} / {}] due {}{} ({})",
        task.id,
        task.title,
        task.status,
        task.priority,
        due_label(task.duedate),
        assignee,
        format_duration(task.time_spent)
    )
}

fn collaborator_line(collaborator: &Collaborator) -> String {
    format!(
        "{} {} ({}) {}",
        collaborator.id, collaborator.name, collaborator.role, collaborator.email
    )
}

fn emit_record<T: Serialize>(
    ctx: &Context,
    command: &str,
    header: String,
    line: String,
    record: &T,
) -> Result<()> {
    let mut human = HumanOutput::new(header);
    human.push_detail(line);
    emit_success(ctx.output(), command, record, Some(&human))
}

fn emit_list<T: Serialize>(
    ctx: &Context,
    command: &str,
    label: &str,
    records: &[T],
    line: impl Fn(&T) -> String,
) -> Result<()> {
    let mut human = HumanOutput::new(format!("bytecraft {command}: {} {label}", records.len()));
    for record in records {
        human.push_detail(line(record));
    }
    emit_success(ctx.output(), command, &records, Some(&human))
}

fn run_rm(ctx: &Context, kind: EntityKind, id: EntityId) -> Result<()> {
    let mut store = ctx.open_store()?;
    let report: DeleteReport = store.soft_delete(kind, id)?;

    let group = cli_group(kind);
    let mut human = HumanOutput::new(format!(
        "bytecraft {group} rm: \"{}\" moved to the trash",
        report.item.entity.display_name()
    ));
    human.push_summary("id", id.to_string());
    for effect in &report.cascades {
        let ids: Vec<String> = effect.records.iter().map(|id| id.to_string()).collect();
        let verb = match effect.policy {
            crate::integrity::OnDelete::SetNull => "cleared on",
            crate::integrity::OnDelete::Retain => "still set on",
        };
        human.push_detail(format!(
            "{}.{} {verb} {}",
            effect.field.owner().tag(),
            effect.field.name(),
            ids.join(", ")
        ));
    }
    human.push_next_step(format!("bytecraft trash restore {id} --type {}", kind.tag()));

    emit_success(ctx.output(), &format!("{group} rm"), &report, Some(&human))
}

pub fn run_client(ctx: &Context, cmd: ClientCommands) -> Result<()> {
    match cmd {
        ClientCommands::Add { name, contact } => {
            let mut store = ctx.open_store()?;
            let client = store.create_client(NewClient { name, contact })?;
            emit_record(
                ctx,
                "client add",
                format!("bytecraft client add: {}", client.name),
                client_line(&client),
                &client,
            )
        }
        ClientCommands::Edit { id, name, contact } => {
            let mut store = ctx.open_store()?;
            let client = store.edit_client(id, ClientPatch { name, contact })?;
            emit_record(
                ctx,
                "client edit",
                format!("bytecraft client edit: {}", client.name),
                client_line(&client),
                &client,
            )
        }
        ClientCommands::Rm { id } => run_rm(ctx, EntityKind::Client, id),
        ClientCommands::Ls => {
            let store = ctx.open_store()?;
            emit_list(ctx, "client ls", "clients", &store.document().clients, client_line)
        }
    }
}

pub fn run_project(ctx: &Context, cmd: ProjectCommands) -> Result<()> {
    match cmd {
        ProjectCommands::Add {
            name,
            client,
            due,
            status,
        } => {
            let input = NewProject {
                name,
                client_id: client,
                duedate: due.as_deref().map(parse_due_date).transpose()?,
                status: status.parse::<WorkStatus>()?,
            };
            let mut store = ctx.open_store()?;
            let project = store.create_project(input)?;
            emit_record(
                ctx,
                "project add",
                format!("bytecraft project add: {}", project.name),
                project_line(&project),
                &project,
            )
        }
        ProjectCommands::Edit {
            id,
            name,
            client,
            due,
            status,
        } => {
            let patch = ProjectPatch {
                name,
                client_id: client.as_deref().map(parse_nullable_id).transpose()?,
                duedate: due.as_deref().map(parse_nullable_date).transpose()?,
                status: status.as_deref().map(str::parse).transpose()?,
            };
            let mut store = ctx.open_store()?;
            let project = store.edit_project(id, patch)?;
            emit_record(
                ctx,
                "project edit",
                format!("bytecraft project edit: {}", project.name),
                project_line(&project),
                &project,
            )
        }
        ProjectCommands::Rm { id } => run_rm(ctx, EntityKind::Project, id),
        ProjectCommands::Ls => {
            let store = ctx.open_store()?;
            emit_list(ctx, "project ls", "projects", &store.document().projects, project_line)
        }
    }
}

pub fn run_task(ctx: &Context, cmd: TaskCommands) -> Result<()> {
    match cmd {
        TaskCommands::Add {
            title,
            description,
            status,
            priority,
            due,
            assignee,
            client,
        } => {
            let input = NewTask {
                title,
                description,
                status: status.parse::<WorkStatus>()?,
                priority: priority.parse::<Priority>()?,
                duedate: due.as_deref().map(parse_due_date).transpose()?,
                assignee_id: assignee,
                client_id: client,
            };
            let mut store = ctx.open_store()?;
            let task = store.create_task(input)?;
            emit_record(
                ctx,
                "task add",
                format!("bytecraft task add: {}", task.title),
                task_line(&task),
                &task,
            )
        }
        TaskCommands::Edit {
            id,
            title,
            description,
            status,
            priority,
            due,
            assignee,
            client,
        } => {
            let patch = TaskPatch {
                title,
                description,
                status: status.as_deref().map(str::parse).transpose()?,
                priority: priority.as_deref().map(str::parse).transpose()?,
                duedate: due.as_deref().map(parse_nullable_date).transpose()?,
                assignee_id: assignee.as_deref().map(parse_nullable_id).transpose()?,
                client_id: client.as_deref().map(parse_nullable_id).transpose()?,
            };
            let mut store = ctx.open_store()?;
            let task = store.edit_task(id, patch)?;
            emit_record(
                ctx,
                "task edit",
                format!("bytecraft task edit: {}", task.title),
                task_line(&task),
                &task,
            )
        }
        TaskCommands::Rm { id } => run_rm(ctx, EntityKind::Task, id),
        TaskCommands::Ls { open, assignee } => {
            let store = ctx.open_store()?;
            let tasks: Vec<Task> = store
                .document()
                .tasks
                .iter()
                .filter(|t| !open || t.status.is_open())
                .filter(|t| assignee.is_none() || t.assignee_id == assignee)
                .cloned()
                .collect();
            emit_list(ctx, "task ls", "tasks", &tasks, task_line)
        }
        TaskCommands::Toggle { id } => {
            let mut store = ctx.open_store()?;
            let task = store.toggle_task_status(id)?;
            emit_record(
                ctx,
                "task toggle",
                format!("bytecraft task toggle: {} is now {}", task.title, task.status),
                task_line(&task),
                &task,
            )
        }
        TaskCommands::Time { id, duration } => {
            let millis = parse_duration_ms(&duration)?;
            let mut store = ctx.open_store()?;
            let task = store.log_time(id, millis)?;
            emit_record(
                ctx,
                "task time",
                format!(
                    "bytecraft task time: {} total {}",
                    task.title,
                    format_duration(task.time_spent)
                ),
                task_line(&task),
                &task,
            )
        }
    }
}

pub fn run_collab(ctx: &Context, cmd: CollabCommands) -> Result<()> {
    match cmd {
        CollabCommands::Add { name, email, role } => {
            let role = role.parse::<Role>()?;
            let mut store = ctx.open_store()?;
            let collaborator = store.create_collaborator(NewCollaborator { name, email, role })?;
            emit_record(
                ctx,
                "collab add",
                format!("bytecraft collab add: {}", collaborator.name),
                collaborator_line(&collaborator),
                &collaborator,
            )
        }
        CollabCommands::Edit {
            id,
            name,
            email,
            role,
        } => {
            let patch = CollaboratorPatch {
                name,
                email,
                role: role.as_deref().map(str::parse).transpose()?,
            };
            let mut store = ctx.open_store()?;
            let collaborator = store.edit_collaborator(id, patch)?;
            emit_record(
                ctx,
                "collab edit",
                format!("bytecraft collab edit: {}", collaborator.name),
                collaborator_line(&collaborator),
                &collaborator,
            )
        }
        CollabCommands::Rm { id } => run_rm(ctx, EntityKind::Collaborator, id),
        CollabCommands::Ls => {
            let store = ctx.open_store()?;
            emit_list(
                ctx,
                "collab ls",
                "collaborators",
                &store.document().collaborators,
                collaborator_line,
            )
        }
    }
}
