//! Create and edit operations for live records.

use chrono::NaiveDate;

use crate::error::{Error, Result};
use crate::gate::Mutation;
use crate::integrity::{check_reference, ReferenceField};
use crate::model::{
    Client, Collaborator, EntityId, EntityKind, Priority, Project, Role, Task, WorkStatus,
};
use crate::storage::KeyValueStorage;
use crate::store::Store;

#[derive(Debug, Clone, Default)]
pub struct NewClient {
    pub name: String,
    pub contact: String,
}

#[derive(Debug, Clone, Default)]
pub struct ClientPatch {
    pub name: Option<String>,
    pub contact: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NewProject {
    pub name: String,
    pub client_id: Option<EntityId>,
    pub duedate: Option<NaiveDate>,
    pub status: WorkStatus,
}

/// `Some(None)` clears a nullable field
#[derive(Debug, Clone, Default)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub client_id: Option<Option<EntityId>>,
    pub duedate: Option<Option<NaiveDate>>,
    pub status: Option<WorkStatus>,
}

#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub status: WorkStatus,
    pub priority: Priority,
    pub duedate: Option<NaiveDate>,
    pub assignee_id: Option<EntityId>,
    pub client_id: Option<EntityId>,
}

#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<WorkStatus>,
    pub priority: Option<Priority>,
    pub duedate: Option<Option<NaiveDate>>,
    pub assignee_id: Option<Option<EntityId>>,
    pub client_id: Option<Option<EntityId>>,
}

#[derive(Debug, Clone)]
pub struct NewCollaborator {
    pub name: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, Default)]
pub struct CollaboratorPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
}

fn required(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

fn not_found(kind: EntityKind, id: EntityId) -> Error {
    Error::NotFound { kind, id }
}

impl<S: KeyValueStorage> Store<S> {
    pub fn create_client(&mut self, input: NewClient) -> Result<Client> {
        let name = required("client name", &input.name)?;
        self.commit(Some(Mutation::Create(EntityKind::Client)), |draft| {
            let client = Client {
                id: draft.next_id(),
                name,
                contact: input.contact.trim().to_string(),
            };
            draft.doc.clients.push(client.clone());
            draft.notify("New Client", format!("New client \"{}\" added.", client.name));
            Ok(client)
        })
    }

    pub fn edit_client(&mut self, id: EntityId, patch: ClientPatch) -> Result<Client> {
        let name = patch.name.as_deref().map(|n| required("client name", n)).transpose()?;
        self.commit(Some(Mutation::Edit(EntityKind::Client)), |draft| {
            let client = draft
                .doc
                .clients
                .iter_mut()
                .find(|c| c.id == id)
                .ok_or_else(|| not_found(EntityKind::Client, id))?;
            if let Some(name) = name {
                client.name = name;
            }
            if let Some(contact) = patch.contact {
                client.contact = contact.trim().to_string();
            }
            let client = client.clone();
            draft.notify("Client Updated", format!("Client \"{}\" updated.", client.name));
            Ok(client)
        })
    }

    pub fn create_project(&mut self, input: NewProject) -> Result<Project> {
        let name = required("project name", &input.name)?;
        check_reference(self.document(), ReferenceField::ProjectClient, input.client_id)?;
        self.commit(Some(Mutation::Create(EntityKind::Project)), |draft| {
            let project = Project {
                id: draft.next_id(),
                name,
                client_id: input.client_id,
                duedate: input.duedate,
                status: input.status,
            };
            draft.doc.projects.push(project.clone());
            draft.notify("New Project", format!("New project \"{}\" added.", project.name));
            Ok(project)
        })
    }

    pub fn edit_project(&mut self, id: EntityId, patch: ProjectPatch) -> Result<Project> {
        let name = patch.name.as_deref().map(|n| required("project name", n)).transpose()?;
        if let Some(client_id) = patch.client_id {
            check_reference(self.document(), ReferenceField::ProjectClient, client_id)?;
        }
        self.commit(Some(Mutation::Edit(EntityKind::Project)), |draft| {
            let project = draft
                .doc
                .projects
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or_else(|| not_found(EntityKind::Project, id))?;
            if let Some(name) = name {
                project.name = name;
            }
            if let Some(client_id) = patch.client_id {
                project.client_id = client_id;
            }
            if let Some(duedate) = patch.duedate {
                project.duedate = duedate;
            }
            if let Some(status) = patch.status {
                project.status = status;
            }
            let project = project.clone();
            draft.notify("Project Updated", format!("Project \"{}\" updated.", project.name));
            Ok(project)
        })
    }

    pub fn create_task(&mut self, input: NewTask) -> Result<Task> {
        let title = required("task title", &input.title)?;
        check_reference(self.document(), ReferenceField::TaskAssignee, input.assignee_id)?;
        check_reference(self.document(), ReferenceField::TaskClient, input.client_id)?;
        self.commit(Some(Mutation::Create(EntityKind::Task)), |draft| {
            let task = Task {
                id: draft.next_id(),
                title,
                description: input.description.trim().to_string(),
                status: input.status,
                priority: input.priority,
                duedate: input.duedate,
                assignee_id: input.assignee_id,
                client_id: input.client_id,
                time_spent: 0,
            };
            draft.doc.tasks.push(task.clone());
            draft.notify(
                "New Task",
                format!("New task \"{}\" ({}) added.", task.title, task.priority),
            );
            Ok(task)
        })
    }

    pub fn edit_task(&mut self, id: EntityId, patch: TaskPatch) -> Result<Task> {
        let title = patch.title.as_deref().map(|t| required("task title", t)).transpose()?;
        if let Some(assignee_id) = patch.assignee_id {
            check_reference(self.document(), ReferenceField::TaskAssignee, assignee_id)?;
        }
        if let Some(client_id) = patch.client_id {
            check_reference(self.document(), ReferenceField::TaskClient, client_id)?;
        }
        self.commit(Some(Mutation::Edit(EntityKind::Task)), |draft| {
            let task = find_task(&mut draft.doc.tasks, id)?;
            if let Some(title) = title {
                task.title = title;
            }
            if let Some(description) = patch.description {
                task.description = description.trim().to_string();
            }
            if let Some(status) = patch.status {
                task.status = status;
            }
            if let Some(priority) = patch.priority {
                task.priority = priority;
            }
            if let Some(duedate) = patch.duedate {
                task.duedate = duedate;
            }
            if let Some(assignee_id) = patch.assignee_id {
                task.assignee_id = assignee_id;
            }
            if let Some(client_id) = patch.client_id {
                task.client_id = client_id;
            }
            let task = task.clone();
            draft.notify("Task Updated", format!("Task \"{}\" updated.", task.title));
            Ok(task)
        })
    }

    /// Flip a task between open and completed
    pub fn toggle_task_status(&mut self, id: EntityId) -> Result<Task> {
        self.commit(Some(Mutation::Edit(EntityKind::Task)), |draft| {
            let task = find_task(&mut draft.doc.tasks, id)?;
            task.status = task.status.toggled();
            let task = task.clone();
            draft.notify(
                "Task Updated",
                format!("Task \"{}\" status changed to {}.", task.title, task.status),
            );
            Ok(task)
        })
    }

    /// Add tracked time to a task
    pub fn log_time(&mut self, id: EntityId, millis: u64) -> Result<Task> {
        if millis == 0 {
            return Err(Error::Validation("logged time must be positive".to_string()));
        }
        self.commit(Some(Mutation::Edit(EntityKind::Task)), |draft| {
            let task = find_task(&mut draft.doc.tasks, id)?;
            task.time_spent = task.time_spent.saturating_add(millis);
            Ok(task.clone())
        })
    }

    pub fn create_collaborator(&mut self, input: NewCollaborator) -> Result<Collaborator> {
        let name = required("collaborator name", &input.name)?;
        self.commit(Some(Mutation::Create(EntityKind::Collaborator)), |draft| {
            let collaborator = Collaborator {
                id: draft.next_id(),
                name,
                email: input.email.trim().to_string(),
                role: input.role,
            };
            draft.doc.collaborators.push(collaborator.clone());
            draft.notify(
                "New Member",
                format!(
                    "New collaborator \"{}\" ({}) added.",
                    collaborator.name, collaborator.role
                ),
            );
            Ok(collaborator)
        })
    }

    pub fn edit_collaborator(
        &mut self,
        id: EntityId,
        patch: CollaboratorPatch,
    ) -> Result<Collaborator> {
        let name = patch
            .name
            .as_deref()
            .map(|n| required("collaborator name", n))
            .transpose()?;
        self.commit(Some(Mutation::Edit(EntityKind::Collaborator)), |draft| {
            let collaborator = draft
                .doc
                .collaborators
                .iter_mut()
                .find(|c| c.id == id)
                .ok_or_else(|| not_found(EntityKind::Collaborator, id))?;
            if let Some(name) = name {
                collaborator.name = name;
            }
            if let Some(email) = patch.email {
                collaborator.email = email.trim().to_string();
            }
            if let Some(role) = patch.role {
                collaborator.role = role;
            }
            let collaborator = collaborator.clone();
            draft.notify(
                "Member Updated",
                format!("Collaborator \"{}\" updated.", collaborator.name),
            );
            Ok(collaborator)
        })
    }
}

fn find_task(tasks: &mut [Task], id: EntityId) -> Result<&mut Task> {
    tasks
        .iter_mut()
        .find(|t| t.id == id)
        .ok_or_else(|| not_found(EntityKind::Task, id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::store::StoreOptions;

    fn store() -> Store<MemoryStorage> {
        Store::load(MemoryStorage::new(), StoreOptions::default()).unwrap()
    }

    #[test]
    fn created_ids_are_unique_and_increasing() {
        let mut store = store();
        let a = store
            .create_client(NewClient {
                name: "SoftStream".to_string(),
                contact: "hi@softstream.io".to_string(),
            })
            .unwrap();
        let b = store
            .create_client(NewClient {
                name: "Northwind".to_string(),
                ..NewClient::default()
            })
            .unwrap();
        assert!(b.id > a.id);
        assert_eq!(store.document().clients.len(), 4);
        assert_eq!(
            store.document().notifications[0].message,
            "New client \"Northwind\" added."
        );
    }

    #[test]
    fn blank_names_are_rejected_without_writing() {
        let mut store = store();
        let before = store.storage().get(store.key()).unwrap();
        let err = store
            .create_client(NewClient {
                name: "   ".to_string(),
                ..NewClient::default()
            })
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(store.storage().get(store.key()).unwrap(), before);
    }

    #[test]
    fn task_assignee_must_exist() {
        let mut store = store();
        let err = store
            .create_task(NewTask {
                title: "Ship".to_string(),
                assignee_id: Some(404),
                ..NewTask::default()
            })
            .unwrap_err();
        assert!(err.to_string().contains("assigneeId"));

        let task = store
            .create_task(NewTask {
                title: "Ship".to_string(),
                assignee_id: Some(2),
                priority: Priority::Urgent,
                ..NewTask::default()
            })
            .unwrap();
        assert_eq!(task.assignee_id, Some(2));
        assert_eq!(task.time_spent, 0);
    }

    #[test]
    fn edit_patches_only_given_fields() {
        let mut store = store();
        let task = store
            .edit_task(
                3,
                TaskPatch {
                    priority: Some(Priority::Low),
                    assignee_id: Some(None),
                    ..TaskPatch::default()
                },
            )
            .unwrap();
        assert_eq!(task.priority, Priority::Low);
        assert_eq!(task.assignee_id, None);
        assert_eq!(task.title, "Sprint planning meeting");
        assert_eq!(task.client_id, Some(2));
    }

    #[test]
    fn editing_a_missing_record_is_not_found() {
        let mut store = store();
        let err = store.edit_client(99, ClientPatch::default()).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn toggle_and_log_time() {
        let mut store = store();
        assert_eq!(store.toggle_task_status(1).unwrap().status, WorkStatus::Completed);
        assert_eq!(store.toggle_task_status(1).unwrap().status, WorkStatus::Pending);

        let task = store.log_time(2, 1_800_000).unwrap();
        assert_eq!(task.time_spent, 5_400_000);
        assert!(store.log_time(2, 0).is_err());
    }
}
