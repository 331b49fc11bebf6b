//! Reference integrity between collections.
//!
//! Each rule names a field that points at another collection and what
//! happens to that field when the referenced record is soft-deleted.
//! Deleting a collaborator unassigns its tasks; deleting a client leaves
//! tasks and projects pointing at it, so a later restore reconnects them.

use serde::Serialize;

use crate::document::Document;
use crate::error::{Error, Result};
use crate::model::{Entity, EntityId, EntityKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OnDelete {
    /// Clear the reference
    SetNull,
    /// Keep the (now dangling) reference
    Retain,
}

/// A field holding the id of a record in another collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReferenceField {
    #[serde(rename = "task.assigneeId")]
    TaskAssignee,
    #[serde(rename = "task.clientId")]
    TaskClient,
    #[serde(rename = "project.clientId")]
    ProjectClient,
}

impl ReferenceField {
    /// Collection the field points into
    pub fn target(self) -> EntityKind {
        match self {
            ReferenceField::TaskAssignee => EntityKind::Collaborator,
            ReferenceField::TaskClient | ReferenceField::ProjectClient => EntityKind::Client,
        }
    }

    /// Collection the field lives in
    pub fn owner(self) -> EntityKind {
        match self {
            ReferenceField::TaskAssignee | ReferenceField::TaskClient => EntityKind::Task,
            ReferenceField::ProjectClient => EntityKind::Project,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ReferenceField::TaskAssignee => "assigneeId",
            ReferenceField::TaskClient | ReferenceField::ProjectClient => "clientId",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceRule {
    pub field: ReferenceField,
    pub on_delete: OnDelete,
}

/// Rules applied on every soft delete
pub const REFERENCE_RULES: &[ReferenceRule] = &[
    ReferenceRule {
        field: ReferenceField::TaskAssignee,
        on_delete: OnDelete::SetNull,
    },
    ReferenceRule {
        field: ReferenceField::TaskClient,
        on_delete: OnDelete::Retain,
    },
    ReferenceRule {
        field: ReferenceField::ProjectClient,
        on_delete: OnDelete::Retain,
    },
];

/// What one rule did during a delete
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CascadeEffect {
    pub field: ReferenceField,
    pub policy: OnDelete,
    /// Records whose field pointed at the deleted record
    pub records: Vec<EntityId>,
}

/// Apply every rule targeting `kind` for the record `id`
///
/// Only rules with at least one referencing record produce an effect.
pub fn apply_on_delete(
    doc: &mut Document,
    kind: EntityKind,
    id: EntityId,
    rules: &[ReferenceRule],
) -> Vec<CascadeEffect> {
    let mut effects = Vec::new();
    for rule in rules.iter().filter(|rule| rule.field.target() == kind) {
        let records = apply_rule(doc, *rule, id);
        if !records.is_empty() {
            effects.push(CascadeEffect {
                field: rule.field,
                policy: rule.on_delete,
                records,
            });
        }
    }
    effects
}

fn apply_rule(doc: &mut Document, rule: ReferenceRule, id: EntityId) -> Vec<EntityId> {
    let mut touched = Vec::new();
    let clear = rule.on_delete == OnDelete::SetNull;

    let mut visit = |record_id: EntityId, slot: &mut Option<EntityId>| {
        if *slot == Some(id) {
            touched.push(record_id);
            if clear {
                *slot = None;
            }
        }
    };

    match rule.field {
        ReferenceField::TaskAssignee => {
            for task in &mut doc.tasks {
                visit(task.id, &mut task.assignee_id);
            }
        }
        ReferenceField::TaskClient => {
            for task in &mut doc.tasks {
                visit(task.id, &mut task.client_id);
            }
        }
        ReferenceField::ProjectClient => {
            for project in &mut doc.projects {
                visit(project.id, &mut project.client_id);
            }
        }
    }

    touched
}

/// Clear `SetNull` references on a record coming back from the trash
/// whose target is no longer live. Returns the cleared fields.
pub fn detach_dangling(
    doc: &Document,
    entity: &mut Entity,
    rules: &[ReferenceRule],
) -> Vec<ReferenceField> {
    let kind = entity.kind();
    let mut cleared = Vec::new();
    for rule in rules
        .iter()
        .filter(|rule| rule.on_delete == OnDelete::SetNull && rule.field.owner() == kind)
    {
        let slot = match (rule.field, &mut *entity) {
            (ReferenceField::TaskAssignee, Entity::Task(task)) => &mut task.assignee_id,
            (ReferenceField::TaskClient, Entity::Task(task)) => &mut task.client_id,
            (ReferenceField::ProjectClient, Entity::Project(project)) => &mut project.client_id,
            _ => continue,
        };
        if let Some(target) = *slot {
            if !doc.contains(rule.field.target(), target) {
                *slot = None;
                cleared.push(rule.field);
            }
        }
    }
    cleared
}

/// Reject a reference to a record that is not live
pub fn check_reference(
    doc: &Document,
    field: ReferenceField,
    value: Option<EntityId>,
) -> Result<()> {
    let Some(id) = value else {
        return Ok(());
    };
    if doc.contains(field.target(), id) {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "{}.{} refers to unknown {} {id}",
            field.owner().tag(),
            field.name(),
            field.target().tag()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collaborator_delete_nulls_assignees() {
        let mut doc = Document::factory_default(0);
        let effects = apply_on_delete(&mut doc, EntityKind::Collaborator, 1, REFERENCE_RULES);

        assert_eq!(
            effects,
            vec![CascadeEffect {
                field: ReferenceField::TaskAssignee,
                policy: OnDelete::SetNull,
                records: vec![1],
            }]
        );
        assert_eq!(doc.tasks[0].assignee_id, None);
        assert_eq!(doc.tasks[2].assignee_id, Some(2));
    }

    #[test]
    fn client_delete_retains_references() {
        let mut doc = Document::factory_default(0);
        let before = doc.clone();
        let effects = apply_on_delete(&mut doc, EntityKind::Client, 1, REFERENCE_RULES);

        assert_eq!(effects.len(), 2);
        assert!(effects.iter().all(|effect| effect.policy == OnDelete::Retain));
        assert_eq!(doc, before);
    }

    #[test]
    fn kinds_without_rules_are_untouched() {
        let mut doc = Document::factory_default(0);
        assert!(apply_on_delete(&mut doc, EntityKind::Task, 1, REFERENCE_RULES).is_empty());
        assert!(apply_on_delete(&mut doc, EntityKind::Project, 1, REFERENCE_RULES).is_empty());
    }

    #[test]
    fn dangling_assignee_is_cleared_on_the_way_back() {
        let mut doc = Document::factory_default(0);
        let mut task = Entity::Task(doc.tasks.remove(0));
        doc.collaborators.retain(|c| c.id != 1);

        let cleared = detach_dangling(&doc, &mut task, REFERENCE_RULES);
        assert_eq!(cleared, vec![ReferenceField::TaskAssignee]);
        match task {
            Entity::Task(task) => {
                assert_eq!(task.assignee_id, None);
                assert_eq!(task.client_id, Some(1));
            }
            other => panic!("unexpected entity: {other:?}"),
        }
    }

    #[test]
    fn unknown_assignee_is_rejected() {
        let doc = Document::factory_default(0);
        assert!(check_reference(&doc, ReferenceField::TaskAssignee, None).is_ok());
        assert!(check_reference(&doc, ReferenceField::TaskAssignee, Some(2)).is_ok());
        let err = check_reference(&doc, ReferenceField::TaskAssignee, Some(99)).unwrap_err();
        assert!(err.to_string().contains("task.assigneeId"));
    }
}
