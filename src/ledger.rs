//! Soft-delete ledger: trash, restore, purge.
//!
//! A deleted record leaves its live collection and is prepended to
//! `deleted_items`, stamped and tagged with its kind. An id is in at most
//! one of the two places at any time.

use serde::Serialize;

use crate::document::Document;
use crate::error::{Error, Result};
use crate::gate::Mutation;
use crate::integrity::{self, CascadeEffect, ReferenceField, REFERENCE_RULES};
use crate::model::{DeletedItem, Entity, EntityId, EntityKind};
use crate::storage::KeyValueStorage;
use crate::store::Store;

#[derive(Debug, Clone, Serialize)]
pub struct DeleteReport {
    pub item: DeletedItem,
    pub cascades: Vec<CascadeEffect>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RestoreReport {
    pub entity: Entity,
    /// References cleared because their target is gone
    pub detached: Vec<ReferenceField>,
}

/// Take a record out of its live collection
fn take_live(doc: &mut Document, kind: EntityKind, id: EntityId) -> Option<Entity> {
    fn take<T>(items: &mut Vec<T>, matches: impl Fn(&T) -> bool) -> Option<T> {
        let index = items.iter().position(matches)?;
        Some(items.remove(index))
    }

    match kind {
        EntityKind::Client => take(&mut doc.clients, |c| c.id == id).map(Entity::Client),
        EntityKind::Project => take(&mut doc.projects, |p| p.id == id).map(Entity::Project),
        EntityKind::Task => take(&mut doc.tasks, |t| t.id == id).map(Entity::Task),
        EntityKind::Collaborator => {
            take(&mut doc.collaborators, |c| c.id == id).map(Entity::Collaborator)
        }
    }
}

/// Append a record to the end of its live collection
fn put_live(doc: &mut Document, entity: Entity) {
    match entity {
        Entity::Client(client) => doc.clients.push(client),
        Entity::Project(project) => doc.projects.push(project),
        Entity::Task(task) => doc.tasks.push(task),
        Entity::Collaborator(collaborator) => doc.collaborators.push(collaborator),
    }
}

/// Take a record out of the trash, optionally narrowed to one kind
///
/// Ids are only unique per kind, so an unnarrowed id that matches more
/// than one trashed record is rejected.
fn take_deleted(doc: &mut Document, id: EntityId, kind: Option<EntityKind>) -> Result<DeletedItem> {
    let matches: Vec<usize> = doc
        .deleted_items
        .iter()
        .enumerate()
        .filter(|(_, item)| item.id() == id && kind.map_or(true, |kind| item.kind() == kind))
        .map(|(index, _)| index)
        .collect();

    match matches.as_slice() {
        [] => Err(Error::DeletedItemNotFound(id)),
        [index] => Ok(doc.deleted_items.remove(*index)),
        _ => {
            let kinds: Vec<&str> = matches
                .iter()
                .map(|&index| doc.deleted_items[index].kind().tag())
                .collect();
            Err(Error::Validation(format!(
                "trash holds several items with id {id} ({}); pass --type",
                kinds.join(", ")
            )))
        }
    }
}

impl<S: KeyValueStorage> Store<S> {
    /// Move a live record to the trash and apply reference rules
    pub fn soft_delete(&mut self, kind: EntityKind, id: EntityId) -> Result<DeleteReport> {
        let report = self.commit(Some(Mutation::Delete(kind)), |draft| {
            let entity =
                take_live(&mut draft.doc, kind, id).ok_or(Error::NotFound { kind, id })?;
            let cascades = integrity::apply_on_delete(&mut draft.doc, kind, id, REFERENCE_RULES);
            let item = DeletedItem {
                entity,
                deleted_at: draft.now,
            };
            draft.doc.deleted_items.insert(0, item.clone());
            draft.notify(
                "Deleted",
                format!("{kind} \"{}\" moved to the trash.", item.entity.display_name()),
            );
            Ok(DeleteReport { item, cascades })
        })?;

        tracing::debug!(kind = kind.tag(), id, cascades = report.cascades.len(), "soft delete");
        Ok(report)
    }

    /// Move a trashed record back to the end of its collection
    ///
    /// Unassignments done when its targets were deleted are not undone.
    pub fn restore(&mut self, id: EntityId, kind: Option<EntityKind>) -> Result<RestoreReport> {
        self.commit(Some(Mutation::Restore), |draft| {
            let DeletedItem { mut entity, .. } = take_deleted(&mut draft.doc, id, kind)?;
            let detached = integrity::detach_dangling(&draft.doc, &mut entity, REFERENCE_RULES);
            put_live(&mut draft.doc, entity.clone());
            draft.notify(
                "Restored",
                format!("Item restored: {}.", entity.display_name()),
            );
            Ok(RestoreReport { entity, detached })
        })
    }

    /// Drop a trashed record for good
    pub fn purge(&mut self, id: EntityId, kind: Option<EntityKind>) -> Result<DeletedItem> {
        self.commit(Some(Mutation::Purge), |draft| {
            let item = take_deleted(&mut draft.doc, id, kind)?;
            draft.notify("Permanent", format!("Permanently deleted item ID: {id}."));
            Ok(item)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::store::StoreOptions;

    fn store() -> Store<MemoryStorage> {
        Store::load(MemoryStorage::new(), StoreOptions::default()).unwrap()
    }

    fn in_trash(store: &Store<MemoryStorage>, id: EntityId) -> bool {
        store.document().deleted_item(id).is_some()
    }

    #[test]
    fn delete_moves_record_to_front_of_ledger() {
        let mut store = store();
        store.soft_delete(EntityKind::Task, 2).unwrap();
        let report = store.soft_delete(EntityKind::Client, 2).unwrap();

        assert_eq!(report.item.kind(), EntityKind::Client);
        assert!(!store.document().contains(EntityKind::Client, 2));
        assert_eq!(store.document().deleted_items[0].id(), 2);
        assert_eq!(store.document().deleted_items[0].kind(), EntityKind::Client);
        assert_eq!(store.document().deleted_items[1].kind(), EntityKind::Task);
        assert!(store.document().notifications[0].message.contains("moved to the trash"));
    }

    #[test]
    fn deleting_a_missing_record_changes_nothing() {
        let mut store = store();
        let before = store.snapshot();
        let err = store.soft_delete(EntityKind::Project, 77).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.document(), &before);
    }

    #[test]
    fn restore_returns_the_record_verbatim() {
        let mut store = store();
        let original = store.document().projects[0].clone();
        store.soft_delete(EntityKind::Project, original.id).unwrap();
        let report = store.restore(original.id, None).unwrap();

        assert!(report.detached.is_empty());
        assert_eq!(report.entity, Entity::Project(original.clone()));
        assert_eq!(store.document().projects.last(), Some(&original));
        assert!(!in_trash(&store, original.id));
    }

    #[test]
    fn restored_collaborator_does_not_reclaim_tasks() {
        let mut store = store();
        let report = store.soft_delete(EntityKind::Collaborator, 1).unwrap();
        assert_eq!(report.cascades[0].records, vec![1]);

        store.restore(1, None).unwrap();
        assert!(store.document().contains(EntityKind::Collaborator, 1));
        assert_eq!(store.document().tasks[0].assignee_id, None);
    }

    #[test]
    fn purge_removes_for_good() {
        let mut store = store();
        store.soft_delete(EntityKind::Client, 1).unwrap();
        let item = store.purge(1, None).unwrap();
        assert_eq!(item.kind(), EntityKind::Client);
        assert!(!in_trash(&store, 1));
        assert!(!store.document().contains(EntityKind::Client, 1));

        assert!(matches!(store.purge(1, None), Err(Error::DeletedItemNotFound(1))));
        assert!(matches!(store.restore(1, None), Err(Error::DeletedItemNotFound(1))));
    }

    #[test]
    fn shared_id_across_kinds_needs_a_type() {
        let mut store = store();
        store.soft_delete(EntityKind::Client, 1).unwrap();
        store.soft_delete(EntityKind::Collaborator, 1).unwrap();
        let before = store.snapshot();

        let err = store.purge(1, None).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(err.to_string().contains("--type"));
        assert!(matches!(store.restore(1, None), Err(Error::Validation(_))));
        assert_eq!(store.document(), &before);

        let item = store.purge(1, Some(EntityKind::Client)).unwrap();
        assert_eq!(item.kind(), EntityKind::Client);
        assert_eq!(store.document().deleted_items.len(), 1);
        assert_eq!(store.document().deleted_items[0].kind(), EntityKind::Collaborator);

        // Only one candidate left, so no narrowing is needed
        let report = store.restore(1, None).unwrap();
        assert_eq!(report.entity.kind(), EntityKind::Collaborator);
        assert!(store.document().contains(EntityKind::Collaborator, 1));
        assert!(!store.document().contains(EntityKind::Client, 1));
    }

    #[test]
    fn narrowing_to_the_wrong_kind_finds_nothing() {
        let mut store = store();
        store.soft_delete(EntityKind::Task, 2).unwrap();
        assert!(matches!(
            store.restore(2, Some(EntityKind::Project)),
            Err(Error::DeletedItemNotFound(2))
        ));
        assert!(store.restore(2, Some(EntityKind::Task)).is_ok());
    }
}
