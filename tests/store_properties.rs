use std::collections::HashSet;

use bytecraft::document::Document;
use bytecraft::error::Error;
use bytecraft::gate::ConnectivityGate;
use bytecraft::model::{EntityKind, Notification, Priority, Role, WorkStatus};
use bytecraft::notify::RecordingNotifier;
use bytecraft::records::{NewClient, NewCollaborator, NewTask, TaskPatch};
use bytecraft::storage::{FileStorage, KeyValueStorage, MemoryStorage};
use bytecraft::store::{LoadOrigin, Store, StoreOptions};

fn memory_store() -> Store<MemoryStorage> {
    Store::load(MemoryStorage::new(), StoreOptions::default()).expect("load store")
}

fn stored_raw(store: &Store<MemoryStorage>) -> Option<String> {
    store.storage().get(store.key()).expect("read storage")
}

fn assert_ledger_disjoint(doc: &Document) {
    for kind in EntityKind::ALL {
        let live: HashSet<_> = doc.live_ids(kind).into_iter().collect();
        for item in doc.deleted_items.iter().filter(|item| item.kind() == kind) {
            assert!(
                !live.contains(&item.id()),
                "{kind} {} is both live and in the trash",
                item.id()
            );
        }
    }
}

#[test]
fn live_and_deleted_ids_stay_disjoint() {
    let mut store = memory_store();

    store.soft_delete(EntityKind::Client, 1).unwrap();
    assert_ledger_disjoint(store.document());
    store.soft_delete(EntityKind::Task, 2).unwrap();
    store.soft_delete(EntityKind::Collaborator, 1).unwrap();
    assert_ledger_disjoint(store.document());
    store.restore(1, Some(EntityKind::Collaborator)).unwrap();
    assert_ledger_disjoint(store.document());
    store.soft_delete(EntityKind::Project, 2).unwrap();
    store.purge(2, Some(EntityKind::Project)).unwrap();
    assert_ledger_disjoint(store.document());

    let persisted: Document = serde_json::from_str(&stored_raw(&store).unwrap()).unwrap();
    assert_ledger_disjoint(&persisted);
    assert_eq!(&persisted, store.document());
}

#[test]
fn deleting_a_collaborator_unassigns_every_task() {
    let mut store = memory_store();
    let collaborator = store
        .create_collaborator(NewCollaborator {
            name: "Lucía Gómez".to_string(),
            email: "lucia@bytecraft.com".to_string(),
            role: Role::Tester,
        })
        .unwrap();

    let mut assigned = Vec::new();
    for n in 0..4 {
        let task = store
            .create_task(NewTask {
                title: format!("Regression pass {n}"),
                assignee_id: Some(collaborator.id),
                ..NewTask::default()
            })
            .unwrap();
        assigned.push(task.id);
    }

    let report = store
        .soft_delete(EntityKind::Collaborator, collaborator.id)
        .unwrap();
    let cleared: Vec<_> = report
        .cascades
        .iter()
        .flat_map(|effect| effect.records.iter().copied())
        .collect();
    assert_eq!(cleared, assigned);

    for task in &store.document().tasks {
        assert_ne!(task.assignee_id, Some(collaborator.id));
    }
    // Unrelated assignments survive
    let sprint = store.document().tasks.iter().find(|t| t.id == 3).unwrap();
    assert_eq!(sprint.assignee_id, Some(2));
}

#[test]
fn deleting_client_one_keeps_task_references() {
    let mut store = memory_store();
    let tasks_before = store.document().tasks.clone();

    store.soft_delete(EntityKind::Client, 1).unwrap();

    let doc = store.document();
    assert_eq!(doc.clients.len(), 1);
    assert_eq!(doc.clients[0].id, 2);
    assert_eq!(doc.deleted_items.len(), 1);
    assert_eq!(doc.deleted_items[0].kind(), EntityKind::Client);
    assert_eq!(doc.tasks, tasks_before);

    let persisted: serde_json::Value =
        serde_json::from_str(&stored_raw(&store).unwrap()).unwrap();
    assert_eq!(persisted["deleted_items"][0]["type"], "client");
    assert_eq!(persisted["deleted_items"][0]["name"], "Innovatech Solutions");
    assert_eq!(persisted["tasks"][0]["clientId"], 1);
}

#[test]
fn restore_brings_back_the_record_verbatim() {
    let mut store = memory_store();
    let original = store
        .document()
        .projects
        .iter()
        .find(|p| p.id == 1)
        .cloned()
        .unwrap();

    store.soft_delete(EntityKind::Project, 1).unwrap();
    let report = store.restore(1, None).unwrap();
    assert!(report.detached.is_empty());

    let restored = store
        .document()
        .projects
        .iter()
        .find(|p| p.id == 1)
        .unwrap();
    assert_eq!(restored, &original);
    assert!(store.document().deleted_items.is_empty());
}

#[test]
fn notification_log_is_capped_newest_first() {
    let mut store = memory_store();
    for n in 0..25 {
        store
            .create_client(NewClient {
                name: format!("Client {n}"),
                contact: String::new(),
            })
            .unwrap();
    }

    let log = &store.document().notifications;
    assert_eq!(log.len(), 20);
    assert_eq!(log[0].message, "New client \"Client 24\" added.");
    assert_eq!(log[19].message, "New client \"Client 5\" added.");
}

#[test]
fn oversized_cap_option_is_held_to_twenty() {
    let options = StoreOptions {
        notification_cap: 50,
        ..StoreOptions::default()
    };
    let mut store = Store::load(MemoryStorage::new(), options).unwrap();
    for n in 0..40 {
        store
            .create_client(NewClient {
                name: format!("Client {n}"),
                contact: String::new(),
            })
            .unwrap();
    }
    assert_eq!(store.document().notifications.len(), 20);
}

#[test]
fn oversized_persisted_log_is_trimmed_on_load() {
    let mut doc = Document::factory_default(0);
    doc.notifications = (0..30)
        .map(|n| Notification {
            id: 100 + n,
            message: format!("entry {n}"),
            read: false,
            timestamp: n,
        })
        .collect();
    let mut storage = MemoryStorage::new();
    storage
        .set("bytecraft_db", &serde_json::to_string(&doc).unwrap())
        .unwrap();

    let store = Store::load(storage, StoreOptions::default()).unwrap();
    let log = &store.document().notifications;
    assert_eq!(log.len(), 20);
    assert_eq!(log[0].message, "entry 0");
    assert_eq!(log[19].message, "entry 19");
}

#[test]
fn import_missing_tasks_changes_nothing() {
    let mut store = memory_store();
    store
        .create_client(NewClient {
            name: "Nordic Freight".to_string(),
            contact: String::new(),
        })
        .unwrap();
    let before = stored_raw(&store);
    let doc_before = store.snapshot();

    let err = store
        .import_str(r#"{"clients": [], "projects": []}"#)
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert!(err.to_string().contains("tasks"));

    assert_eq!(stored_raw(&store), before);
    assert_eq!(store.document(), &doc_before);
}

#[test]
fn import_replaces_collections_and_keeps_notifications() {
    let mut store = memory_store();
    let backup = r#"{
        "clients": [{"id": 10, "name": "Archive Co", "contact": ""}],
        "projects": [],
        "tasks": [{"id": 11, "title": "Migrate", "status": "Completed", "priority": "Low", "clientId": 10}]
    }"#;

    let report = store.import_str(backup).unwrap();
    assert_eq!(report.clients, 1);
    assert_eq!(report.tasks, 1);

    let doc = store.document();
    assert_eq!(doc.clients[0].name, "Archive Co");
    assert!(doc.collaborators.is_empty());
    assert!(doc.deleted_items.is_empty());
    assert_eq!(doc.notifications.len(), 4);
    assert_eq!(doc.notifications[0].message, "Database restored from a backup file.");

    // Fresh ids never collide with imported ones
    let task = store
        .create_task(NewTask {
            title: "Follow-up".to_string(),
            ..NewTask::default()
        })
        .unwrap();
    assert!(task.id > 11);
}

#[test]
fn offline_mutations_fail_and_leave_storage_untouched() {
    let mut store = memory_store();
    let before = stored_raw(&store);
    store.gate_mut().set_online(false);

    let attempts: Vec<Error> = vec![
        store
            .create_client(NewClient {
                name: "Blocked".to_string(),
                contact: String::new(),
            })
            .unwrap_err(),
        store
            .edit_task(
                1,
                TaskPatch {
                    priority: Some(Priority::Urgent),
                    ..TaskPatch::default()
                },
            )
            .unwrap_err(),
        store.toggle_task_status(1).unwrap_err(),
        store.soft_delete(EntityKind::Project, 1).unwrap_err(),
        store.restore(1, None).unwrap_err(),
        store.purge(1, None).unwrap_err(),
        store.import_str(r#"{"clients": [], "projects": [], "tasks": []}"#).unwrap_err(),
        store.reset().unwrap_err(),
    ];
    for err in attempts {
        assert!(matches!(err, Error::Offline(_)), "unexpected error: {err}");
    }
    assert_eq!(stored_raw(&store), before);

    // Reads still work
    assert_eq!(store.document().tasks[0].status, WorkStatus::Pending);

    store.gate_mut().set_online(true);
    store.toggle_task_status(1).unwrap();
    assert_eq!(store.document().tasks[0].status, WorkStatus::Completed);
}

#[test]
fn failed_import_does_not_announce_anything() {
    let notifier = RecordingNotifier::granted();
    let mut store = memory_store().with_notifier(Box::new(notifier.clone()));

    assert!(store.import_str("not json").is_err());
    assert!(notifier.shown().is_empty());

    store
        .create_client(NewClient {
            name: "Helix".to_string(),
            contact: String::new(),
        })
        .unwrap();
    assert_eq!(notifier.shown().len(), 1);
}

#[test]
fn file_storage_round_trips_the_document() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = Store::load(FileStorage::new(dir.path()), StoreOptions::default()).unwrap();
    assert_eq!(store.origin(), LoadOrigin::Seeded);
    store.soft_delete(EntityKind::Collaborator, 2).unwrap();
    store.log_time(1, 45 * 60_000).unwrap();
    let expected = store.snapshot();

    let reloaded = Store::load(FileStorage::new(dir.path()), StoreOptions::default()).unwrap();
    assert_eq!(reloaded.origin(), LoadOrigin::Persisted);
    assert_eq!(reloaded.document(), &expected);
    assert!(dir.path().join("bytecraft_db.json").exists());
}

#[test]
fn reset_reseeds_on_next_load() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = Store::load(FileStorage::new(dir.path()), StoreOptions::default()).unwrap();
    store.soft_delete(EntityKind::Client, 2).unwrap();
    store.reset().unwrap();
    assert!(!dir.path().join("bytecraft_db.json").exists());

    let reloaded = Store::load(FileStorage::new(dir.path()), StoreOptions::default()).unwrap();
    assert_eq!(reloaded.origin(), LoadOrigin::Seeded);
    assert_eq!(reloaded.document().clients.len(), 2);
    assert!(reloaded.document().deleted_items.is_empty());
}

#[test]
fn offline_gate_can_be_supplied_up_front() {
    let mut store = memory_store().with_gate(ConnectivityGate::offline());
    assert!(matches!(
        store.restore(1, None),
        Err(Error::Offline(_))
    ));
}
