//! The persistent store.
//!
//! [`Store`] owns the single in-memory [`Document`] and the storage it is
//! mirrored to. Every mutation runs through [`Store::commit`]:
//!
//! 1. the connectivity gate is checked (offline → [`Error::Offline`]);
//! 2. the change is applied to a draft copy of the document;
//! 3. the draft is serialized and written under the store key;
//! 4. only then does the draft replace the live document.
//!
//! A failure at any step leaves both the in-memory and the persisted
//! document exactly as they were.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::document::{Document, ImportDocument};
use crate::error::{Error, Result};
use crate::gate::{ConnectivityGate, Mutation};
use crate::lock;
use crate::model::{EntityId, Timestamp};
use crate::notify::{self, Notifier, SilentNotifier, DEFAULT_NOTIFICATION_CAP};
use crate::storage::KeyValueStorage;

/// Namespace used when none is configured
pub const DEFAULT_NAMESPACE: &str = "bytecraft";

/// Current time in epoch milliseconds
pub fn now_ms() -> Timestamp {
    Utc::now().timestamp_millis()
}

/// Storage key for a namespace: `<namespace>_db`
pub fn store_key(namespace: &str) -> String {
    format!("{namespace}_db")
}

#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub key: String,
    pub notification_cap: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            key: store_key(DEFAULT_NAMESPACE),
            notification_cap: DEFAULT_NOTIFICATION_CAP,
        }
    }
}

/// Where the document came from on load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadOrigin {
    Persisted,
    /// Nothing was stored yet
    Seeded,
    /// The stored record could not be parsed and was replaced
    Reseeded,
}

/// Strictly increasing ids derived from the wall clock
#[derive(Debug, Clone, Copy)]
pub(crate) struct IdClock {
    last: EntityId,
}

impl IdClock {
    pub(crate) fn after(last: EntityId) -> Self {
        Self { last }
    }

    pub(crate) fn next(&mut self, now: Timestamp) -> EntityId {
        let id = now.max(self.last + 1);
        self.last = id;
        id
    }
}

struct Notice {
    title: String,
    body: String,
}

/// Working copy handed to a mutation
pub(crate) struct Draft {
    pub(crate) doc: Document,
    pub(crate) now: Timestamp,
    ids: IdClock,
    cap: usize,
    notices: Vec<Notice>,
}

impl Draft {
    pub(crate) fn next_id(&mut self) -> EntityId {
        self.ids.next(self.now)
    }

    /// Log a notification and queue it for the desktop
    pub(crate) fn notify(&mut self, title: &str, message: String) {
        let id = self.next_id();
        notify::push_notification(&mut self.doc.notifications, id, message.clone(), self.now, self.cap);
        self.notices.push(Notice {
            title: title.to_string(),
            body: message,
        });
    }
}

/// Counts of what an import replaced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub clients: usize,
    pub projects: usize,
    pub tasks: usize,
    pub collaborators: usize,
    pub deleted_items: usize,
}

pub struct Store<S: KeyValueStorage> {
    storage: S,
    key: String,
    doc: Document,
    ids: IdClock,
    gate: ConnectivityGate,
    notifier: Box<dyn Notifier>,
    notification_cap: usize,
    origin: LoadOrigin,
}

impl<S: KeyValueStorage> Store<S> {
    /// Load the document stored under `options.key`
    ///
    /// An absent or unparsable record is replaced by the factory default,
    /// which is persisted before this returns.
    pub fn load(storage: S, options: StoreOptions) -> Result<Self> {
        let StoreOptions {
            key,
            notification_cap,
        } = options;

        let notification_cap = notification_cap.clamp(1, DEFAULT_NOTIFICATION_CAP);
        let (mut doc, origin) = match storage.get(&key)? {
            Some(raw) => match serde_json::from_str::<Document>(&raw) {
                Ok(doc) => (doc, LoadOrigin::Persisted),
                Err(err) => {
                    tracing::warn!(key = %key, error = %err, "stored document is unreadable; reseeding factory defaults");
                    (Document::factory_default(now_ms()), LoadOrigin::Reseeded)
                }
            },
            None => (Document::factory_default(now_ms()), LoadOrigin::Seeded),
        };

        if doc.notifications.len() > notification_cap {
            tracing::debug!(
                kept = notification_cap,
                dropped = doc.notifications.len() - notification_cap,
                "trimming notification log"
            );
            doc.notifications.truncate(notification_cap);
        }

        let mut store = Self {
            storage,
            key,
            ids: IdClock::after(doc.max_id()),
            doc,
            gate: ConnectivityGate::default(),
            notifier: Box::new(SilentNotifier),
            notification_cap,
            origin,
        };

        if origin != LoadOrigin::Persisted {
            store.save()?;
            tracing::info!(key = %store.key, origin = ?origin, "seeded factory defaults");
        }

        Ok(store)
    }

    pub fn with_gate(mut self, gate: ConnectivityGate) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Owned copy for read-models
    pub fn snapshot(&self) -> Document {
        self.doc.clone()
    }

    pub fn origin(&self) -> LoadOrigin {
        self.origin
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn gate(&self) -> &ConnectivityGate {
        &self.gate
    }

    pub fn gate_mut(&mut self) -> &mut ConnectivityGate {
        &mut self.gate
    }

    /// Overwrite the stored record with the in-memory document
    pub fn save(&mut self) -> Result<()> {
        let json = serde_json::to_string(&self.doc)?;
        self.write_record(&json)
    }

    fn write_record(&mut self, json: &str) -> Result<()> {
        self.storage.set(&self.key, json).map_err(|err| {
            tracing::error!(key = %self.key, error = %err, "failed to persist document");
            Error::Storage(format!("could not persist '{}': {err}", self.key))
        })
    }

    /// Run one mutation as a single persisted transaction
    pub(crate) fn commit<T>(
        &mut self,
        mutation: Option<Mutation>,
        apply: impl FnOnce(&mut Draft) -> Result<T>,
    ) -> Result<T> {
        if let Some(mutation) = mutation {
            self.gate.ensure_online(mutation)?;
        }

        let mut draft = Draft {
            doc: self.doc.clone(),
            now: now_ms(),
            ids: self.ids,
            cap: self.notification_cap,
            notices: Vec::new(),
        };
        let value = apply(&mut draft)?;

        let json = serde_json::to_string(&draft.doc)?;
        self.write_record(&json)?;

        let Draft {
            doc, ids, notices, ..
        } = draft;
        self.doc = doc;
        self.ids = ids;
        for notice in notices {
            self.notifier.show(&notice.title, &notice.body);
        }

        Ok(value)
    }

    /// Replace every collection from a parsed backup
    ///
    /// Notifications are kept from the current document.
    pub fn replace(&mut self, import: ImportDocument) -> Result<ImportReport> {
        let report = self.commit(Some(Mutation::Import), |draft| {
            let ImportDocument {
                clients,
                projects,
                tasks,
                collaborators,
                deleted_items,
            } = import;
            let report = ImportReport {
                clients: clients.len(),
                projects: projects.len(),
                tasks: tasks.len(),
                collaborators: collaborators.len(),
                deleted_items: deleted_items.len(),
            };

            draft.doc.clients = clients;
            draft.doc.projects = projects;
            draft.doc.tasks = tasks;
            draft.doc.collaborators = collaborators;
            draft.doc.deleted_items = deleted_items;
            // Imported ids may run past anything issued so far.
            draft.ids = IdClock::after(draft.ids.last.max(draft.doc.max_id()));
            draft.notify(
                "Restore Complete",
                "Database restored from a backup file.".to_string(),
            );
            Ok(report)
        })?;

        tracing::info!(
            clients = report.clients,
            projects = report.projects,
            tasks = report.tasks,
            "imported backup"
        );
        Ok(report)
    }

    /// Validate and import a backup file's contents
    pub fn import_str(&mut self, raw: &str) -> Result<ImportReport> {
        self.gate.ensure_online(Mutation::Import)?;
        let import = ImportDocument::parse(raw)?;
        self.replace(import)
    }

    /// Delete the stored record; the next [`Store::load`] reseeds
    ///
    /// The in-memory document becomes a fresh factory default that is not
    /// written until the next mutation.
    pub fn reset(&mut self) -> Result<()> {
        self.gate.ensure_online(Mutation::FactoryReset)?;
        let removed = self.storage.remove(&self.key)?;
        self.doc = Document::factory_default(now_ms());
        self.ids = IdClock::after(self.doc.max_id());
        self.origin = LoadOrigin::Seeded;
        tracing::info!(key = %self.key, removed, "factory reset");
        Ok(())
    }

    /// Backup JSON (indented, without notifications)
    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.doc.to_export())?)
    }

    /// Write `bytecraft_backup_<date>.json` into `dir`
    pub fn export_to_dir(&mut self, dir: &Path, date: NaiveDate) -> Result<PathBuf> {
        let path = dir.join(backup_file_name(date));
        let json = self.export_json()?;
        lock::write_atomic(&path, json.as_bytes())?;
        self.commit(None, |draft| {
            draft.notify("Backup", "Database backup downloaded.".to_string());
            Ok(())
        })?;
        tracing::info!(path = %path.display(), "exported backup");
        Ok(path)
    }

    /// Mark every notification as read; returns how many changed
    pub fn mark_all_notifications_read(&mut self) -> Result<usize> {
        if notify::unread_count(&self.doc.notifications) == 0 {
            return Ok(0);
        }
        self.commit(None, |draft| {
            let mut changed = 0;
            for entry in draft.doc.notifications.iter_mut().filter(|n| !n.read) {
                entry.read = true;
                changed += 1;
            }
            Ok(changed)
        })
    }
}

/// `bytecraft_backup_YYYY-MM-DD.json`
pub fn backup_file_name(date: NaiveDate) -> String {
    format!("bytecraft_backup_{}.json", date.format("%Y-%m-%d"))
}

/// Calendar date of an epoch-millisecond timestamp (UTC)
pub fn date_of(timestamp: Timestamp) -> NaiveDate {
    DateTime::<Utc>::from_timestamp_millis(timestamp)
        .unwrap_or_default()
        .date_naive()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::model::EntityKind;
    use crate::notify::RecordingNotifier;
    use crate::records::NewClient;
    use crate::storage::MemoryStorage;

    /// Memory storage whose writes start failing once `broken` is set
    #[derive(Default)]
    struct FlakyStorage {
        inner: MemoryStorage,
        broken: Arc<AtomicBool>,
    }

    impl KeyValueStorage for FlakyStorage {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<()> {
            if self.broken.load(Ordering::SeqCst) {
                return Err(Error::Io(std::io::Error::other("disk full")));
            }
            self.inner.set(key, value)
        }

        fn remove(&mut self, key: &str) -> Result<bool> {
            self.inner.remove(key)
        }
    }

    fn store() -> Store<MemoryStorage> {
        Store::load(MemoryStorage::new(), StoreOptions::default()).unwrap()
    }

    #[test]
    fn id_clock_is_strictly_increasing() {
        let mut ids = IdClock::after(100);
        assert_eq!(ids.next(50), 101);
        assert_eq!(ids.next(50), 102);
        assert_eq!(ids.next(1_000), 1_000);
        assert_eq!(ids.next(1_000), 1_001);
    }

    #[test]
    fn load_seeds_and_persists_when_absent() {
        let store = store();
        assert_eq!(store.origin(), LoadOrigin::Seeded);
        assert_eq!(store.key(), "bytecraft_db");
        let raw = store.storage().get("bytecraft_db").unwrap().unwrap();
        let persisted: Document = serde_json::from_str(&raw).unwrap();
        assert_eq!(&persisted, store.document());
    }

    #[test]
    fn load_reseeds_unparsable_record() {
        let mut storage = MemoryStorage::new();
        storage.set("bytecraft_db", "{not json").unwrap();
        let store = Store::load(storage, StoreOptions::default()).unwrap();
        assert_eq!(store.origin(), LoadOrigin::Reseeded);
        assert_eq!(store.document().tasks.len(), 3);
    }

    #[test]
    fn load_keeps_persisted_document() {
        let mut first = store();
        assert_eq!(first.mark_all_notifications_read().unwrap(), 3);
        let storage = first.storage().clone();

        let second = Store::load(storage, StoreOptions::default()).unwrap();
        assert_eq!(second.origin(), LoadOrigin::Persisted);
        assert!(second.document().notifications.iter().all(|n| n.read));
    }

    #[test]
    fn backup_file_is_named_by_date() {
        let date = NaiveDate::from_ymd_opt(2025, 11, 3).unwrap();
        assert_eq!(backup_file_name(date), "bytecraft_backup_2025-11-03.json");
        assert_eq!(date_of(0), NaiveDate::from_ymd_opt(1970, 1, 1).unwrap());
    }

    #[test]
    fn failed_write_keeps_document_and_stays_quiet() {
        let storage = FlakyStorage::default();
        let broken = storage.broken.clone();
        let notifier = RecordingNotifier::granted();
        let mut store = Store::load(storage, StoreOptions::default())
            .unwrap()
            .with_notifier(Box::new(notifier.clone()));
        let before = store.snapshot();
        broken.store(true, Ordering::SeqCst);

        let err = store
            .create_client(NewClient {
                name: "Nordic Freight".to_string(),
                contact: String::new(),
            })
            .unwrap_err();
        assert!(matches!(err, Error::Storage(_)), "unexpected error: {err}");
        assert!(err.to_string().contains("bytecraft_db"));

        let err = store.soft_delete(EntityKind::Client, 1).unwrap_err();
        assert!(matches!(err, Error::Storage(_)), "unexpected error: {err}");

        assert_eq!(store.document(), &before);
        assert!(notifier.shown().is_empty());

        // Writes recover once storage does
        broken.store(false, Ordering::SeqCst);
        store.soft_delete(EntityKind::Client, 1).unwrap();
        assert_eq!(notifier.shown().len(), 1);
        assert!(!store.document().contains(EntityKind::Client, 1));
    }
}
