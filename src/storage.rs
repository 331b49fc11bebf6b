//! Key-value storage backing the store
//!
//! The store keeps its whole document under one key. On disk every key is
//! one file inside the data directory:
//!
//! ```text
//! <data-dir>/
//!   .bytecraft.toml             # Optional configuration
//!   bytecraft_db.json           # The persisted document
//!   bytecraft_db.json.lock      # Advisory lock guarding writes
//!   cache/                      # Offline cache buckets (see `cache`)
//! ```

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::lock::{self, DEFAULT_LOCK_TIMEOUT_MS};

/// Persistent string storage addressed by key
pub trait KeyValueStorage {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    /// Returns whether the key existed
    fn remove(&mut self, key: &str) -> Result<bool>;
}

/// One file per key under a root directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
    lock_timeout_ms: u64,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
        }
    }

    pub fn with_lock_timeout(mut self, timeout_ms: u64) -> Self {
        self.lock_timeout_ms = timeout_ms;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding `key`
    pub fn key_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", file_key(key)))
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.key_path(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        lock::write_atomic_locked(self.key_path(key), value.as_bytes(), self.lock_timeout_ms)
    }

    fn remove(&mut self, key: &str) -> Result<bool> {
        lock::remove_locked(self.key_path(key), self.lock_timeout_ms)
    }
}

/// In-process storage for tests and dry runs
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<bool> {
        Ok(self.entries.remove(key).is_some())
    }
}

/// Map an arbitrary key onto a safe file stem
fn file_key(key: &str) -> String {
    let mut stem = String::with_capacity(key.len());
    for ch in key.chars() {
        if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
            stem.push(ch);
        } else {
            stem.push('_');
        }
    }
    if stem.is_empty() {
        "_".to_string()
    } else {
        stem
    }
}
