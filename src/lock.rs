//! Advisory locking and atomic replacement for persisted records
//!
//! Every record file is written through the same sequence:
//! - take an exclusive `fs2` lock on `<record>.lock`
//! - write the payload to a sibling temp file and fsync it
//! - rename the temp file over the record
//!
//! Readers therefore see either the previous document or the next one,
//! never a partial write. Two processes writing the same record still
//! resolve as last-writer-wins.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use fs2::FileExt;

use crate::error::{Error, Result};

/// Default lock timeout in milliseconds
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5000;

const LOCK_RETRY_INTERVAL_MS: u64 = 25;

fn is_lock_contended(err: &io::Error) -> bool {
    if err.kind() == io::ErrorKind::WouldBlock {
        return true;
    }

    // Windows reports sharing/lock violations as raw OS errors 32 and 33.
    #[cfg(windows)]
    {
        matches!(err.raw_os_error(), Some(32) | Some(33))
    }
    #[cfg(not(windows))]
    {
        false
    }
}

fn open_lock_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    Ok(OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)?)
}

/// Exclusive lock guard; the lock is released on drop
pub struct RecordLock {
    file: File,
    path: PathBuf,
}

impl RecordLock {
    /// Acquire the lock, polling until `timeout_ms` elapses
    pub fn acquire(path: impl AsRef<Path>, timeout_ms: u64) -> Result<Self> {
        let path = path.as_ref();
        let file = open_lock_file(path)?;

        let start = Instant::now();
        let timeout = Duration::from_millis(timeout_ms);
        let retry_interval = Duration::from_millis(LOCK_RETRY_INTERVAL_MS);

        loop {
            match file.try_lock_exclusive() {
                Ok(()) => {
                    return Ok(RecordLock {
                        file,
                        path: path.to_path_buf(),
                    });
                }
                Err(e) if is_lock_contended(&e) => {
                    if start.elapsed() >= timeout {
                        return Err(Error::LockFailed(path.to_path_buf()));
                    }
                    std::thread::sleep(retry_interval);
                }
                Err(e) => return Err(Error::Io(e)),
            }
        }
    }

    /// Try once; `Ok(None)` when another holder owns the lock
    pub fn try_acquire(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        let file = open_lock_file(path)?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(RecordLock {
                file,
                path: path.to_path_buf(),
            })),
            Err(e) if is_lock_contended(&e) => Ok(None),
            Err(e) => Err(Error::Io(e)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RecordLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

/// Path of the lock file guarding `path`
pub fn lock_path_for(path: &Path) -> PathBuf {
    PathBuf::from(format!("{}.lock", path.display()))
}

/// Replace `path` with `data` via temp file + rename (no locking)
pub fn write_atomic(path: impl AsRef<Path>, data: &[u8]) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    // Same directory as the target so the rename never crosses filesystems.
    let temp_path = PathBuf::from(format!(
        "{}.tmp.{}",
        path.display(),
        std::process::id()
    ));

    let mut temp_file = File::create(&temp_path)?;
    temp_file.write_all(data)?;
    temp_file.sync_all()?;
    drop(temp_file);

    fs::rename(&temp_path, path)?;
    Ok(())
}

/// Replace `path` with `data` while holding `<path>.lock`
pub fn write_atomic_locked(path: impl AsRef<Path>, data: &[u8], timeout_ms: u64) -> Result<()> {
    let path = path.as_ref();
    let _lock = RecordLock::acquire(lock_path_for(path), timeout_ms)?;
    write_atomic(path, data)
}

/// Remove `path` (if present) while holding `<path>.lock`
///
/// Returns whether a file was removed.
pub fn remove_locked(path: impl AsRef<Path>, timeout_ms: u64) -> Result<bool> {
    let path = path.as_ref();
    let _lock = RecordLock::acquire(lock_path_for(path), timeout_ms)?;
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::Io(e)),
    }
}
