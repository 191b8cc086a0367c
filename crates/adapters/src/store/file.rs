// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock store on a shared directory
//!
//! A `file://<dir>` store keeps one file per key holding
//! `<expires_at_unix_ms>\n<value>`. Every read-check-write runs under an
//! exclusive `fs2` lock on `<dir>/.fence.lock`, so separate processes that
//! share the directory contend on the same keyspace. Expiry is wall-clock
//! time, the only clock separate processes share.

use super::{StoreAdapter, StoreConnector, StoreError};
use async_trait::async_trait;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Address scheme accepted by [`FileConnector`]
pub const FILE_SCHEME: &str = "file://";

const LOCK_FILE: &str = ".fence.lock";
const KEY_PREFIX: &str = "key-";

/// A connection to a directory-backed keyspace
#[derive(Clone)]
pub struct FileStore {
    address: String,
    dir: PathBuf,
    closed: Arc<AtomicBool>,
}

struct Entry {
    expires_at_ms: u64,
    value: String,
}

impl FileStore {
    /// Open `dir` as a store, creating it if needed
    pub fn open(address: impl Into<String>, dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| io_error(&dir, e))?;
        Ok(Self {
            address: address.into(),
            dir,
            closed: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Live value stored under `key`, if any
    pub fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _lock = lock_dir(&self.dir)?;
        let entry = read_entry(&key_path(&self.dir, key))?;
        Ok(entry
            .filter(|entry| entry.expires_at_ms > now_ms())
            .map(|entry| entry.value))
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }

    /// Run `op` on the blocking pool while holding the directory lock
    async fn locked<R, F>(&self, op: F) -> Result<R, StoreError>
    where
        R: Send + 'static,
        F: FnOnce(&Path) -> Result<R, StoreError> + Send + 'static,
    {
        self.ensure_open()?;
        let dir = self.dir.clone();
        tokio::task::spawn_blocking(move || {
            let _lock = lock_dir(&dir)?;
            op(&dir)
        })
        .await
        .map_err(|e| StoreError::Io(format!("store task failed: {e}")))?
    }
}

#[async_trait]
impl StoreAdapter for FileStore {
    fn address(&self) -> &str {
        &self.address
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        let path_key = key.to_string();
        let value = value.to_string();
        self.locked(move |dir| {
            let path = key_path(dir, &path_key);
            let now = now_ms();
            if read_entry(&path)?.is_some_and(|entry| entry.expires_at_ms > now) {
                return Ok(false);
            }
            let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
            let expires_at_ms = now.saturating_add(ttl_ms);
            fs::write(&path, format!("{expires_at_ms}\n{value}")).map_err(|e| io_error(&path, e))?;
            Ok(true)
        })
        .await
    }

    async fn delete_if_match(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        let path_key = key.to_string();
        let value = value.to_string();
        self.locked(move |dir| {
            let path = key_path(dir, &path_key);
            let Some(entry) = read_entry(&path)? else {
                return Ok(false);
            };
            let live = entry.expires_at_ms > now_ms();
            if live && entry.value != value {
                return Ok(false);
            }
            remove(&path)?;
            Ok(live)
        })
        .await
    }

    async fn close(&self) -> Result<(), StoreError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }
}

/// Opens [`FileStore`] connections for `file://<dir>` addresses
#[derive(Clone, Copy, Debug, Default)]
pub struct FileConnector;

#[async_trait]
impl StoreConnector for FileConnector {
    type Store = FileStore;

    async fn connect(&self, address: &str) -> Result<FileStore, StoreError> {
        let dir = address
            .strip_prefix(FILE_SCHEME)
            .filter(|dir| !dir.is_empty())
            .ok_or_else(|| StoreError::UnsupportedAddress(address.to_string()))?
            .to_string();
        let address = address.to_string();
        tokio::task::spawn_blocking(move || FileStore::open(address, dir))
            .await
            .map_err(|e| StoreError::Io(format!("store task failed: {e}")))?
    }
}

fn lock_dir(dir: &Path) -> Result<File, StoreError> {
    let path = dir.join(LOCK_FILE);
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&path)
        .map_err(|e| io_error(&path, e))?;
    file.lock_exclusive().map_err(|e| io_error(&path, e))?;
    Ok(file)
}

/// Keys are hex-encoded so any resource name is a safe file name
fn key_path(dir: &Path, key: &str) -> PathBuf {
    let encoded: String = key.bytes().map(|b| format!("{b:02x}")).collect();
    dir.join(format!("{KEY_PREFIX}{encoded}"))
}

/// Stored entry, or None when absent or unreadable as an entry
fn read_entry(path: &Path) -> Result<Option<Entry>, StoreError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(io_error(path, e)),
    };
    // A torn write from a crashed holder counts as absent
    Ok(content.split_once('\n').and_then(|(expires, value)| {
        Some(Entry {
            expires_at_ms: expires.parse().ok()?,
            value: value.to_string(),
        })
    }))
}

fn remove(path: &Path) -> Result<(), StoreError> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != ErrorKind::NotFound => Err(io_error(path, e)),
        _ => Ok(()),
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

fn io_error(path: &Path, error: std::io::Error) -> StoreError {
    StoreError::Io(format!("{}: {error}", path.display()))
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
