//! Key/value persistence adapters.
//!
//! The task store writes one JSON document under one key and never reads
//! back except at startup. Two adapters are provided:
//!
//! - [`MemoryStore`]: process-local map, for tests and embedding
//! - [`FileStore`]: one file per key in a data directory
//!
//! # Directory Structure
//!
//! ```text
//! <data_dir>/
//!   records.json      # Latest snapshot, replaced atomically on every save
//!   records.lock      # Advisory lock serializing readers and writers
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::lock::{self, DEFAULT_LOCK_TIMEOUT_MS};

/// Asynchronous key/value store holding whole JSON documents.
#[async_trait]
pub trait KeyValueStore: Send + Sync + fmt::Debug {
    /// Read the document under `key`; `None` if nothing was ever written.
    async fn get_item(&self, key: &str) -> Result<Option<Value>>;

    /// Replace the document under `key`.
    async fn set_item(&self, key: &str, value: Value) -> Result<()>;
}

/// Reject keys that would escape the data directory or name nothing.
pub fn validate_key(key: &str) -> Result<()> {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidArgument("storage key cannot be empty".to_string()));
    }
    if trimmed != key
        || key.contains(['/', '\\'])
        || key == "."
        || key == ".."
        || key.starts_with('.')
    {
        return Err(Error::InvalidArgument(format!(
            "storage key must be a plain file name: '{key}'"
        )));
    }
    Ok(())
}

// =========================================================================
// In-memory adapter
// =========================================================================

/// Map-backed store. Counts writes and can be told to fail them.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, Value>>,
    writes: AtomicUsize,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document, as if saved by an earlier session.
    pub fn with_item(self, key: impl Into<String>, value: Value) -> Self {
        if let Ok(mut items) = self.items.lock() {
            items.insert(key.into(), value);
        }
        self
    }

    /// Number of successful `set_item` calls.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Synchronous peek at the stored document.
    pub fn item(&self, key: &str) -> Option<Value> {
        self.items
            .lock()
            .ok()
            .and_then(|items| items.get(key).cloned())
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get_item(&self, key: &str) -> Result<Option<Value>> {
        let items = self
            .items
            .lock()
            .map_err(|_| Error::Persistence("memory store lock poisoned".to_string()))?;
        Ok(items.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: Value) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Persistence(format!("write to '{key}' rejected")));
        }
        let mut items = self
            .items
            .lock()
            .map_err(|_| Error::Persistence("memory store lock poisoned".to_string()))?;
        items.insert(key.to_string(), value);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// =========================================================================
// File adapter
// =========================================================================

/// One pretty-printed JSON file per key, written atomically under a lock.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    lock_timeout_ms: u64,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
        }
    }

    /// Path of the document for `key`
    pub fn item_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Path of the lock guarding `key`
    pub fn lock_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.lock"))
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|err| Error::Persistence(format!("storage task failed: {err}")))?
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get_item(&self, key: &str) -> Result<Option<Value>> {
        validate_key(key)?;
        let path = self.item_path(key);
        let lock_path = self.lock_path(key);
        let timeout = self.lock_timeout_ms;

        let data = run_blocking(move || lock::read_locked(&path, &lock_path, timeout)).await?;
        match data {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn set_item(&self, key: &str, value: Value) -> Result<()> {
        validate_key(key)?;
        let path = self.item_path(key);
        let lock_path = self.lock_path(key);
        let timeout = self.lock_timeout_ms;
        let json = serde_json::to_vec_pretty(&value)?;

        run_blocking(move || lock::write_atomic_locked(&path, &lock_path, &json, timeout)).await
    }
}
