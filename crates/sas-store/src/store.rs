//! # Key/Value Stores
//!
//! [`MemoryStore`] keeps records in a `parking_lot`-guarded map and is used
//! by tests. [`FileStore`] keeps them in one JSON document on disk, replaced
//! through a rename so a crash mid-write leaves the previous document intact.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::StorageError;

// ─── Traits ──────────────────────────────────────────────────────────

/// A record persisted under a fixed key.
///
/// `Default` supplies the first-boot value returned when nothing is stored.
pub trait PersistedRecord:
    Serialize + DeserializeOwned + Default + Clone + Send + Sync + 'static
{
    /// Storage key of the record.
    const KEY: &'static str;
}

/// Key/value persistence backend.
pub trait PersistentStore: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;

    /// Apply every entry of `batch`, or none of them.
    fn commit(&self, batch: WriteBatch) -> Result<(), StorageError>;
}

/// Entries that must be committed together.
#[derive(Debug, Default, Clone)]
pub struct WriteBatch {
    entries: Vec<(String, Value)>,
}

impl WriteBatch {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a record for commit.
    pub fn stage<T: PersistedRecord>(&mut self, record: &T) -> Result<&mut Self, StorageError> {
        let value = serde_json::to_value(record).map_err(|source| StorageError::Serialization {
            key: T::KEY.to_string(),
            source,
        })?;
        self.entries.push((T::KEY.to_string(), value));
        Ok(self)
    }

    /// Number of staged entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn into_entries(self) -> Vec<(String, Value)> {
        self.entries
    }
}

/// Load a record, or `None` when nothing is stored under its key.
pub fn load_optional_record<T: PersistedRecord>(
    store: &dyn PersistentStore,
) -> Result<Option<T>, StorageError> {
    store
        .get(T::KEY)?
        .map(|value| {
            serde_json::from_value(value).map_err(|source| StorageError::Serialization {
                key: T::KEY.to_string(),
                source,
            })
        })
        .transpose()
}

/// Load a record, falling back to its default when absent.
pub fn load_record<T: PersistedRecord>(store: &dyn PersistentStore) -> Result<T, StorageError> {
    Ok(load_optional_record(store)?.unwrap_or_default())
}

/// Persist a single record.
pub fn save_record<T: PersistedRecord>(
    store: &dyn PersistentStore,
    record: &T,
) -> Result<(), StorageError> {
    let mut batch = WriteBatch::new();
    batch.stage(record)?;
    store.commit(batch)
}

// ─── MemoryStore ─────────────────────────────────────────────────────

/// Thread-safe in-memory store.
///
/// `set_fail_writes(true)` makes every commit fail without touching stored
/// data, for exercising "not saved" paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<BTreeMap<String, Value>>,
    fail_writes: AtomicBool,
    commits: Mutex<u64>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent commits fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful commits.
    pub fn commit_count(&self) -> u64 {
        *self.commits.lock()
    }
}

impl PersistentStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.data.read().get(key).cloned())
    }

    fn commit(&self, batch: WriteBatch) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("writes disabled".to_string()));
        }
        let mut guard = self.data.write();
        for (key, value) in batch.into_entries() {
            guard.insert(key, value);
        }
        *self.commits.lock() += 1;
        Ok(())
    }
}

// ─── FileStore ───────────────────────────────────────────────────────

/// Store backed by a single JSON document.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    /// Open (or lazily create) the document at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Path of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn read_document(&self) -> Result<BTreeMap<String, Value>, StorageError> {
        match std::fs::read(&self.path) {
            Ok(bytes) => {
                serde_json::from_slice(&bytes).map_err(|source| StorageError::Serialization {
                    key: self.path.display().to_string(),
                    source,
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

impl PersistentStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let _guard = self.lock.lock();
        Ok(self.read_document()?.remove(key))
    }

    fn commit(&self, batch: WriteBatch) -> Result<(), StorageError> {
        let _guard = self.lock.lock();
        let mut document = self.read_document()?;
        for (key, value) in batch.into_entries() {
            document.insert(key, value);
        }
        let bytes =
            serde_json::to_vec_pretty(&document).map_err(|source| StorageError::Serialization {
                key: self.path.display().to_string(),
                source,
            })?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, bytes).map_err(|e| self.io_error(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;
        tracing::debug!(path = %self.path.display(), "committed store document");
        Ok(())
    }
}
