use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde_json::{Map, Value};

use crate::StoreError;

/// Structured key-value backend.
///
/// Calls are independent: nothing spans two writes, so callers doing
/// read-modify-write must accept interleaving with other writers.
#[allow(async_fn_in_trait)]
pub trait KvStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;
    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;
    async fn exists(&self, key: &str) -> Result<bool, StoreError>;
}

/// In-process backend.
#[derive(Debug, Default)]
pub struct MemoryKv {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops a key, simulating eviction on the backend side.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.lock().remove(key)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Value>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KvStore for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.lock().insert(key.to_owned(), value);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.lock().contains_key(key))
    }
}

/// Whole key space kept as one JSON object on disk, so separate processes
/// can continue the same games.
///
/// Every call holds an exclusive lock on a `.lock` file next to the store
/// for its whole read-modify-write, so writers to different keys never drop
/// each other's entries, across instances and processes alike.
#[derive(Debug, Clone)]
pub struct FileKv {
    path: PathBuf,
}

impl FileKv {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Runs `apply` on the loaded entries under the store lock and writes
    /// them back when it reports a change.
    async fn locked<T, F>(&self, apply: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Map<String, Value>) -> (T, bool) + Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || -> Result<T, StoreError> {
            let lock = OpenOptions::new()
                .create(true)
                .truncate(false)
                .write(true)
                .open(path.with_extension("lock"))?;
            lock.lock()?;

            let mut entries = load(&path)?;
            let (output, dirty) = apply(&mut entries);
            if dirty {
                save(&path, &entries)?;
            }
            Ok(output)
        })
        .await
        .map_err(|err| StoreError::Backend {
            key: self.path.display().to_string(),
            message: err.to_string(),
        })?
    }
}

fn load(path: &Path) -> Result<Map<String, Value>, StoreError> {
    match fs::read(path) {
        Ok(bytes) if bytes.is_empty() => Ok(Map::new()),
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            log::debug!("store file {} does not exist yet", path.display());
            Ok(Map::new())
        }
        Err(err) => Err(err.into()),
    }
}

/// Write-then-rename, so readers never see a partial file.
fn save(path: &Path, entries: &Map<String, Value>) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec(entries)?;
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

impl KvStore for FileKv {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let key = key.to_owned();
        self.locked(move |entries| (entries.remove(&key), false)).await
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let key = key.to_owned();
        self.locked(move |entries| {
            entries.insert(key, value);
            ((), true)
        })
        .await
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let key = key.to_owned();
        self.locked(move |entries| (entries.contains_key(&key), false)).await
    }
}
