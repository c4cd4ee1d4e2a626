//! Key-value storage for session data.
//!
//! Every [`Storage`] operation is infallible. A backend which can't reach its
//! medium degrades to memory instead of failing, so the session logic never
//! has to deal with storage errors.

use serde_derive::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    io,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard,
    },
};

/// A string-to-string store, the equivalent of a browser's storage scope.
pub trait Storage: Send + Sync {
    fn save(&self, key: &str, value: &str);
    fn read(&self, key: &str) -> Option<String>;
    fn remove(&self, key: &str);
}

/// Which storage scope session data lives in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "lowercase")]
pub enum StorageScope {
    /// Kept in memory and forgotten when the process exits.
    Session,
    /// Written to a file so the session survives restarts.
    Persistent { path: PathBuf },
}

impl StorageScope {
    pub fn open(&self) -> Arc<dyn Storage> {
        match self {
            StorageScope::Session => Arc::new(MemoryStorage::default()),
            StorageScope::Persistent { path } => {
                Arc::new(FileStorage::open(path))
            },
        }
    }
}

impl Default for StorageScope {
    fn default() -> Self { StorageScope::Session }
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    fn values(&self) -> MutexGuard<'_, HashMap<String, String>> {
        lock(&self.values)
    }
}

impl Storage for MemoryStorage {
    fn save(&self, key: &str, value: &str) {
        self.values().insert(key.to_string(), value.to_string());
    }

    fn read(&self, key: &str) -> Option<String> {
        self.values().get(key).cloned()
    }

    fn remove(&self, key: &str) { self.values().remove(key); }
}

/// A JSON file holding a single object of string values.
///
/// The whole file is read once on open and rewritten after every mutation.
/// If a write fails the storage switches to memory-only mode for the rest
/// of its life.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    values: Mutex<HashMap<String, String>>,
    degraded: AtomicBool,
}

impl FileStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();

        let values = match load(&path) {
            Ok(values) => values,
            Err(e) if e.kind() == io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                log::warn!(
                    "Unable to read \"{}\", starting with empty storage: {}",
                    path.display(),
                    e
                );
                HashMap::new()
            },
        };

        FileStorage {
            path,
            values: Mutex::new(values),
            degraded: AtomicBool::new(false),
        }
    }

    pub fn path(&self) -> &Path { &self.path }

    /// Has a failed write forced this storage back to memory?
    pub fn is_degraded(&self) -> bool { self.degraded.load(Ordering::SeqCst) }

    fn flush(&self, values: &HashMap<String, String>) {
        if self.is_degraded() {
            return;
        }

        if let Err(e) = store(&self.path, values) {
            log::warn!(
                "Unable to write \"{}\", falling back to in-memory storage: {}",
                self.path.display(),
                e
            );
            self.degraded.store(true, Ordering::SeqCst);
        }
    }
}

impl Storage for FileStorage {
    fn save(&self, key: &str, value: &str) {
        let mut values = lock(&self.values);
        values.insert(key.to_string(), value.to_string());
        self.flush(&values);
    }

    fn read(&self, key: &str) -> Option<String> {
        lock(&self.values).get(key).cloned()
    }

    fn remove(&self, key: &str) {
        let mut values = lock(&self.values);
        if values.remove(key).is_some() {
            self.flush(&values);
        }
    }
}

fn load(path: &Path) -> io::Result<HashMap<String, String>> {
    let raw = fs::read(path)?;
    serde_json::from_slice(&raw)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

fn store(path: &Path, values: &HashMap<String, String>) -> io::Result<()> {
    let raw = serde_json::to_vec_pretty(values)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    fs::write(path, raw)
}

// A panic while holding the lock can't leave a HashMap half-updated, so
// poisoning is safe to ignore.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
