//! Key-value store abstraction with JSON-file and in-memory backends.

use std::path::{Path, PathBuf};

use linker_core::{Error, Result};
use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Whole-value key-value store.
///
/// There is no partial update: `set` replaces the value stored under a key.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>>;
    fn set(&self, key: &str, value: Value) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Typed helpers over any [`KvStore`].
pub trait KvStoreExt: KvStore {
    /// Read and deserialize a key. A stored `null` reads as absent.
    fn get_typed<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key)? {
            None | Some(Value::Null) => Ok(None),
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
        }
    }

    fn set_typed<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.set(key, serde_json::to_value(value)?)
    }
}

impl<S: KvStore + ?Sized> KvStoreExt for S {}

/// Store persisted as one JSON object on disk.
///
/// The file is the only copy: every read loads it and every write re-reads
/// it, replaces the one key, and renames a fresh file into place. Several
/// processes may share the file; keys written by one survive writes to other
/// keys by another. Two writers of the same key race, last writer wins.
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open (or lazily create) the store at `path`.
    pub fn open(path: &Path) -> Self {
        debug!(
            "JsonFileStore: {} keys in {}",
            load_values(path).len(),
            path.display()
        );
        Self {
            path: path.to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `change` to the current on-disk contents and write the result.
    /// Nothing is written when `change` reports no modification.
    fn update(&self, change: impl FnOnce(&mut Map<String, Value>) -> bool) -> Result<()> {
        let _guard = self.write_lock.lock();
        let mut values = load_values(&self.path);
        if change(&mut values) {
            self.save(&values)?;
        }
        Ok(())
    }

    fn save(&self, values: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(values)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, data)
            .and_then(|_| std::fs::rename(&tmp, &self.path))
            .map_err(|e| {
                let _ = std::fs::remove_file(&tmp);
                Error::Storage(format!("{}: {}", self.path.display(), e))
            })
    }
}

impl KvStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(load_values(&self.path).remove(key))
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        self.update(|values| {
            values.insert(key.to_string(), value);
            true
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|values| values.remove(key).is_some())
    }
}

fn load_values(path: &Path) -> Map<String, Value> {
    match std::fs::read_to_string(path) {
        Ok(data) => match serde_json::from_str(&data) {
            Ok(values) => values,
            Err(e) => {
                warn!("Ignoring unreadable store {}: {}", path.display(), e);
                Map::new()
            }
        },
        Err(_) => Map::new(),
    }
}

/// Volatile store, used in tests and when no data directory is available.
#[derive(Default)]
pub struct MemoryStore {
    values: RwLock<Map<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        self.values.write().insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values.write().remove(key);
        Ok(())
    }
}
