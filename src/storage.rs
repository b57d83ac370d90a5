//! Durable key-value storage with change notification
//!
//! Every context talks to preferences through a [`KeyValueStore`]. A store
//! holds JSON values under string keys, and after each successful `set` it
//! delivers a [`StorageChange`] to every subscribed listener. Changes carry a
//! monotonically increasing revision and are delivered in commit order.
//!
//! Listeners run on the committing thread while the store's commit lock is
//! held, so a listener must not call `set` on the same store.
//!
//! # Example
//!
//! ```rust
//! use appstore_switcher::{KeyValueStore, MemoryStore, StorageChange};
//! use std::sync::{Arc, Mutex};
//!
//! let store = MemoryStore::new();
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&seen);
//! let _subscription = store.subscribe(Box::new(move |change: &StorageChange| {
//!     sink.lock().unwrap().push(change.key.clone());
//! }));
//!
//! store.set("theme", serde_json::json!("dark"))?;
//! assert_eq!(*seen.lock().unwrap(), vec!["theme".to_string()]);
//! # Ok::<(), appstore_switcher::Error>(())
//! ```

use crate::error::{Error, Result};
use crate::hub::ListenerHub;
pub use crate::hub::Subscription;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A committed change to one key
#[derive(Debug, Clone, PartialEq)]
pub struct StorageChange {
    pub key: String,
    pub old_value: Option<Value>,
    pub new_value: Value,
    /// Commit sequence number within this store
    pub revision: u64,
}

/// Callback invoked for every committed change
pub type ChangeListener = Box<dyn Fn(&StorageChange) + Send + Sync>;

/// Durable key-value storage shared by all contexts
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Store `value` under `key`, notify listeners and return the commit
    /// revision
    fn set(&self, key: &str, value: Value) -> Result<u64>;

    /// Register a change listener; dropping the handle unsubscribes
    fn subscribe(&self, listener: ChangeListener) -> Subscription;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: Value) -> Result<u64> {
        (**self).set(key, value)
    }

    fn subscribe(&self, listener: ChangeListener) -> Subscription {
        (**self).subscribe(listener)
    }
}

/// Process-local store
///
/// Several contexts in one process can share a `MemoryStore` through an
/// `Arc` and observe each other's writes. The store can be marked
/// unavailable to model calls from a context without storage access.
pub struct MemoryStore {
    data: Mutex<HashMap<String, Value>>,
    commit: Mutex<u64>,
    available: AtomicBool,
    hub: ListenerHub<StorageChange>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            data: Mutex::new(HashMap::new()),
            commit: Mutex::new(0),
            available: AtomicBool::new(true),
            hub: ListenerHub::new(),
        }
    }

    /// Make every subsequent call succeed (`true`) or fail with
    /// [`Error::StorageUnavailable`] (`false`)
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn listener_count(&self) -> usize {
        self.hub.listener_count()
    }

    fn ensure_available(&self) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::StorageUnavailable(
                "storage is not available in this context".to_string(),
            ))
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        self.ensure_available()?;
        Ok(self.data.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<u64> {
        self.ensure_available()?;
        let mut revision = self.commit.lock();
        *revision += 1;
        let old_value = self.data.lock().insert(key.to_string(), value.clone());
        let change = StorageChange {
            key: key.to_string(),
            old_value,
            new_value: value,
            revision: *revision,
        };
        tracing::debug!(key, revision = change.revision, "dispatching storage change");
        self.hub.emit(&change);
        Ok(*revision)
    }

    fn subscribe(&self, listener: ChangeListener) -> Subscription {
        self.hub.subscribe_boxed(listener)
    }
}

/// Store persisted as one JSON object in a file
///
/// Writes replace the file atomically through a temporary file in the same
/// directory. Notifications reach listeners subscribed through this
/// instance only.
pub struct JsonFileStore {
    path: PathBuf,
    commit: Mutex<u64>,
    hub: ListenerHub<StorageChange>,
}

impl JsonFileStore {
    /// Open (or lazily create) the store at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            commit: Mutex::new(0),
            hub: ListenerHub::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn unavailable(&self, what: &str, err: impl std::fmt::Display) -> Error {
        Error::StorageUnavailable(format!("{} {}: {}", what, self.path.display(), err))
    }

    fn load(&self) -> Result<Map<String, Value>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(self.unavailable("failed to read", e)),
        };
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(self.unavailable("expected a JSON object in", "wrong shape")),
            Err(e) => Err(self.unavailable("failed to parse", e)),
        }
    }

    fn persist(&self, map: &Map<String, Value>) -> Result<()> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| self.unavailable("failed to create directory for", e))?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)
            .map_err(|e| self.unavailable("failed to stage write for", e))?;
        let json = serde_json::to_string_pretty(map)?;
        tmp.write_all(json.as_bytes())
            .and_then(|_| tmp.flush())
            .map_err(|e| self.unavailable("failed to write", e))?;
        tmp.persist(&self.path)
            .map_err(|e| self.unavailable("failed to replace", e.error))?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.load()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<u64> {
        let mut revision = self.commit.lock();
        let mut map = self.load()?;
        let old_value = map.insert(key.to_string(), value.clone());
        self.persist(&map)?;
        *revision += 1;
        let change = StorageChange {
            key: key.to_string(),
            old_value,
            new_value: value,
            revision: *revision,
        };
        tracing::debug!(
            path = %self.path.display(),
            key,
            revision = change.revision,
            "persisted storage file"
        );
        self.hub.emit(&change);
        Ok(*revision)
    }

    fn subscribe(&self, listener: ChangeListener) -> Subscription {
        self.hub.subscribe_boxed(listener)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store_get_set() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        assert_eq!(store.set("k", json!(1)).unwrap(), 1);
        assert_eq!(store.set("k", json!(2)).unwrap(), 2);
        assert_eq!(store.get("k").unwrap(), Some(json!(2)));
    }

    #[test]
    fn test_memory_store_unavailable() {
        let store = MemoryStore::new();
        store.set_available(false);
        assert!(matches!(store.get("k"), Err(Error::StorageUnavailable(_))));
        assert!(matches!(store.set("k", json!(1)), Err(Error::StorageUnavailable(_))));
    }

    #[test]
    fn test_changes_delivered_in_commit_order() {
        let store = MemoryStore::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = store.subscribe(Box::new(move |change: &StorageChange| {
            sink.lock().push((change.revision, change.old_value.clone(), change.new_value.clone()));
        }));

        store.set("k", json!("a")).unwrap();
        store.set("k", json!("b")).unwrap();

        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], (1, None, json!("a")));
        assert_eq!(seen[1], (2, Some(json!("a")), json!("b")));
    }

    #[test]
    fn test_unsubscribe_and_drop_detach() {
        let store = MemoryStore::new();
        let first = store.subscribe(Box::new(|_: &StorageChange| {}));
        let second = store.subscribe(Box::new(|_: &StorageChange| {}));
        assert_eq!(store.listener_count(), 2);

        first.unsubscribe();
        assert_eq!(store.listener_count(), 1);

        drop(second);
        assert_eq!(store.listener_count(), 0);
    }

    #[test]
    fn test_json_file_store_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("storage.json");

        let store = JsonFileStore::new(&path);
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", json!({ "a": true })).unwrap();
        store.set("other", json!(3)).unwrap();

        let reopened = JsonFileStore::new(&path);
        assert_eq!(reopened.get("k").unwrap(), Some(json!({ "a": true })));
        assert_eq!(reopened.get("other").unwrap(), Some(json!(3)));
    }

    #[test]
    fn test_json_file_store_corrupt_file_is_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("storage.json");
        fs::write(&path, "{ not json").unwrap();

        let store = JsonFileStore::new(&path);
        assert!(matches!(store.get("k"), Err(Error::StorageUnavailable(_))));
        assert!(matches!(store.set("k", json!(1)), Err(Error::StorageUnavailable(_))));
        // the corrupt file is left untouched
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
    }
}
