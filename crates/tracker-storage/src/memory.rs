//! In-memory key-value storage.

use crate::{KeyValueStore, StorageError, StorageResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// In-process store backed by a map.
///
/// Used by tests and as an opt-out backend when nothing should touch disk.
/// Values do not survive a restart.
pub struct MemoryStore {
    data: Mutex<HashMap<String, String>>,
    writable: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            data: Mutex::new(HashMap::new()),
            writable: AtomicBool::new(true),
        }
    }

    /// Create a store that rejects every write, for exercising the
    /// unavailable-storage path.
    pub fn read_only() -> Self {
        Self {
            data: Mutex::new(HashMap::new()),
            writable: AtomicBool::new(false),
        }
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.data.lock().expect("store lock poisoned").len()
    }

    /// Whether the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for MemoryStore {
    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        if !self.writable.load(Ordering::Relaxed) {
            return Err(StorageError::Backend("store is read-only".to_string()));
        }
        let mut data = self.data.lock().expect("store lock poisoned");
        data.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let data = self.data.lock().expect("store lock poisoned");
        Ok(data.get(key).cloned())
    }

    fn delete(&self, key: &str) -> StorageResult<bool> {
        let mut data = self.data.lock().expect("store lock poisoned");
        Ok(data.remove(key).is_some())
    }
}
