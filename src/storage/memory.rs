//! In-memory storage backend.

use super::Storage;
use crate::error::Result;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Storage backed by a map in process memory.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate `key`. Useful to simulate state left by a previous run.
    pub fn with_item(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.items.write().insert(key.into(), value.into());
        self
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.read().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: String) -> Result<()> {
        self.items.write().insert(key.to_string(), value);
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.items.write().remove(key);
        Ok(())
    }
}
