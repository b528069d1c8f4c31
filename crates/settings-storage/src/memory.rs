//! In-memory settings backend.

use crate::{SettingsResult, SettingsStorage};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Process-local settings map.
#[derive(Default)]
pub struct MemoryStorage {
    data: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.data.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SettingsStorage for MemoryStorage {
    fn set(&self, key: &str, value: &str) -> SettingsResult<()> {
        self.data.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get(&self, key: &str) -> SettingsResult<Option<String>> {
        Ok(self.data.lock().get(key).cloned())
    }

    fn delete(&self, key: &str) -> SettingsResult<bool> {
        Ok(self.data.lock().remove(key).is_some())
    }
}
