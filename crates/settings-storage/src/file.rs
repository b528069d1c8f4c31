//! JSON file settings backend.

use crate::{SettingsError, SettingsResult, SettingsStorage};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Settings persisted as a flat JSON object of strings.
///
/// The whole map is held in memory and the file is rewritten on every
/// mutation through a sibling temp file and a rename, so a crash never leaves
/// a half-written settings file behind.
pub struct JsonFileStorage {
    path: PathBuf,
    data: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStorage {
    /// Open (or lazily create) the settings file at `path`.
    pub fn open(path: &Path) -> SettingsResult<Self> {
        let data = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content).map_err(|e| {
                    SettingsError::Encoding(format!("{}: {}", path.display(), e))
                })?
            }
        } else {
            BTreeMap::new()
        };

        debug!(path = %path.display(), keys = data.len(), "Opened settings file");

        Ok(Self {
            path: path.to_path_buf(),
            data: Mutex::new(data),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, data: &BTreeMap<String, String>) -> SettingsResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(data)
            .map_err(|e| SettingsError::Encoding(e.to_string()))?;

        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    /// Apply `mutate` to the map and persist; memory is only updated once
    /// the write succeeded.
    fn update<F, T>(&self, mutate: F) -> SettingsResult<T>
    where
        F: FnOnce(&mut BTreeMap<String, String>) -> T,
    {
        let mut guard = self.data.lock();
        let mut next = guard.clone();
        let result = mutate(&mut next);
        if next != *guard {
            self.persist(&next)?;
            *guard = next;
        }
        Ok(result)
    }
}

impl SettingsStorage for JsonFileStorage {
    fn set(&self, key: &str, value: &str) -> SettingsResult<()> {
        debug!(key = %key, "Setting value");
        self.update(|data| {
            data.insert(key.to_string(), value.to_string());
        })
    }

    fn get(&self, key: &str) -> SettingsResult<Option<String>> {
        Ok(self.data.lock().get(key).cloned())
    }

    fn delete(&self, key: &str) -> SettingsResult<bool> {
        debug!(key = %key, "Deleting value");
        self.update(|data| data.remove(key).is_some())
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> SettingsResult<()> {
        self.update(|data| {
            for (key, value) in entries {
                data.insert(key.to_string(), value.to_string());
            }
        })
    }

    fn delete_many(&self, keys: &[&str]) -> SettingsResult<()> {
        self.update(|data| {
            for key in keys {
                data.remove(*key);
            }
        })
    }
}
