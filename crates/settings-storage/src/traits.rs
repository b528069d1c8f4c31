//! Storage trait definitions.

use crate::SettingsResult;

/// Trait for key-value settings backends.
pub trait SettingsStorage: Send + Sync {
    /// Store a value
    fn set(&self, key: &str, value: &str) -> SettingsResult<()>;

    /// Retrieve a value
    fn get(&self, key: &str) -> SettingsResult<Option<String>>;

    /// Delete a value. Returns whether a value was present.
    fn delete(&self, key: &str) -> SettingsResult<bool>;

    /// Check if a key exists
    fn has(&self, key: &str) -> SettingsResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Store several values in one write.
    /// Backends that persist to disk override this to avoid a rewrite per key.
    fn set_many(&self, entries: &[(&str, &str)]) -> SettingsResult<()> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }

    /// Delete several keys in one write.
    fn delete_many(&self, keys: &[&str]) -> SettingsResult<()> {
        for key in keys {
            self.delete(key)?;
        }
        Ok(())
    }
}
