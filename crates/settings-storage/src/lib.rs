//! Settings storage for the fieldTask registration client.
//!
//! A small key-value store standing in for the mobile client's shared
//! preferences. It holds the cached cloud credentials, the device identity,
//! the current push token, and the server/user context.
//!
//! - **[`JsonFileStorage`]**: a JSON object on disk, rewritten atomically.
//! - **[`MemoryStorage`]**: process-local map for tests and ephemeral runs.

mod file;
mod keys;
mod memory;
mod traits;

pub use file::JsonFileStorage;
pub use keys::SettingsKeys;
pub use memory::MemoryStorage;
pub use traits::SettingsStorage;

use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Error type for settings operations.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Encoding/decoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for settings operations.
pub type SettingsResult<T> = Result<T, SettingsError>;

/// Open the file-backed settings store at `path`.
pub fn open_settings(path: &Path) -> SettingsResult<Arc<dyn SettingsStorage>> {
    let storage = JsonFileStorage::open(path)?;
    Ok(Arc::new(storage))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_trait_defaults() {
        let storage = MemoryStorage::new();

        storage.set("test_key", "test_value").unwrap();
        assert_eq!(storage.get("test_key").unwrap(), Some("test_value".to_string()));
        assert!(storage.has("test_key").unwrap());
        assert!(!storage.has("nonexistent").unwrap());

        assert!(storage.delete("test_key").unwrap());
        assert!(!storage.delete("test_key").unwrap());
        assert_eq!(storage.get("test_key").unwrap(), None);
    }

    #[test]
    fn test_open_settings_returns_shared_handle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let settings = open_settings(&path).unwrap();
        settings.set(SettingsKeys::USERNAME, "enumerator").unwrap();

        let reopened = open_settings(&path).unwrap();
        assert_eq!(
            reopened.get(SettingsKeys::USERNAME).unwrap(),
            Some("enumerator".to_string())
        );
    }

    #[test]
    fn test_unreadable_settings_path_is_io_error() {
        let dir = tempfile::tempdir().unwrap();

        match open_settings(dir.path()) {
            Err(SettingsError::Io(_)) => {}
            Err(SettingsError::Encoding(msg)) => panic!("expected IO error, got encoding: {msg}"),
            Ok(_) => panic!("a directory is not a settings file"),
        }
    }

    #[test]
    fn test_settings_keys_unique() {
        let keys = [
            SettingsKeys::AWS_ACCESS_KEY,
            SettingsKeys::AWS_SECRET_KEY,
            SettingsKeys::AWS_SESSION_TOKEN,
            SettingsKeys::AWS_EXPIRATION,
            SettingsKeys::AWS_IDENTITY_ID,
            SettingsKeys::REGISTRATION_ID,
            SettingsKeys::SERVER_URL,
            SettingsKeys::USERNAME,
        ];
        let unique: std::collections::HashSet<_> = keys.iter().collect();
        assert_eq!(unique.len(), keys.len(), "Settings keys must be unique");
        assert!(keys.iter().all(|k| !k.is_empty()));
    }
}
