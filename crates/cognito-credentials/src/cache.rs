//! Memory-first credential cache backed by settings storage.

use crate::SessionCredentials;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use settings_storage::{SettingsKeys, SettingsResult, SettingsStorage};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Default)]
struct CacheState {
    credentials: Option<SessionCredentials>,
    identity_id: Option<String>,
}

/// Thread-safe cache for Cognito credentials and the device identity id.
///
/// Memory is authoritative; settings storage is only read when memory is
/// empty (e.g. after a restart) and only written after memory was updated.
pub struct CredentialsCache {
    storage: Arc<dyn SettingsStorage>,
    state: RwLock<CacheState>,
    /// Set when a clear reached memory but not storage; stops the old record
    /// from being reloaded until a new one is cached.
    reload_blocked: AtomicBool,
}

impl CredentialsCache {
    pub fn new(storage: Arc<dyn SettingsStorage>) -> Self {
        Self {
            storage,
            state: RwLock::new(CacheState::default()),
            reload_blocked: AtomicBool::new(false),
        }
    }

    /// Cached credentials if present and not expired.
    pub fn get_credentials(&self) -> Option<SessionCredentials> {
        self.get_credentials_at(Utc::now())
    }

    /// Cached credentials if present and not expired at `now`.
    pub fn get_credentials_at(&self, now: DateTime<Utc>) -> Option<SessionCredentials> {
        let credentials = self.stale_credentials()?;
        if credentials.is_expired_at(now) {
            debug!(expiration = %credentials.expiration, "Cached credentials expired");
            return None;
        }
        Some(credentials)
    }

    /// Cached credentials regardless of expiry. Last-resort fallback.
    pub fn stale_credentials(&self) -> Option<SessionCredentials> {
        if let Some(credentials) = self.state.read().credentials.clone() {
            return Some(credentials);
        }
        self.load_from_storage();
        self.state.read().credentials.clone()
    }

    /// Whether the cache holds no usable credentials right now.
    pub fn is_expired(&self) -> bool {
        self.get_credentials().is_none()
    }

    /// Replace the cached record and persist it.
    ///
    /// Memory is updated first; a storage failure is returned but the new
    /// record is still served from memory.
    pub fn cache_credentials(&self, credentials: SessionCredentials) -> SettingsResult<()> {
        debug!(
            expiration = %credentials.expiration,
            identity_id = %credentials.identity_id,
            "Caching AWS credentials"
        );

        let expiration_ms = credentials.expiration.timestamp_millis().to_string();
        let entries = [
            (SettingsKeys::AWS_ACCESS_KEY, credentials.access_key_id.clone()),
            (SettingsKeys::AWS_SECRET_KEY, credentials.secret_access_key.clone()),
            (SettingsKeys::AWS_SESSION_TOKEN, credentials.session_token.clone()),
            (SettingsKeys::AWS_EXPIRATION, expiration_ms),
            (SettingsKeys::AWS_IDENTITY_ID, credentials.identity_id.clone()),
        ];

        {
            let mut state = self.state.write();
            state.identity_id = Some(credentials.identity_id.clone());
            state.credentials = Some(credentials);
        }

        let borrowed: Vec<(&str, &str)> = entries
            .iter()
            .map(|(key, value)| (*key, value.as_str()))
            .collect();
        self.storage.set_many(&borrowed)?;
        self.reload_blocked.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Cached identity id (memory, then storage).
    pub fn identity_id(&self) -> Option<String> {
        if let Some(identity_id) = self.state.read().identity_id.clone() {
            return Some(identity_id);
        }
        self.load_from_storage();
        self.state.read().identity_id.clone()
    }

    /// Cache an identity id obtained before any credentials were issued.
    pub fn set_identity_id(&self, identity_id: &str) -> SettingsResult<()> {
        self.state.write().identity_id = Some(identity_id.to_string());
        self.storage.set(SettingsKeys::AWS_IDENTITY_ID, identity_id)
    }

    /// Clear all cached credentials and the identity id.
    ///
    /// Memory is always cleared. If the persisted copy cannot be deleted the
    /// error is returned and the old record is never reloaded from settings.
    pub fn clear(&self) -> SettingsResult<()> {
        debug!("Clearing cached AWS credentials");
        {
            let mut state = self.state.write();
            state.credentials = None;
            state.identity_id = None;
        }
        if let Err(e) = self.storage.delete_many(&SettingsKeys::CREDENTIAL_KEYS) {
            self.reload_blocked.store(true, Ordering::SeqCst);
            return Err(e);
        }
        Ok(())
    }

    /// Populate empty memory slots from settings storage.
    fn load_from_storage(&self) {
        if self.reload_blocked.load(Ordering::SeqCst) {
            return;
        }
        let loaded = match self.read_persisted() {
            Ok(loaded) => loaded,
            Err(e) => {
                warn!(error = %e, "Failed to read cached credentials from settings");
                return;
            }
        };

        let mut state = self.state.write();
        if state.identity_id.is_none() {
            state.identity_id = loaded.identity_id;
        }
        if state.credentials.is_none() {
            if let Some(credentials) = loaded.credentials {
                debug!("Loaded cached credentials from settings");
                state.credentials = Some(credentials);
            }
        }
    }

    fn read_persisted(&self) -> SettingsResult<CacheState> {
        let identity_id = self.storage.get(SettingsKeys::AWS_IDENTITY_ID)?;
        let access_key = self.storage.get(SettingsKeys::AWS_ACCESS_KEY)?;
        let secret_key = self.storage.get(SettingsKeys::AWS_SECRET_KEY)?;
        let session_token = self.storage.get(SettingsKeys::AWS_SESSION_TOKEN)?;
        let expiration = self
            .storage
            .get(SettingsKeys::AWS_EXPIRATION)?
            .and_then(|raw| raw.parse::<i64>().ok())
            .filter(|millis| *millis > 0)
            .and_then(DateTime::<Utc>::from_timestamp_millis);

        let credentials = match (access_key, secret_key, session_token, expiration) {
            (Some(access), Some(secret), Some(token), Some(expiration)) => {
                Some(SessionCredentials::new(
                    access,
                    secret,
                    token,
                    expiration,
                    identity_id.clone().unwrap_or_default(),
                ))
            }
            _ => {
                debug!("No complete credential record in settings");
                None
            }
        };

        Ok(CacheState {
            credentials,
            identity_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use settings_storage::{MemoryStorage, SettingsError};

    /// Memory storage whose deletes always fail.
    #[derive(Default)]
    struct FailingDeleteStorage {
        inner: MemoryStorage,
    }

    impl SettingsStorage for FailingDeleteStorage {
        fn set(&self, key: &str, value: &str) -> SettingsResult<()> {
            self.inner.set(key, value)
        }

        fn get(&self, key: &str) -> SettingsResult<Option<String>> {
            self.inner.get(key)
        }

        fn delete(&self, _key: &str) -> SettingsResult<bool> {
            Err(SettingsError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only settings",
            )))
        }
    }

    fn storage() -> Arc<MemoryStorage> {
        Arc::new(MemoryStorage::new())
    }

    fn credentials_valid_for(lifetime: Duration) -> SessionCredentials {
        SessionCredentials::new(
            "AKIA1",
            "secret-1",
            "token-1",
            Utc::now() + lifetime,
            "ap-southeast-2:identity-1",
        )
    }

    #[test]
    fn test_empty_cache() {
        let cache = CredentialsCache::new(storage());
        assert!(cache.get_credentials().is_none());
        assert!(cache.stale_credentials().is_none());
        assert!(cache.identity_id().is_none());
        assert!(cache.is_expired());
    }

    #[test]
    fn test_cache_credentials_persists_fixed_keys() {
        let storage = storage();
        let cache = CredentialsCache::new(storage.clone());
        let credentials = credentials_valid_for(Duration::hours(1));

        cache.cache_credentials(credentials.clone()).unwrap();

        assert_eq!(cache.get_credentials(), Some(credentials.clone()));
        assert_eq!(
            storage.get(SettingsKeys::AWS_ACCESS_KEY).unwrap(),
            Some("AKIA1".to_string())
        );
        assert_eq!(
            storage.get(SettingsKeys::AWS_EXPIRATION).unwrap(),
            Some(credentials.expiration.timestamp_millis().to_string())
        );
        assert_eq!(
            storage.get(SettingsKeys::AWS_IDENTITY_ID).unwrap(),
            Some("ap-southeast-2:identity-1".to_string())
        );
    }

    #[test]
    fn test_restart_loads_from_storage() {
        let storage = storage();
        let credentials = credentials_valid_for(Duration::hours(1));
        CredentialsCache::new(storage.clone())
            .cache_credentials(credentials.clone())
            .unwrap();

        let restarted = CredentialsCache::new(storage);
        let loaded = restarted.get_credentials().unwrap();
        assert_eq!(loaded.access_key_id, "AKIA1");
        assert_eq!(loaded.identity_id, "ap-southeast-2:identity-1");
        // Millisecond precision survives the round trip through settings.
        assert_eq!(
            loaded.expiration.timestamp_millis(),
            credentials.expiration.timestamp_millis()
        );
    }

    #[test]
    fn test_expired_credentials_only_served_as_stale() {
        let cache = CredentialsCache::new(storage());
        cache
            .cache_credentials(credentials_valid_for(Duration::minutes(3)))
            .unwrap();

        assert!(cache.get_credentials().is_none());
        assert!(cache.is_expired());
        assert_eq!(cache.stale_credentials().unwrap().access_key_id, "AKIA1");
    }

    #[test]
    fn test_incomplete_persisted_record_is_ignored() {
        let storage = storage();
        storage.set(SettingsKeys::AWS_ACCESS_KEY, "AKIA1").unwrap();
        storage.set(SettingsKeys::AWS_SECRET_KEY, "secret").unwrap();
        storage.set(SettingsKeys::AWS_EXPIRATION, "0").unwrap();
        storage.set(SettingsKeys::AWS_SESSION_TOKEN, "token").unwrap();
        storage.set(SettingsKeys::AWS_IDENTITY_ID, "id-only").unwrap();

        let cache = CredentialsCache::new(storage);
        assert!(cache.stale_credentials().is_none());
        assert_eq!(cache.identity_id(), Some("id-only".to_string()));
    }

    #[test]
    fn test_clear_removes_memory_and_storage() {
        let storage = storage();
        let cache = CredentialsCache::new(storage.clone());
        cache
            .cache_credentials(credentials_valid_for(Duration::hours(1)))
            .unwrap();

        cache.clear().unwrap();

        assert!(cache.get_credentials().is_none());
        assert!(cache.identity_id().is_none());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_failed_storage_clear_does_not_resurrect_identity() {
        let storage = Arc::new(FailingDeleteStorage::default());
        let cache = CredentialsCache::new(storage.clone());
        cache
            .cache_credentials(credentials_valid_for(Duration::hours(1)))
            .unwrap();

        assert!(cache.clear().is_err());

        assert!(cache.identity_id().is_none());
        assert!(cache.stale_credentials().is_none());
        // The old record is still on disk, but stays hidden.
        assert!(storage.inner.get(SettingsKeys::AWS_IDENTITY_ID).unwrap().is_some());

        cache
            .cache_credentials(credentials_valid_for(Duration::hours(2)))
            .unwrap();
        assert_eq!(
            CredentialsCache::new(storage).identity_id(),
            Some("ap-southeast-2:identity-1".to_string())
        );
    }

    #[test]
    fn test_set_identity_id_without_credentials() {
        let storage = storage();
        let cache = CredentialsCache::new(storage.clone());
        cache.set_identity_id("region:fresh").unwrap();

        assert_eq!(cache.identity_id(), Some("region:fresh".to_string()));
        assert!(cache.stale_credentials().is_none());
        assert_eq!(
            CredentialsCache::new(storage).identity_id(),
            Some("region:fresh".to_string())
        );
    }
}
