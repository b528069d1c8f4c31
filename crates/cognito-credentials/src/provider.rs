//! Cognito credentials provider.
//!
//! Credential state machine:
//!
//! ```text
//! EMPTY -> FETCHING -> VALID -> (time passes) -> EXPIRED -> FETCHING -> VALID
//!                                                                    \-> STALE_FALLBACK
//! ```
//!
//! `STALE_FALLBACK` only lasts for the call that hit it; the next call
//! fetches again.

use crate::error::{CredentialsError, CredentialsResult};
use crate::{CredentialsCache, IdentityBroker, SessionCredentials};
use settings_storage::SettingsStorage;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Provides AWS credentials for unauthenticated (guest) Cognito identities.
///
/// Thread-safe: share it behind an `Arc`. Concurrent refreshes are serialized
/// by an async mutex, and a caller that waited on the mutex reuses the outcome
/// of the exchange it waited on instead of going to the network again.
pub struct CognitoCredentialsProvider {
    broker: Arc<dyn IdentityBroker>,
    cache: CredentialsCache,
    identity_pool_id: String,
    refresh_lock: Mutex<()>,
    /// Completed exchanges, successful or not. Only changes under `refresh_lock`.
    exchanges: AtomicU64,
}

impl CognitoCredentialsProvider {
    pub fn new(
        broker: Arc<dyn IdentityBroker>,
        storage: Arc<dyn SettingsStorage>,
        identity_pool_id: impl Into<String>,
    ) -> Self {
        let identity_pool_id = identity_pool_id.into();
        info!(pool = %identity_pool_id, "Initialized CognitoCredentialsProvider");
        Self {
            broker,
            cache: CredentialsCache::new(storage),
            identity_pool_id,
            refresh_lock: Mutex::new(()),
            exchanges: AtomicU64::new(0),
        }
    }

    pub fn identity_pool_id(&self) -> &str {
        &self.identity_pool_id
    }

    /// Get valid credentials, refreshing from Cognito as needed.
    ///
    /// If the refresh fails and an older record is cached, the older record
    /// is returned (possibly expired) and the failure is only logged.
    pub async fn get_credentials(&self) -> CredentialsResult<SessionCredentials> {
        if let Some(credentials) = self.cache.get_credentials() {
            return Ok(credentials);
        }

        let seen = self.exchanges.load(Ordering::SeqCst);
        let _guard = self.refresh_lock.lock().await;
        if let Some(credentials) = self.cache.get_credentials() {
            debug!("Credentials refreshed by a concurrent caller");
            return Ok(credentials);
        }
        if let Some(stale) = self.outcome_since(seen) {
            return Ok(stale);
        }

        self.fetch_or_fallback().await
    }

    /// Force a refresh from Cognito.
    ///
    /// Callers that queue behind an in-flight refresh reuse its result
    /// instead of starting another exchange, including when it failed.
    pub async fn refresh(&self) -> CredentialsResult<SessionCredentials> {
        let seen = self.exchanges.load(Ordering::SeqCst);
        let _guard = self.refresh_lock.lock().await;

        if self.exchanges.load(Ordering::SeqCst) != seen {
            if let Some(credentials) = self.cache.get_credentials() {
                debug!("Reusing credentials from concurrent refresh");
                return Ok(credentials);
            }
        }
        if let Some(stale) = self.outcome_since(seen) {
            return Ok(stale);
        }

        info!("Force refreshing AWS credentials");
        self.fetch_or_fallback().await
    }

    /// Stale record to serve when an exchange failed while the caller waited.
    /// Caller must hold `refresh_lock`.
    fn outcome_since(&self, seen: u64) -> Option<SessionCredentials> {
        if self.exchanges.load(Ordering::SeqCst) == seen {
            return None;
        }
        let stale = self.cache.stale_credentials()?;
        debug!("Concurrent refresh failed, reusing its stale fallback");
        Some(stale)
    }

    /// Identity id for this device, requesting one from the pool if none is cached.
    pub async fn identity_id(&self) -> CredentialsResult<String> {
        if let Some(identity_id) = self.cache.identity_id() {
            return Ok(identity_id);
        }

        let _guard = self.refresh_lock.lock().await;
        if let Some(identity_id) = self.cache.identity_id() {
            return Ok(identity_id);
        }
        self.request_identity().await
    }

    /// Cached identity id, without touching the network.
    pub fn cached_identity_id(&self) -> Option<String> {
        self.cache.identity_id()
    }

    /// Whether an identity is cached (doesn't guarantee credentials are valid).
    pub fn has_cached_credentials(&self) -> bool {
        self.cache.identity_id().is_some()
    }

    /// Clear all cached credentials and the identity. Call on logout.
    pub fn clear_credentials(&self) -> CredentialsResult<()> {
        info!("Clearing cached AWS credentials and identity");
        self.cache.clear()?;
        Ok(())
    }

    /// Caller must hold `refresh_lock`.
    async fn fetch_or_fallback(&self) -> CredentialsResult<SessionCredentials> {
        // Taken up front: the exchange may replace the cached identity.
        let fallback = self.cache.stale_credentials();
        let result = self.fetch().await;
        self.exchanges.fetch_add(1, Ordering::SeqCst);

        match result {
            Ok(credentials) => Ok(credentials),
            Err(e) => match fallback {
                Some(stale) => {
                    warn!(
                        error = %e,
                        expiration = %stale.expiration,
                        "Credential refresh failed, using stale cached credentials"
                    );
                    Ok(stale)
                }
                None => {
                    error!(error = %e, "Credential refresh failed with nothing cached");
                    Err(e)
                }
            },
        }
    }

    /// Two-step exchange. Caller must hold `refresh_lock`.
    async fn fetch(&self) -> CredentialsResult<SessionCredentials> {
        let identity_id = match self.cache.identity_id() {
            Some(identity_id) => identity_id,
            None => self.request_identity().await?,
        };

        let credentials = match self.broker.get_credentials_for_identity(&identity_id).await {
            Ok(credentials) => credentials,
            Err(e) if e.is_identity_not_found() => {
                warn!(
                    identity_id = %identity_id,
                    "Cached identity unknown to pool, requesting a new one"
                );
                let fresh = self.request_identity().await?;
                self.broker.get_credentials_for_identity(&fresh).await?
            }
            Err(e) => return Err(e),
        };

        if credentials.is_expired() {
            return Err(CredentialsError::NoCredentials(format!(
                "identity service issued credentials expiring at {}",
                credentials.expiration
            )));
        }

        if let Err(e) = self.cache.cache_credentials(credentials.clone()) {
            warn!(error = %e, "Failed to persist AWS credentials; serving from memory");
        }
        info!(
            identity_id = %credentials.identity_id,
            expiration = %credentials.expiration,
            "AWS credentials refreshed"
        );
        Ok(credentials)
    }

    async fn request_identity(&self) -> CredentialsResult<String> {
        let identity_id = self.broker.get_id(&self.identity_pool_id).await?;
        debug!(identity_id = %identity_id, "Obtained Cognito identity");
        if let Err(e) = self.cache.set_identity_id(&identity_id) {
            warn!(error = %e, "Failed to persist Cognito identity id");
        }
        Ok(identity_id)
    }
}
