//! Device registration repository: validation, retry and logging around a [`DeviceStore`].

use crate::record::token_prefix;
use crate::{DeviceRecord, DeviceStore, RegistryResult};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Retry settings for saves.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles for each attempt after that.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Delay after failed attempt number `attempt` (1-based): base * 2^(attempt-1).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

/// Persists device registrations to the remote table.
pub struct DeviceRepository {
    store: Arc<dyn DeviceStore>,
    retry: RetryPolicy,
}

impl DeviceRepository {
    pub fn new(store: Arc<dyn DeviceStore>) -> Self {
        Self::with_retry_policy(store, RetryPolicy::default())
    }

    pub fn with_retry_policy(store: Arc<dyn DeviceStore>, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    /// Save a registration, retrying transient failures with exponential backoff.
    ///
    /// Blank fields are rejected before any remote call. On exhaustion the
    /// last error is returned.
    pub async fn save(&self, record: &DeviceRecord) -> RegistryResult<()> {
        record.validate()?;

        let token = token_prefix(&record.token);
        info!(
            token_prefix = %token,
            server = %record.server_url,
            username = %record.username,
            "Saving device registration"
        );

        let mut attempt = 0;
        loop {
            attempt += 1;

            match self.store.put(record).await {
                Ok(()) => {
                    info!(token_prefix = %token, attempt, "Device registration saved");
                    return Ok(());
                }
                Err(e) if !e.is_transient() => {
                    error!(token_prefix = %token, attempt, error = %e, "Device registration rejected");
                    return Err(e);
                }
                Err(e) => {
                    if attempt >= self.retry.max_attempts {
                        error!(
                            token_prefix = %token,
                            attempt,
                            error = %e,
                            "Device registration failed, max attempts reached"
                        );
                        return Err(e);
                    }

                    let delay = self.retry.delay_after(attempt);
                    warn!(
                        token_prefix = %token,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Device registration failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Look up the registration for `token`. Single attempt.
    pub async fn get(&self, token: &str) -> RegistryResult<Option<DeviceRecord>> {
        debug!(token_prefix = %token_prefix(token), "Looking up device registration");
        match self.store.get(token).await {
            Ok(Some(record)) => {
                debug!(token_prefix = %token_prefix(token), server = %record.server_url, "Device registration found");
                Ok(Some(record))
            }
            Ok(None) => {
                debug!(token_prefix = %token_prefix(token), "No device registration");
                Ok(None)
            }
            Err(e) => {
                error!(token_prefix = %token_prefix(token), error = %e, "Device registration lookup failed");
                Err(e)
            }
        }
    }

    /// Delete the registration for `token`; an absent record is not an error.
    pub async fn delete(&self, token: &str) -> RegistryResult<()> {
        if self.get(token).await?.is_none() {
            debug!(token_prefix = %token_prefix(token), "Nothing to delete");
            return Ok(());
        }

        match self.store.delete(token).await {
            Ok(()) => {
                info!(token_prefix = %token_prefix(token), "Device registration deleted");
                Ok(())
            }
            Err(e) => {
                error!(token_prefix = %token_prefix(token), error = %e, "Device registration delete failed");
                Err(e)
            }
        }
    }
}
