//! Push-token lifecycle: persisting new tokens and re-registering the device.

use crate::record::token_prefix;
use crate::{DeviceRegistrationService, RegistryResult};
use settings_storage::{SettingsKeys, SettingsStorage};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

const BANNER: &str = "==================================================";

/// Keeps the remote registration in step with the device's push token and
/// signed-in context.
#[derive(Clone)]
pub struct MessagingRegistrar {
    service: DeviceRegistrationService,
    settings: Arc<dyn SettingsStorage>,
}

impl MessagingRegistrar {
    pub fn new(service: DeviceRegistrationService, settings: Arc<dyn SettingsStorage>) -> Self {
        Self { service, settings }
    }

    /// Handle a token issued by the push service.
    ///
    /// The token is stored first so a failed registration can be retried later
    /// with [`update_server_registration`](Self::update_server_registration).
    pub async fn on_new_token(&self, token: &str) -> RegistryResult<()> {
        info!(token_prefix = %token_prefix(token), "New push token received");
        self.settings.set(SettingsKeys::REGISTRATION_ID, token)?;
        self.update_server_registration().await
    }

    /// Re-register using the stored token, server url and username.
    ///
    /// Missing context is not an error: the device is registered once the
    /// user signs in.
    pub async fn update_server_registration(&self) -> RegistryResult<()> {
        let token = self.non_blank(SettingsKeys::REGISTRATION_ID)?;
        let server_url = self.non_blank(SettingsKeys::SERVER_URL)?;
        let username = self.non_blank(SettingsKeys::USERNAME)?;

        match (token, server_url, username) {
            (Some(token), Some(server_url), Some(username)) => {
                self.register(&token, &server_url, &username).await
            }
            (token, server_url, username) => {
                info!(
                    has_token = token.is_some(),
                    has_server = server_url.is_some(),
                    has_username = username.is_some(),
                    "Registration context incomplete, skipping server registration"
                );
                Ok(())
            }
        }
    }

    /// Register and wait for the outcome.
    pub async fn register(&self, token: &str, server_url: &str, username: &str) -> RegistryResult<()> {
        info!("{} Notifying server of messaging update", BANNER);
        info!(token_prefix = %token_prefix(token), server = %server_url, username = %username, "Messaging registration");

        match self.service.register_device(token, server_url, username).await {
            Ok(()) => {
                info!("{} Notifying server of messaging update done", BANNER);
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Failed to register device for messaging");
                Err(e)
            }
        }
    }

    /// Register in the background; failures are only logged.
    ///
    /// Must be called from within a tokio runtime.
    pub fn execute(&self, token: &str, server_url: &str, username: &str) -> JoinHandle<()> {
        let registrar = self.clone();
        let token = token.to_string();
        let server_url = server_url.to_string();
        let username = username.to_string();

        tokio::spawn(async move {
            if let Err(e) = registrar.register(&token, &server_url, &username).await {
                warn!(error = %e, "Background messaging registration failed");
            }
        })
    }

    fn non_blank(&self, key: &str) -> RegistryResult<Option<String>> {
        Ok(self
            .settings
            .get(key)?
            .filter(|value| !value.trim().is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::tests::{throttled, FakeStore};
    use crate::{DeviceRecord, DeviceRepository, RegistryError, RetryPolicy};
    use settings_storage::MemoryStorage;
    use std::time::Duration;

    fn registrar() -> (MessagingRegistrar, Arc<FakeStore>, Arc<MemoryStorage>) {
        let store = Arc::new(FakeStore::default());
        let repository = Arc::new(DeviceRepository::with_retry_policy(
            store.clone(),
            RetryPolicy {
                max_attempts: 2,
                base_delay: Duration::from_millis(10),
            },
        ));
        let settings = Arc::new(MemoryStorage::new());
        let registrar = MessagingRegistrar::new(
            DeviceRegistrationService::new(repository),
            settings.clone(),
        );
        (registrar, store, settings)
    }

    #[tokio::test]
    async fn test_new_token_is_stored_and_registered() {
        let (registrar, store, settings) = registrar();
        settings
            .set(SettingsKeys::SERVER_URL, "https://sg.smap.com.au")
            .unwrap();
        settings.set(SettingsKeys::USERNAME, "neil").unwrap();

        registrar.on_new_token("fcm-new").await.unwrap();

        assert_eq!(
            settings.get(SettingsKeys::REGISTRATION_ID).unwrap(),
            Some("fcm-new".to_string())
        );
        assert_eq!(
            store.records.lock().get("fcm-new"),
            Some(&DeviceRecord::new("fcm-new", "https://sg.smap.com.au", "neil"))
        );
    }

    #[tokio::test]
    async fn test_new_token_without_login_is_only_stored() {
        let (registrar, store, settings) = registrar();

        registrar.on_new_token("fcm-new").await.unwrap();

        assert_eq!(
            settings.get(SettingsKeys::REGISTRATION_ID).unwrap(),
            Some("fcm-new".to_string())
        );
        assert_eq!(store.put_count(), 0);
    }

    #[tokio::test]
    async fn test_update_registration_after_login() {
        let (registrar, store, settings) = registrar();
        settings.set(SettingsKeys::REGISTRATION_ID, "fcm-old").unwrap();
        settings
            .set(SettingsKeys::SERVER_URL, "https://kontrolid.smap.com.au")
            .unwrap();
        settings.set(SettingsKeys::USERNAME, "maria").unwrap();

        registrar.update_server_registration().await.unwrap();

        assert_eq!(
            store.records.lock().get("fcm-old").map(|r| r.username.clone()),
            Some("maria".to_string())
        );
    }

    #[tokio::test]
    async fn test_register_surfaces_failure() {
        let (registrar, store, _) = registrar();
        store.fail_puts([throttled(), throttled()]);

        let err = registrar
            .register("fcm-token", "https://sg.smap.com.au", "neil")
            .await
            .unwrap_err();

        assert!(matches!(err, RegistryError::Remote { .. }));
        assert_eq!(store.put_count(), 2);
    }

    #[tokio::test]
    async fn test_execute_runs_in_background_and_swallows_errors() {
        let (registrar, store, _) = registrar();

        registrar
            .execute("fcm-token", "https://sg.smap.com.au", "neil")
            .await
            .unwrap();
        assert!(store.records.lock().contains_key("fcm-token"));

        registrar.execute("", "https://sg.smap.com.au", "neil").await.unwrap();
        assert_eq!(store.put_count(), 1);
    }
}
