//! Registration service used by the rest of the client.

use crate::record::token_prefix;
use crate::{DeviceRecord, DeviceRepository, RegistryResult};
use std::sync::Arc;
use tracing::info;

/// Associates a push token with a server and user.
#[derive(Clone)]
pub struct DeviceRegistrationService {
    repository: Arc<DeviceRepository>,
}

impl DeviceRegistrationService {
    pub fn new(repository: Arc<DeviceRepository>) -> Self {
        Self { repository }
    }

    /// Register (or re-register) this device.
    ///
    /// Blank arguments are rejected with `InvalidInput` before any network call.
    pub async fn register_device(
        &self,
        token: &str,
        server_url: &str,
        username: &str,
    ) -> RegistryResult<()> {
        let record = DeviceRecord::new(token, server_url, username);
        record.validate()?;

        info!(
            token_prefix = %token_prefix(token),
            server = %server_url,
            username = %username,
            "Registering device"
        );
        self.repository.save(&record).await
    }

    pub async fn get_device_registration(&self, token: &str) -> RegistryResult<Option<DeviceRecord>> {
        self.repository.get(token).await
    }

    pub async fn unregister_device(&self, token: &str) -> RegistryResult<()> {
        info!(token_prefix = %token_prefix(token), "Unregistering device");
        self.repository.delete(token).await
    }
}
