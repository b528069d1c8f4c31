//! Application state definition.

use super::AppResult;
use cognito_credentials::{CognitoCredentialsProvider, CognitoIdentityClient};
use device_registry::{
    DeviceRegistrationService, DeviceRepository, DynamoDbDeviceStore, MessagingRegistrar,
};
use fieldtask_config_and_utils::{Config, Paths};
use settings_storage::{open_settings, SettingsStorage};
use std::sync::Arc;
use tracing::info;

/// Components shared by every command.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<dyn SettingsStorage>,
    pub credentials: Arc<CognitoCredentialsProvider>,
    pub registration: DeviceRegistrationService,
    pub messaging: MessagingRegistrar,
}

impl AppState {
    /// Build the component graph: settings, credential provider, remote store,
    /// repository, service and registrar.
    pub fn new(config: &Config, paths: &Paths) -> AppResult<Self> {
        let settings = open_settings(&paths.settings_file())?;

        let broker = Arc::new(CognitoIdentityClient::new(&config.cognito_region)?);
        let credentials = Arc::new(CognitoCredentialsProvider::new(
            broker,
            settings.clone(),
            config.cognito_identity_pool_id.clone(),
        ));

        let store = Arc::new(DynamoDbDeviceStore::new(
            credentials.clone(),
            &config.dynamodb_region,
            &config.devices_table,
        )?);
        let repository = Arc::new(DeviceRepository::new(store));
        let registration = DeviceRegistrationService::new(repository);
        let messaging = MessagingRegistrar::new(registration.clone(), settings.clone());

        info!(
            cognito_region = %config.cognito_region,
            dynamodb_region = %config.dynamodb_region,
            table = %config.devices_table,
            "Configuration loaded"
        );

        Ok(Self {
            settings,
            credentials,
            registration,
            messaging,
        })
    }
}
