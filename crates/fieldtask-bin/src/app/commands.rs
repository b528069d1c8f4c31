//! Command handlers.

use super::{AppResult, AppState};
use fieldtask_config_and_utils::normalize_server_url;
use settings_storage::SettingsKeys;
use tracing::info;

/// Store the signed-in context, then register the stored push token (if any).
pub async fn login(state: &AppState, server: &str, username: &str) -> AppResult<()> {
    let server = normalize_server_url(server)?;
    let server = server.as_str();
    state.settings.set_many(&[
        (SettingsKeys::SERVER_URL, server),
        (SettingsKeys::USERNAME, username),
    ])?;
    info!(server = %server, username = %username, "Signed-in context stored");

    state.messaging.update_server_registration().await?;
    println!("Logged in as {} on {}", username, server);
    Ok(())
}

pub async fn new_token(state: &AppState, token: &str) -> AppResult<()> {
    state.messaging.on_new_token(token).await?;
    println!("Push token stored");
    Ok(())
}

pub async fn register(state: &AppState, token: &str, server: &str, username: &str) -> AppResult<()> {
    let server = normalize_server_url(server)?;
    state.messaging.register(token, &server, username).await?;
    println!("Device registered");
    Ok(())
}

pub async fn lookup(state: &AppState, token: &str) -> AppResult<()> {
    let output = match state.registration.get_device_registration(token).await? {
        Some(record) => serde_json::json!({
            "registered": true,
            "server": record.server_url,
            "username": record.username,
        }),
        None => serde_json::json!({ "registered": false }),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

pub async fn unregister(state: &AppState, token: &str) -> AppResult<()> {
    state.registration.unregister_device(token).await?;
    println!("Device unregistered");
    Ok(())
}

pub async fn show_credentials(state: &AppState) -> AppResult<()> {
    let credentials = state.credentials.get_credentials().await?;
    let output = serde_json::json!({
        "identity_id": credentials.identity_id,
        "access_key_id": credentials.access_key_id,
        "expiration": credentials.expiration.to_rfc3339(),
        "expired": credentials.is_expired(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Forget credentials, identity and signed-in context. The push token is kept.
pub fn logout(state: &AppState) -> AppResult<()> {
    state.credentials.clear_credentials()?;
    state
        .settings
        .delete_many(&[SettingsKeys::SERVER_URL, SettingsKeys::USERNAME])?;
    info!("Logged out");
    println!("Logged out");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldtask_config_and_utils::{Config, Paths};
    use tempfile::tempdir;

    fn state(dir: &std::path::Path) -> AppState {
        let config = Config {
            cognito_identity_pool_id: "ap-southeast-2:00000000-0000-0000-0000-000000000000"
                .to_string(),
            cognito_region: "ap-southeast-2".to_string(),
            dynamodb_region: "ap-southeast-2".to_string(),
            ..Config::default()
        };
        AppState::new(&config, &Paths::with_base_dir(dir.to_path_buf())).unwrap()
    }

    #[tokio::test]
    async fn test_login_without_token_only_stores_context() {
        let dir = tempdir().unwrap();
        let state = state(dir.path());

        login(&state, "https://sg.smap.com.au/", "neil").await.unwrap();

        assert_eq!(
            state.settings.get(SettingsKeys::SERVER_URL).unwrap(),
            Some("https://sg.smap.com.au".to_string())
        );
        assert_eq!(
            state.settings.get(SettingsKeys::USERNAME).unwrap(),
            Some("neil".to_string())
        );
    }

    #[tokio::test]
    async fn test_token_before_login_is_persisted() {
        let dir = tempdir().unwrap();
        new_token(&state(dir.path()), "fcm-token").await.unwrap();

        let reopened = state(dir.path());
        assert_eq!(
            reopened.settings.get(SettingsKeys::REGISTRATION_ID).unwrap(),
            Some("fcm-token".to_string())
        );
    }

    #[tokio::test]
    async fn test_register_rejects_blank_token_without_network() {
        let dir = tempdir().unwrap();
        let err = register(&state(dir.path()), "", "https://sg.smap.com.au", "neil")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid input"));
    }

    #[tokio::test]
    async fn test_logout_clears_identity_and_context_but_keeps_token() {
        let dir = tempdir().unwrap();
        let state = state(dir.path());
        state
            .settings
            .set_many(&[
                (SettingsKeys::AWS_IDENTITY_ID, "ap-southeast-2:identity"),
                (SettingsKeys::SERVER_URL, "https://sg.smap.com.au"),
                (SettingsKeys::USERNAME, "neil"),
                (SettingsKeys::REGISTRATION_ID, "fcm-token"),
            ])
            .unwrap();
        assert!(state.credentials.has_cached_credentials());

        logout(&state).unwrap();

        assert_eq!(state.credentials.cached_identity_id(), None);
        assert_eq!(state.settings.get(SettingsKeys::SERVER_URL).unwrap(), None);
        assert_eq!(state.settings.get(SettingsKeys::USERNAME).unwrap(), None);
        assert_eq!(
            state.settings.get(SettingsKeys::REGISTRATION_ID).unwrap(),
            Some("fcm-token".to_string())
        );
    }
}
