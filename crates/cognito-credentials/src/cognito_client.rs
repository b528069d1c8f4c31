//! Cognito Identity REST client.
//!
//! Speaks the AWS JSON 1.1 protocol directly. `GetId` and
//! `GetCredentialsForIdentity` are unsigned calls for unauthenticated
//! identity pools, so no request signing is needed here.

use crate::error::{CredentialsError, CredentialsResult};
use crate::{IdentityBroker, SessionCredentials};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

const CONTENT_TYPE: &str = "application/x-amz-json-1.1";
const TARGET_GET_ID: &str = "AWSCognitoIdentityService.GetId";
const TARGET_GET_CREDENTIALS: &str = "AWSCognitoIdentityService.GetCredentialsForIdentity";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// HTTP client for a Cognito identity pool.
#[derive(Clone)]
pub struct CognitoIdentityClient {
    http_client: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct GetIdRequest<'a> {
    identity_pool_id: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetIdResponse {
    identity_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct GetCredentialsRequest<'a> {
    identity_id: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetCredentialsResponse {
    identity_id: String,
    credentials: WireCredentials,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireCredentials {
    access_key_id: String,
    secret_key: String,
    session_token: String,
    /// Epoch seconds, possibly fractional.
    expiration: f64,
}

#[derive(Debug, Default, Deserialize)]
struct WireError {
    #[serde(rename = "__type", default)]
    error_type: String,
    #[serde(alias = "Message", default)]
    message: String,
}

impl CognitoIdentityClient {
    /// Client for the regional Cognito Identity endpoint.
    pub fn new(region: &str) -> CredentialsResult<Self> {
        Self::with_endpoint(format!("https://cognito-identity.{}.amazonaws.com/", region))
    }

    /// Client for an explicit endpoint (local emulators, VPC endpoints).
    pub fn with_endpoint(endpoint: impl Into<String>) -> CredentialsResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            http_client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn call<B: Serialize, T: DeserializeOwned>(
        &self,
        target: &str,
        body: &B,
    ) -> CredentialsResult<T> {
        debug!(target_op = target, endpoint = %self.endpoint, "Calling Cognito Identity");

        let response = self
            .http_client
            .post(&self.endpoint)
            .header("Content-Type", CONTENT_TYPE)
            .header("X-Amz-Target", target)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let err = parse_service_error(&text, status.as_u16());
            error!(status = %status, target_op = target, error = %err, "Cognito Identity call failed");
            return Err(err);
        }

        serde_json::from_str(&text)
            .map_err(|e| CredentialsError::MalformedResponse(format!("{}: {}", target, e)))
    }
}

#[async_trait]
impl IdentityBroker for CognitoIdentityClient {
    async fn get_id(&self, identity_pool_id: &str) -> CredentialsResult<String> {
        let response: GetIdResponse = self
            .call(TARGET_GET_ID, &GetIdRequest { identity_pool_id })
            .await?;
        Ok(response.identity_id)
    }

    async fn get_credentials_for_identity(
        &self,
        identity_id: &str,
    ) -> CredentialsResult<SessionCredentials> {
        let response: GetCredentialsResponse = self
            .call(TARGET_GET_CREDENTIALS, &GetCredentialsRequest { identity_id })
            .await?;
        into_session_credentials(response)
    }
}

fn into_session_credentials(
    response: GetCredentialsResponse,
) -> CredentialsResult<SessionCredentials> {
    let millis = (response.credentials.expiration * 1000.0).round() as i64;
    let expiration = DateTime::<Utc>::from_timestamp_millis(millis).ok_or_else(|| {
        CredentialsError::MalformedResponse(format!(
            "expiration out of range: {}",
            response.credentials.expiration
        ))
    })?;

    Ok(SessionCredentials::new(
        response.credentials.access_key_id,
        response.credentials.secret_key,
        response.credentials.session_token,
        expiration,
        response.identity_id,
    ))
}

/// Map an error body to a service error.
///
/// `__type` may be namespaced (`com.amazonaws...#ResourceNotFoundException`);
/// only the part after `#` is kept.
fn parse_service_error(body: &str, status: u16) -> CredentialsError {
    let wire: WireError = serde_json::from_str(body).unwrap_or_default();
    let code = wire
        .error_type
        .rsplit('#')
        .next()
        .filter(|code| !code.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP{}", status));

    CredentialsError::Service {
        code,
        message: wire.message,
    }
}
