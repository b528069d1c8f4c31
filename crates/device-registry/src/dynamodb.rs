//! DynamoDB-backed device table.
//!
//! Speaks the DynamoDB JSON 1.0 protocol over HTTPS. Every request is signed
//! with credentials taken from the Cognito provider right before the call.

use crate::record::key_item;
use crate::sigv4::RequestSigner;
use crate::{DeviceRecord, DeviceStore, RegistryError, RegistryResult};
use async_trait::async_trait;
use chrono::Utc;
use cognito_credentials::CognitoCredentialsProvider;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

const CONTENT_TYPE: &str = "application/x-amz-json-1.0";
const TARGET_PUT_ITEM: &str = "DynamoDB_20120810.PutItem";
const TARGET_GET_ITEM: &str = "DynamoDB_20120810.GetItem";
const TARGET_DELETE_ITEM: &str = "DynamoDB_20120810.DeleteItem";
const SERVICE: &str = "dynamodb";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Service error codes worth retrying.
const RETRYABLE_CODES: &[&str] = &[
    "ProvisionedThroughputExceededException",
    "ThrottlingException",
    "RequestLimitExceeded",
    "InternalServerError",
    "ServiceUnavailable",
    "ExpiredTokenException",
];

#[derive(Debug, Default, Deserialize)]
struct WireError {
    #[serde(rename = "__type", default)]
    error_type: String,
    #[serde(alias = "Message", default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct GetItemResponse {
    #[serde(rename = "Item", default)]
    item: Option<serde_json::Map<String, Value>>,
}

/// Device table in DynamoDB.
pub struct DynamoDbDeviceStore {
    http_client: reqwest::Client,
    credentials: Arc<CognitoCredentialsProvider>,
    endpoint: Url,
    host: String,
    region: String,
    table: String,
}

impl DynamoDbDeviceStore {
    /// Store for `table` at the regional DynamoDB endpoint.
    pub fn new(
        credentials: Arc<CognitoCredentialsProvider>,
        region: &str,
        table: &str,
    ) -> RegistryResult<Self> {
        let endpoint = format!("https://dynamodb.{}.amazonaws.com/", region);
        Self::with_endpoint(credentials, &endpoint, region, table)
    }

    /// Store at an explicit endpoint (DynamoDB Local, VPC endpoints).
    pub fn with_endpoint(
        credentials: Arc<CognitoCredentialsProvider>,
        endpoint: &str,
        region: &str,
        table: &str,
    ) -> RegistryResult<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| RegistryError::InvalidInput(format!("endpoint {}: {}", endpoint, e)))?;
        let host = match (endpoint.host_str(), endpoint.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => {
                return Err(RegistryError::InvalidInput(format!(
                    "endpoint {} has no host",
                    endpoint
                )))
            }
        };

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http_client,
            credentials,
            endpoint,
            host,
            region: region.to_string(),
            table: table.to_string(),
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    async fn call(&self, target: &str, body: &Value) -> RegistryResult<Value> {
        let credentials = self.credentials.get_credentials().await?;
        let payload =
            serde_json::to_vec(body).map_err(|e| RegistryError::Encoding(e.to_string()))?;

        let headers = RequestSigner::new(&credentials, &self.region, SERVICE).sign_post(
            &self.host,
            &[("content-type", CONTENT_TYPE), ("x-amz-target", target)],
            &payload,
            Utc::now(),
        )?;

        debug!(target_op = target, table = %self.table, "Calling DynamoDB");

        let mut request = self.http_client.post(self.endpoint.clone());
        for (name, value) in &headers {
            request = request.header(name.as_str(), value.as_str());
        }
        let response = request.body(payload).send().await?;

        let status = response.status();
        let text = response.text().await?;
        self.handle_response(target, status, &text).await
    }

    /// Turn a table response into its JSON body or a classified error.
    ///
    /// An expired session token also forces a credential refresh so the
    /// repository's retry signs with new credentials.
    async fn handle_response(
        &self,
        target: &str,
        status: StatusCode,
        text: &str,
    ) -> RegistryResult<Value> {
        if !status.is_success() {
            let err = parse_service_error(text, status.as_u16());
            error!(status = %status, target_op = target, error = %err, "DynamoDB call failed");
            if matches!(&err, RegistryError::Remote { code, .. } if code == "ExpiredTokenException")
            {
                warn!("Table rejected session token, forcing credential refresh");
                if let Err(e) = self.credentials.refresh().await {
                    warn!(error = %e, "Credential refresh after expired token failed");
                }
            }
            return Err(err);
        }

        if text.trim().is_empty() {
            return Ok(Value::Object(Default::default()));
        }
        serde_json::from_str(text)
            .map_err(|e| RegistryError::Encoding(format!("{}: {}", target, e)))
    }
}

#[async_trait]
impl DeviceStore for DynamoDbDeviceStore {
    async fn put(&self, record: &DeviceRecord) -> RegistryResult<()> {
        self.call(TARGET_PUT_ITEM, &put_item_request(&self.table, record))
            .await?;
        Ok(())
    }

    async fn get(&self, token: &str) -> RegistryResult<Option<DeviceRecord>> {
        let response = self
            .call(TARGET_GET_ITEM, &key_request(&self.table, token, true))
            .await?;
        let response: GetItemResponse = serde_json::from_value(response)
            .map_err(|e| RegistryError::Encoding(format!("GetItem: {}", e)))?;
        response
            .item
            .filter(|item| !item.is_empty())
            .map(|item| DeviceRecord::from_item(&item))
            .transpose()
    }

    async fn delete(&self, token: &str) -> RegistryResult<()> {
        self.call(TARGET_DELETE_ITEM, &key_request(&self.table, token, false))
            .await?;
        Ok(())
    }
}

fn put_item_request(table: &str, record: &DeviceRecord) -> Value {
    json!({
        "TableName": table,
        "Item": record.to_item(),
    })
}

fn key_request(table: &str, token: &str, consistent_read: bool) -> Value {
    let mut request = json!({
        "TableName": table,
        "Key": key_item(token),
    });
    if consistent_read {
        request["ConsistentRead"] = Value::Bool(true);
    }
    request
}

/// Map an error body to a remote error, deciding whether it may be retried.
fn parse_service_error(body: &str, status: u16) -> RegistryError {
    let wire: WireError = serde_json::from_str(body).unwrap_or_default();
    let code = wire
        .error_type
        .rsplit('#')
        .next()
        .filter(|code| !code.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP{}", status));
    let retryable = status >= 500 || RETRYABLE_CODES.contains(&code.as_str());

    RegistryError::Remote {
        code,
        message: wire.message,
        retryable,
    }
}
