//! Device registration record and its table item encoding.

use crate::{RegistryError, RegistryResult};
use serde_json::{json, Map, Value};

/// Key attribute; holds the push token.
pub const ATTR_REGISTRATION_ID: &str = "registrationId";
/// Server url the device submits to.
pub const ATTR_SMAP_SERVER: &str = "smapServer";
/// Username signed in on the device.
pub const ATTR_USER_IDENT: &str = "userIdent";

/// Number of token characters that may appear in logs.
const TOKEN_LOG_PREFIX: usize = 10;

/// One registered device: push token, server url and username.
///
/// The token is the record key; a later save for the same token overwrites it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRecord {
    pub token: String,
    pub server_url: String,
    pub username: String,
}

impl DeviceRecord {
    pub fn new(
        token: impl Into<String>,
        server_url: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            token: token.into(),
            server_url: server_url.into(),
            username: username.into(),
        }
    }

    /// Reject records with a blank token, server url or username.
    pub fn validate(&self) -> RegistryResult<()> {
        if self.token.trim().is_empty() {
            return Err(RegistryError::InvalidInput("token must not be blank".into()));
        }
        if self.server_url.trim().is_empty() {
            return Err(RegistryError::InvalidInput(
                "server url must not be blank".into(),
            ));
        }
        if self.username.trim().is_empty() {
            return Err(RegistryError::InvalidInput("username must not be blank".into()));
        }
        Ok(())
    }

    /// Table item in attribute-value form.
    pub fn to_item(&self) -> Value {
        json!({
            ATTR_REGISTRATION_ID: { "S": self.token },
            ATTR_SMAP_SERVER: { "S": self.server_url },
            ATTR_USER_IDENT: { "S": self.username },
        })
    }

    /// Parse a table item returned by a lookup.
    pub fn from_item(item: &Map<String, Value>) -> RegistryResult<Self> {
        Ok(Self {
            token: string_attr(item, ATTR_REGISTRATION_ID)?,
            server_url: string_attr(item, ATTR_SMAP_SERVER)?,
            username: string_attr(item, ATTR_USER_IDENT)?,
        })
    }
}

/// Key-only item for lookups and deletes.
pub fn key_item(token: &str) -> Value {
    json!({ ATTR_REGISTRATION_ID: { "S": token } })
}

/// First characters of a token, safe to log.
pub fn token_prefix(token: &str) -> &str {
    match token.char_indices().nth(TOKEN_LOG_PREFIX) {
        Some((idx, _)) => &token[..idx],
        None => token,
    }
}

fn string_attr(item: &Map<String, Value>, name: &str) -> RegistryResult<String> {
    item.get(name)
        .and_then(|attr| attr.get("S"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| RegistryError::Encoding(format!("missing string attribute {}", name)))
}
