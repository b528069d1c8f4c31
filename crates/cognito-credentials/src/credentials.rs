//! Session credential record.

use chrono::{DateTime, Duration, Utc};
use std::fmt;

/// Credentials are treated as expired this long before their real expiry (5 minutes).
pub const EXPIRATION_BUFFER_MS: i64 = 5 * 60 * 1000;

/// Short-lived AWS session credentials issued for a Cognito identity.
///
/// Records are immutable once issued; a refresh replaces the whole record.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiration: DateTime<Utc>,
    pub identity_id: String,
}

impl SessionCredentials {
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: impl Into<String>,
        expiration: DateTime<Utc>,
        identity_id: impl Into<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: session_token.into(),
            expiration,
            identity_id: identity_id.into(),
        }
    }

    /// Instant after which the record is no longer served from cache.
    pub fn refresh_deadline(&self) -> DateTime<Utc> {
        self.expiration - Duration::milliseconds(EXPIRATION_BUFFER_MS)
    }

    /// True iff `now >= expiration - 5min`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.refresh_deadline()
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

impl fmt::Debug for SessionCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &"<redacted>")
            .field("expiration", &self.expiration)
            .field("identity_id", &self.identity_id)
            .finish()
    }
}
