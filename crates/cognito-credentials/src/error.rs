//! Credential error types.

use settings_storage::SettingsError;
use thiserror::Error;

/// Service error code returned when a cached identity no longer exists in the pool.
pub(crate) const IDENTITY_NOT_FOUND_CODE: &str = "ResourceNotFoundException";

/// Errors from the identity exchange or the credential cache.
#[derive(Error, Debug)]
pub enum CredentialsError {
    /// Transport-level failure talking to the identity service
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The identity service rejected the request
    #[error("Identity service error {code}: {message}")]
    Service { code: String, message: String },

    /// The identity service answered with something we could not read
    #[error("Malformed identity response: {0}")]
    MalformedResponse(String),

    /// Settings storage failure
    #[error("Settings error: {0}")]
    Storage(#[from] SettingsError),

    /// No credentials could be obtained and none were cached
    #[error("No credentials available: {0}")]
    NoCredentials(String),
}

impl CredentialsError {
    /// Whether the service reported the identity as unknown to the pool.
    pub fn is_identity_not_found(&self) -> bool {
        matches!(self, Self::Service { code, .. } if code == IDENTITY_NOT_FOUND_CODE)
    }
}

/// Result type alias using CredentialsError.
pub type CredentialsResult<T> = Result<T, CredentialsError>;
