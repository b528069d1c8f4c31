//! Registry error types.

use cognito_credentials::CredentialsError;
use settings_storage::SettingsError;
use thiserror::Error;

/// Errors from device registration.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Rejected before any network call
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Could not obtain credentials for the remote table
    #[error("Credentials error: {0}")]
    Credentials(#[from] CredentialsError),

    /// Transport-level failure talking to the remote table
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote table rejected the request
    #[error("Remote error {code}: {message}")]
    Remote {
        code: String,
        message: String,
        retryable: bool,
    },

    /// A stored item could not be read back
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Settings storage failure
    #[error("Settings error: {0}")]
    Storage(#[from] SettingsError),
}

impl RegistryError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Credentials(_) | Self::Http(_) => true,
            Self::Remote { retryable, .. } => *retryable,
            Self::InvalidInput(_) | Self::Encoding(_) | Self::Storage(_) => false,
        }
    }
}

/// Result type alias using RegistryError.
pub type RegistryResult<T> = Result<T, RegistryError>;
