//! Settings key constants.
//!
//! Credential keys match the names used by the mobile client's shared
//! preferences so a migrated settings file stays readable.

/// Settings keys used by the registration client
pub struct SettingsKeys;

impl SettingsKeys {
    /// Cached AWS access key id
    pub const AWS_ACCESS_KEY: &'static str = "aws_access_key";

    /// Cached AWS secret key
    pub const AWS_SECRET_KEY: &'static str = "aws_secret_key";

    /// Cached AWS session token
    pub const AWS_SESSION_TOKEN: &'static str = "aws_session_token";

    /// Cached credential expiry (epoch millis)
    pub const AWS_EXPIRATION: &'static str = "aws_expiration";

    /// Cognito identity id for this device
    pub const AWS_IDENTITY_ID: &'static str = "aws_identity_id";

    /// Current push messaging registration token
    pub const REGISTRATION_ID: &'static str = "smap_registration_id";

    /// Server URL the user is logged in to
    pub const SERVER_URL: &'static str = "server_url";

    /// Logged-in username
    pub const USERNAME: &'static str = "username";

    /// All cached credential keys (cleared together on logout).
    pub const CREDENTIAL_KEYS: [&'static str; 5] = [
        Self::AWS_ACCESS_KEY,
        Self::AWS_SECRET_KEY,
        Self::AWS_SESSION_TOKEN,
        Self::AWS_EXPIRATION,
        Self::AWS_IDENTITY_ID,
    ];
}
