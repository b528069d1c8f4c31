//! AWS credentials via a Cognito identity pool.
//!
//! This crate provides:
//! - [`SessionCredentials`]: the short-lived access/secret/session-token triple
//!   plus its expiry and the device's identity id
//! - [`CredentialsCache`]: memory-first cache persisted to settings storage,
//!   treating records as expired 5 minutes before their real expiry
//! - [`IdentityBroker`]: the two-call identity exchange (identity lookup, then
//!   credentials for that identity), implemented over HTTPS by
//!   [`CognitoIdentityClient`]
//! - [`CognitoCredentialsProvider`]: serves cached credentials, collapses
//!   concurrent refreshes into one exchange, and falls back to stale
//!   credentials when a refresh fails

mod broker;
mod cache;
mod cognito_client;
mod credentials;
mod error;
mod provider;

pub use broker::IdentityBroker;
pub use cache::CredentialsCache;
pub use cognito_client::CognitoIdentityClient;
pub use credentials::{SessionCredentials, EXPIRATION_BUFFER_MS};
pub use error::{CredentialsError, CredentialsResult};
pub use provider::CognitoCredentialsProvider;
