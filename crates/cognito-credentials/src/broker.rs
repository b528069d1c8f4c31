//! Remote identity exchange seam.

use crate::{CredentialsResult, SessionCredentials};
use async_trait::async_trait;

/// The two calls of the identity pool exchange.
///
/// Implementors own the wire protocol; the provider only sequences the calls
/// and caches the result.
#[async_trait]
pub trait IdentityBroker: Send + Sync {
    /// Obtain an identity id for this device from the pool.
    async fn get_id(&self, identity_pool_id: &str) -> CredentialsResult<String>;

    /// Exchange an identity id for short-lived session credentials.
    ///
    /// The returned record carries the identity id the service answered with,
    /// which may differ from the one requested.
    async fn get_credentials_for_identity(
        &self,
        identity_id: &str,
    ) -> CredentialsResult<SessionCredentials>;
}
