//! Remote device table abstraction.

use crate::{DeviceRecord, RegistryResult};
use async_trait::async_trait;

/// Key-value table holding one record per push token.
///
/// Every call is a single attempt; retry policy lives in the repository.
#[async_trait]
pub trait DeviceStore: Send + Sync {
    /// Insert or overwrite the record keyed by `record.token`.
    async fn put(&self, record: &DeviceRecord) -> RegistryResult<()>;

    /// Look up the record for `token`.
    async fn get(&self, token: &str) -> RegistryResult<Option<DeviceRecord>>;

    /// Delete the record for `token`. Deleting an absent key succeeds.
    async fn delete(&self, token: &str) -> RegistryResult<()>;
}
