//! Device registration for push messaging.
//!
//! A device is registered by writing its push token, server url and username
//! to a shared remote table keyed by the token:
//!
//! - [`DeviceRegistrationService`]: validates arguments and delegates to the repository
//! - [`DeviceRepository`]: save with bounded exponential-backoff retry, lookup, delete
//! - [`DeviceStore`]: single-attempt table operations, implemented for DynamoDB by
//!   [`DynamoDbDeviceStore`] with SigV4-signed requests
//! - [`MessagingRegistrar`]: stores new push tokens and keeps the registration current

mod dynamodb;
mod error;
mod messaging;
mod record;
mod repository;
mod service;
mod sigv4;
mod store;

pub use dynamodb::DynamoDbDeviceStore;
pub use error::{RegistryError, RegistryResult};
pub use messaging::MessagingRegistrar;
pub use record::{token_prefix, DeviceRecord};
pub use repository::{DeviceRepository, RetryPolicy};
pub use service::DeviceRegistrationService;
pub use sigv4::{signing_key, RequestSigner};
pub use store::DeviceStore;
