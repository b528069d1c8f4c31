//! Core types, configuration, and utilities shared by the fieldTask registration crates.

mod config;
mod error;
mod logging;
mod paths;
mod server_url;

pub use config::{
    Config, DEFAULT_COGNITO_IDENTITY_POOL_ID, DEFAULT_COGNITO_REGION, DEFAULT_DEVICES_TABLE,
    DEFAULT_DYNAMODB_REGION, DEFAULT_LOG_LEVEL,
};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, parse_level};
pub use paths::Paths;
pub use server_url::normalize_server_url;
