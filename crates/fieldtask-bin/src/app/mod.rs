//! Application wiring and command handlers.

mod commands;
mod state;

pub use commands::{login, logout, lookup, new_token, register, show_credentials, unregister};
pub use state::AppState;

/// Result type for command handlers.
pub type AppResult<T> = Result<T, Box<dyn std::error::Error>>;
