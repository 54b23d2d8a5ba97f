//! Shared types, config, and error definitions for the weather dashboard.

pub mod config;
pub mod error;
pub mod types;
pub mod units;

pub use config::DashConfig;
pub use error::{Error, PersistenceError};
pub use types::*;

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, Error>;
