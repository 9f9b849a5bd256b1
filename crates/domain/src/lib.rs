//! Shared types, config, city registry, and error definitions for the
//! weather contract trading engine.

pub mod cities;
pub mod config;
pub mod error;
pub mod intent;
pub mod types;

pub use config::Config;
pub use error::Error;
pub use types::*;

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, Error>;
