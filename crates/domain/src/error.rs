//! The one closed error vocabulary shared by every crate in this workspace.
//!
//! Kinds mirror the propagation policy: `TransientNetworkError` is retried
//! locally by the caller and never escapes a provider; `RiskCapExceeded` is
//! a decision outcome, not a fault, and callers should prefer
//! `RiskEngine`'s `Admitted`/`Refused` result type over constructing this
//! variant directly.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("config error: {0}")]
    ConfigError(String),

    #[error("transient network error: {0}")]
    TransientNetworkError(String),

    #[error("permanent API error (status={status}): {message}")]
    PermanentApiError { status: u16, message: String },

    #[error("auth error: {0}")]
    AuthError(String),

    #[error("data validation error: {0}")]
    DataValidationError(String),

    #[error("stale data: {0}")]
    StaleDataError(String),

    #[error("risk cap exceeded: {0}")]
    RiskCapExceeded(String),

    #[error("invalid order transition: {0}")]
    InvalidTransition(String),

    #[error("reconciliation mismatch: {0}")]
    ReconcileMismatch(String),

    #[error("fatal internal error: {0}")]
    FatalInternal(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::DataValidationError(format!("JSON parse error: {e}"))
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::FatalInternal(format!("IO error: {e}"))
    }
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        Error::FatalInternal(format!("database error: {e}"))
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() || e.is_connect() {
            Error::TransientNetworkError(e.to_string())
        } else {
            Error::PermanentApiError {
                status: e.status().map(|s| s.as_u16()).unwrap_or(0),
                message: e.to_string(),
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
