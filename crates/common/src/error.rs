//! Unified error type for the weather dashboard.

use thiserror::Error;

/// How a summary save/list round-trip failed. The three cases are surfaced
/// to the user with different messages, so they stay distinct here.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("summary store rejected the request (status={status}): {message}")]
    Status { status: u16, message: String },

    #[error("no response from the summary store: {0}")]
    NoResponse(String),

    #[error("summary request could not be sent: {0}")]
    Send(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("gateway error: {0}")]
    Gateway(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("config error: {0}")]
    Config(String),

    #[error("cache error: {0}")]
    Cache(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Polling-path failures worth another attempt. Everything else is a
    /// bug or bad input and is never retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::Gateway(_))
    }
}
