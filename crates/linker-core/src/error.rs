//! Error types for Linker.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// A required setting (auth token, API key) is absent. Raised before any
    /// request leaves the process.
    #[error("{0}")]
    MissingConfig(String),

    #[error("HTTP error: {0}")]
    Http(String),

    /// The service answered with a non-success status; the body is the message.
    #[error("Service error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Relay error: {0}")]
    Relay(String),

    /// User input rejected before anything is sent.
    #[error("{0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, Error>;
