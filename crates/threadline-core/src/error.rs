//! Error types for threadline-core

use thiserror::Error;

/// Result type alias using threadline-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in threadline-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend rejected or failed a request
    #[error("API error: {0}")]
    Api(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Store value could not be read or written
    #[error("Store error: {0}")]
    Store(String),
}
