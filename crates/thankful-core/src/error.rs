//! Error types for thankful-core

use thiserror::Error;

/// Result type alias using thankful-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in thankful-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Remote store call failed or was rejected
    #[error("Remote store error: {0}")]
    Remote(String),

    /// HTTP transport error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error (offline vault, locale files)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Note not found
    #[error("Note not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
