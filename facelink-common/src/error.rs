//! Common error types for Facelink connector services

use thiserror::Error;

/// Common result type for Facelink operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across Facelink connector services
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport-level failure talking to the recognition platform
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Structured API error returned by the recognition platform
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    /// Internal service error
    #[error("Internal error: {0}")]
    Internal(String),
}
