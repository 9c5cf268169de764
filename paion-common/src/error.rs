//! Common error types for PAION

use thiserror::Error;

/// Common result type for PAION operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across PAION crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Bundle archive error (wraps zip::result::ZipError)
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Manifest parse error (wraps serde_json::Error)
    #[error("Manifest error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
