//! Error types for paion-player
//!
//! Defines service-specific error types using thiserror for clear error
//! propagation.

use thiserror::Error;

/// Main error type for the paion-player service
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Bundle access or verification errors
    #[error(transparent)]
    Bundle(#[from] paion_common::Error),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using paion-player Error
pub type Result<T> = std::result::Result<T, Error>;
