//! Common error types for the healthcheck crates.

use std::fmt;

/// A specialized Result type for healthcheck operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for healthcheck operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Logging error: {0}")]
    Logging(String),
}

impl Error {
    /// Create a new logging error.
    pub fn logging(msg: impl fmt::Display) -> Self {
        Error::Logging(msg.to_string())
    }
}
