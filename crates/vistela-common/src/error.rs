//! Error types shared across Vistela crates

use thiserror::Error;

/// Result type alias for common operations
pub type Result<T> = std::result::Result<T, VistelaError>;

/// Errors raised by the shared crate
#[derive(Error, Debug)]
pub enum VistelaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    UnknownStatus(#[from] crate::types::UnknownStatusError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Logging initialization failed: {0}")]
    Logging(String),
}

impl VistelaError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
