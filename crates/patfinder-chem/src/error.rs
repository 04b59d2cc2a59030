//! Error types for compound lookup.

use patfinder_core::Retryable;
use thiserror::Error;

/// Errors from the compound synonym service.
#[derive(Error, Debug)]
pub enum ChemError {
    /// Network-level failure (connection, DNS, TLS)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Request exceeded the configured timeout
    #[error("request timed out after {seconds}s")]
    Timeout {
        /// Configured timeout in seconds
        seconds: u64,
    },

    /// Response body could not be parsed
    #[error("failed to parse synonym response: {message}")]
    Parse {
        /// Parser error detail
        message: String,
    },

    /// Generic internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl Retryable for ChemError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout { .. })
    }

    fn is_rate_limited(&self) -> bool {
        false
    }
}

/// Result type alias for compound lookup operations.
pub type Result<T> = std::result::Result<T, ChemError>;
