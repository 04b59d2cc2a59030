//! Error types for the discovery subsystem.

use patfinder_core::Retryable;
use thiserror::Error;

/// Errors that can occur while talking to search providers.
#[derive(Error, Debug)]
pub enum SearchError {
    /// API error with status code
    #[error("API error ({provider}): status {status}, {message}")]
    Api {
        /// Provider name
        provider: String,
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
    },

    /// Rate limit exceeded
    #[error("rate limit exceeded for {provider}: {message}")]
    RateLimited {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Invalid API key or authentication failure
    #[error("authentication failed for {provider}: status {status}")]
    AuthenticationFailed {
        /// Provider name
        provider: String,
        /// HTTP status code
        status: u16,
    },

    /// Response parsing error
    #[error("failed to parse response from {provider}: {message}")]
    Parse {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Timeout error
    #[error("request timed out after {seconds}s")]
    Timeout {
        /// Timeout duration in seconds
        seconds: u64,
    },

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl SearchError {
    /// Map an HTTP error status to the matching variant.
    #[must_use]
    pub fn from_status(provider: &str, status: u16, message: String) -> Self {
        match status {
            429 => Self::RateLimited {
                provider: provider.to_string(),
                message,
            },
            401 | 403 => Self::AuthenticationFailed {
                provider: provider.to_string(),
                status,
            },
            _ => Self::Api {
                provider: provider.to_string(),
                status,
                message,
            },
        }
    }
}

impl Retryable for SearchError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Api { .. } | Self::RateLimited { .. } | Self::Network(_) | Self::Timeout { .. } => {
                true
            }
            Self::AuthenticationFailed { .. } | Self::Parse { .. } | Self::Internal(_) => false,
        }
    }

    fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

/// Result type alias for discovery operations.
pub type Result<T> = std::result::Result<T, SearchError>;
