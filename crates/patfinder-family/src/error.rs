//! Error types for family navigation and the patent-office backup.

use patfinder_search::SearchError;
use thiserror::Error;

/// Errors produced while navigating patent families.
#[derive(Error, Debug)]
pub enum FamilyError {
    /// Search provider failure during a navigation hop
    #[error("search error: {0}")]
    Search(#[from] SearchError),

    /// HTTP transport failure talking to the patent office
    #[error("office network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Patent office rejected a request
    #[error("office returned status {status}: {message}")]
    OfficeApi {
        /// HTTP status code
        status: u16,
        /// Response body or error description
        message: String,
    },

    /// Token endpoint did not yield a usable access token
    #[error("office authentication failed: {0}")]
    OfficeAuth(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias for family operations.
pub type Result<T> = std::result::Result<T, FamilyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FamilyError::OfficeApi {
            status: 404,
            message: "no published data".to_string(),
        };
        assert_eq!(err.to_string(), "office returned status 404: no published data");

        let err = FamilyError::OfficeAuth("empty token response".to_string());
        assert!(err.to_string().contains("authentication failed"));
    }

    #[test]
    fn test_search_error_converts() {
        let search = SearchError::Timeout { seconds: 60 };
        let err = FamilyError::from(search);
        assert!(matches!(err, FamilyError::Search(_)));
    }
}
