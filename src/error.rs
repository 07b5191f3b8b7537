//! Error types.

use std::time::Duration;

use thiserror::Error;

/// Failure of a single upstream fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    /// No complete response within the configured timeout.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// DNS, connect, TLS or body read failure.
    #[error("Network error: {0}")]
    Network(String),

    /// Upstream answered with a non-success status.
    #[error("{status} {reason} for url: {url}")]
    Upstream {
        /// HTTP status code.
        status: u16,
        /// Canonical reason phrase, if known.
        reason: String,
        /// URL that was requested, query included.
        url: String,
    },

    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Client(#[source] reqwest::Error),
}

/// Failure of an API request, before it is shaped into a response.
#[derive(Debug, Error)]
pub enum ApiError {
    /// `q` missing or blank.
    #[error("Search term required")]
    MissingSearchTerm,

    /// Request input axum could not decode, such as a non-UTF-8 path.
    #[error("{0}")]
    InvalidInput(String),

    /// Lookup located no usable row.
    #[error("Node not found")]
    NodeNotFound,

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Invalid proxy configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid {name} URL {value:?}: {reason}")]
    InvalidUrl {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Timeout must be at least one second")]
    ZeroTimeout,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = FetchError::Upstream {
            status: 503,
            reason: "Service Unavailable".to_string(),
            url: "https://example.com/stats".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "503 Service Unavailable for url: https://example.com/stats"
        );

        let err = ApiError::from(FetchError::Timeout(Duration::from_secs(10)));
        assert_eq!(err.to_string(), "Request timed out after 10s");

        assert_eq!(ApiError::MissingSearchTerm.to_string(), "Search term required");
        assert_eq!(ApiError::NodeNotFound.to_string(), "Node not found");
    }
}
