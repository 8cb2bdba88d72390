//! Error types for the crypto price tracker

use thiserror::Error;

/// Errors that can occur when fetching market data from the remote source
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network request failed
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// Invalid response from provider
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Provider API error
    #[error("Provider API error: {0}")]
    ApiError(String),
}

/// Errors that can occur when the client fetches from the local endpoint
///
/// Cloneable so a single de-duplicated fetch can hand the same failure to
/// every waiter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The endpoint could not be reached
    #[error("Network error: {0}")]
    Network(String),

    /// The endpoint answered with a non-success status
    #[error("Network response was not ok (HTTP {0})")]
    Status(u16),

    /// The body was not a valid asset envelope
    #[error("Invalid response: {0}")]
    Decode(String),

    /// The background fetch task did not complete
    #[error("Fetch task aborted: {0}")]
    Aborted(String),
}

impl FetchError {
    /// Creates a Network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Status(status.as_u16())
        } else {
            Self::Network(err.to_string())
        }
    }
}
