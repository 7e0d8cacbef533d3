//! Error types for the fetch collaborator

use thiserror::Error;

/// Result type alias for fetch operations
pub type FetchResult<T> = Result<T, FetchError>;

/// Why a fetch attempt failed
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// Connection refused, reset, DNS failure and the like
    #[error("Network error: {0}")]
    Network(String),

    /// The request did not complete within its timeout
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    /// The server answered with a non-success status
    #[error("HTTP status {status} for {url}")]
    Status { status: u16, url: String },

    /// The URL could not be parsed or is not http(s)
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Check if error is transient and should be retried
    ///
    /// Network failures, timeouts, 5xx and 429 are retried; any other status
    /// and malformed URLs fail fast.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::InvalidUrl(_) => false,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_builder() {
            return Self::InvalidUrl(error.to_string());
        }
        if let Some(status) = error.status() {
            return Self::Status {
                status: status.as_u16(),
                url: error.url().map(ToString::to_string).unwrap_or_default(),
            };
        }
        Self::Network(error.to_string())
    }
}
