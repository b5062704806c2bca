//! Jikan API client error types.

use std::sync::Arc;

/// Errors from the Jikan anime search API client.
#[derive(Debug, thiserror::Error)]
pub enum JikanError {
    /// Empty or malformed search request.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Invalid limit parameter (must be 1-25).
    #[error("invalid limit: must be 1-25")]
    InvalidLimit,

    /// Rate limited by the Jikan API.
    #[error("rate limited: too many requests")]
    RateLimited,

    /// HTTP error response.
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Response parse error.
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for JikanError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { JikanError::Timeout } else { JikanError::Network(Arc::new(err)) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = JikanError::InvalidQuery("empty".to_string());
        assert!(err.to_string().contains("invalid query"));

        let err = JikanError::HttpError { status: 500 };
        assert!(err.to_string().contains("500"));

        let err = JikanError::RateLimited;
        assert!(err.to_string().contains("too many requests"));
    }
}
