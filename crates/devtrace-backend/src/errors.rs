//! Backend error types.

use thiserror::Error;

/// Errors from the HTTP backend adapter.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Transport-level failure (connect, timeout, TLS).
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("backend error (status {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the response body, or the status reason.
        message: String,
    },

    /// A response body did not match the expected shape.
    #[error("failed to decode backend response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The live event stream broke mid-flight.
    #[error("event stream failed: {0}")]
    Stream(String),
}
