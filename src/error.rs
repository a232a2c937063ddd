//! Error types for ReviewLens
//!
//! This module defines the error taxonomy used by the API client and the
//! conversation orchestrator, using `thiserror` for ergonomic error handling.
//!
//! Library functions return [`Result`], an `anyhow` alias. Callers that need
//! to react to a specific failure class (for example the soft "not
//! implemented" case) downcast to [`ReviewLensError`] through the helpers at
//! the bottom of this module.

use thiserror::Error;

/// Main error type for ReviewLens operations
#[derive(Error, Debug)]
pub enum ReviewLensError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network failure before a response arrived (connect, timeout, reset)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Backend answered with a failure status or an error body
    #[error("API error (status {status}): {detail}")]
    Api {
        /// HTTP status code returned by the backend
        status: u16,
        /// The backend's `detail` field, or the raw body when absent
        detail: String,
    },

    /// Backend answered 501 for a feature it does not provide yet
    #[error("Not implemented by backend: {0}")]
    NotImplemented(String),

    /// Response body did not have the expected shape
    #[error("Unexpected response payload: {0}")]
    Payload(String),

    /// Rejected user input (rating out of range, empty product name, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP client errors not tied to a response
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for ReviewLens operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;

/// Returns true when the error is the backend's 501 "not implemented" answer
pub fn is_not_implemented(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<ReviewLensError>(),
        Some(ReviewLensError::NotImplemented(_))
    )
}

/// Extracts the backend-provided detail from an API error, if any
///
/// # Examples
///
/// ```
/// use reviewlens::error::{api_detail, ReviewLensError};
///
/// let err: anyhow::Error = ReviewLensError::Api {
///     status: 404,
///     detail: "session not found".to_string(),
/// }
/// .into();
/// assert_eq!(api_detail(&err), Some("session not found"));
/// ```
pub fn api_detail(err: &anyhow::Error) -> Option<&str> {
    match err.downcast_ref::<ReviewLensError>() {
        Some(ReviewLensError::Api { detail, .. }) => Some(detail.as_str()),
        _ => None,
    }
}
