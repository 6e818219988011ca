//! Error types for the QuizForge client.

use serde::Deserialize;

/// Errors returned by the QuizForge client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The HTTP request failed (network, timeout, etc.).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service returned a structured error response.
    #[error("API error ({status}): {code}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Machine-readable error code (e.g. `insufficient_credits`).
        code: String,
        /// Human-readable message.
        message: String,
    },

    /// The response body could not be decoded.
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ClientError {
    /// Whether the error is the expected insufficient-credits outcome.
    #[must_use]
    pub fn is_insufficient_credits(&self) -> bool {
        matches!(self, Self::Api { code, .. } if code == "insufficient_credits")
    }
}

/// Error response envelope from the service.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

/// Error payload from the service.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub code: String,
    pub message: String,
}
