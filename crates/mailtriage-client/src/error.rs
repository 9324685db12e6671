//! Error types for the client.

use mailtriage_core::EmailId;
use thiserror::Error;

/// Errors that can occur talking to the API or loading view state.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request could not be sent or the body could not be read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("Server returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// The `error` field of the response body.
        message: String,
    },

    /// A JSON document did not have the expected shape.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// The email is not in the local cache.
    #[error("Unknown email: {0}")]
    UnknownEmail(EmailId),

    /// The dashboard dataset could not be loaded.
    #[error("Dataset error: {0}")]
    Dataset(String),
}

impl ClientError {
    /// Whether the server reported the addressed email as missing.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, ClientError>;
