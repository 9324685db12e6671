//! Error types for the core library.

use thiserror::Error;

use crate::email::EmailId;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// HTTP request to a remote store failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// A remote store answered with a non-success status.
    #[error("Store error ({status}): {message}")]
    Store {
        /// HTTP status code returned by the store.
        status: u16,
        /// Response body or summary.
        message: String,
    },

    /// No email with this identifier exists.
    #[error("Email not found: {0}")]
    NotFound(EmailId),

    /// The store connection parameters are missing.
    #[error("Store not configured")]
    NotConfigured,

    /// Caller supplied an invalid value.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Creates an invalid input error.
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Whether this error means the addressed record does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
