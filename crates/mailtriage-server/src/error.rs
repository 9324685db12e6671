//! Error types for the server.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mailtriage_core::wire::ErrorBody;
use thiserror::Error;
use tracing::error;

use crate::config::STORE_URL_VAR;

/// Errors raised while starting the server or running a command.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration value is unusable.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Core operation failed.
    #[error(transparent)]
    Core(#[from] mailtriage_core::Error),

    /// Socket or file I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Input file is not valid JSON.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Input file is not valid CSV.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Error returned by request handlers, rendered as an `ErrorBody`.
#[derive(Debug)]
pub struct ApiError(mailtriage_core::Error);

impl From<mailtriage_core::Error> for ApiError {
    fn from(err: mailtriage_core::Error) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(mailtriage_core::Error::invalid(rejection.body_text()))
    }
}

impl ApiError {
    /// Status code and body for this error.
    #[must_use]
    pub fn parts(&self) -> (StatusCode, ErrorBody) {
        use mailtriage_core::Error as Core;

        match &self.0 {
            Core::NotFound(_) => (StatusCode::NOT_FOUND, ErrorBody::new("Email not found")),
            Core::InvalidInput(message) => (StatusCode::BAD_REQUEST, ErrorBody::new(message)),
            Core::NotConfigured => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::new("Store not configured")
                    .with_note(format!("Set {STORE_URL_VAR} to enable writes")),
            ),
            other => {
                error!(error = %other, "Store request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new("Internal server error"),
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.parts();
        (status, Json(body)).into_response()
    }
}
