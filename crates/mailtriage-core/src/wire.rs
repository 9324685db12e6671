//! Request and response bodies of the REST surface.
//!
//! Shared by the server and the client so both sides agree on the shape.

use serde::{Deserialize, Serialize};

use crate::email::Email;

/// `{"email": ...}` wrapper used by single-record responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailEnvelope {
    /// The record.
    pub email: Email,
}

/// Body of `POST /emails/{id}/reply`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyRequest {
    /// Reply text to append.
    pub reply: String,
}

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable summary.
    pub error: String,
    /// Extra guidance, e.g. which setting is missing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ErrorBody {
    /// Error without a note.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            note: None,
        }
    }

    /// Attach a note.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    /// Always `ok` when the process answers.
    pub status: String,
    /// Active backend: `sqlite`, `postgrest` or `unconfigured`.
    pub store: String,
}
