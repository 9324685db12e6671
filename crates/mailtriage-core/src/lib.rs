//! # mailtriage-core
//!
//! Core logic for the `mailtriage` support inbox.
//!
//! This crate provides:
//! - The email record, its classification enums and write-side shapes
//! - List filtering and pagination
//! - Storage backends (`SQLite`, PostgREST)
//! - The repository service with sample-data fallback
//! - Dashboard analytics
//! - A keyword classifier for unlabelled emails
//! - Request and response bodies shared with the HTTP client

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod analytics;
pub mod classify;
pub mod email;
mod error;
pub mod query;
pub mod sample;
pub mod service;
pub mod store;
pub mod wire;

pub use analytics::Analytics;
pub use email::{
    AiDraft, Attachment, Email, EmailId, EmailPatch, EmailStatus, Enrichment, NewEmail,
    ParseEnumError, Priority, Replies, Sentiment,
};
pub use error::{Error, Result};
pub use query::{EmailQuery, RawEmailQuery};
pub use service::{EmailPage, EmailService};
pub use store::{EmailStore, PostgrestEmailStore, SqliteEmailStore};
