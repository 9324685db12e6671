//! Persistence seam for email records.
//!
//! Two backends implement [`EmailStore`]: an embedded SQLite database and a
//! PostgREST-style managed database reached over HTTP.

mod postgrest;
mod sqlite;

pub use postgrest::PostgrestEmailStore;
pub use sqlite::SqliteEmailStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::Result;
use crate::email::{Email, EmailId, EmailPatch, EmailStatus, Priority, Sentiment};
use crate::query::EmailQuery;

/// Storage operations needed by the email service.
///
/// Lookups and updates return `Ok(None)` when no record has the given id;
/// they never create one.
#[async_trait]
pub trait EmailStore: Send + Sync {
    /// Short backend name reported by health checks.
    fn backend(&self) -> &'static str;

    /// Filtered page of emails, newest `sent_date` first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be queried.
    async fn list(&self, query: &EmailQuery) -> Result<Vec<Email>>;

    /// Fetch one email by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be queried.
    async fn get(&self, id: &EmailId) -> Result<Option<Email>>;

    /// Apply a partial update and return the stored record.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    async fn update(
        &self,
        id: &EmailId,
        patch: &EmailPatch,
        now: DateTime<Utc>,
    ) -> Result<Option<Email>>;

    /// Append one already-validated reply and mark the email replied.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    async fn append_reply(
        &self,
        id: &EmailId,
        reply: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Email>>;

    /// Persist a new email and return the stored record.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails or the id is taken.
    async fn insert(&self, email: &Email) -> Result<Email>;

    /// Number of emails, optionally restricted to one status.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be queried.
    async fn count(&self, status: Option<EmailStatus>) -> Result<u64>;

    /// Priority column of every email.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be queried.
    async fn priorities(&self) -> Result<Vec<Priority>>;

    /// Sentiment column of every email.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be queried.
    async fn sentiments(&self) -> Result<Vec<Sentiment>>;

    /// Sent dates at or after `since`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be queried.
    async fn sent_dates_since(&self, since: DateTime<Utc>) -> Result<Vec<DateTime<Utc>>>;
}
