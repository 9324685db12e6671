//! Email repository service: the operations behind the REST surface.
//!
//! Wraps an optional [`EmailStore`]. Without a store, reads are answered
//! from the fixed sample set and writes fail with [`Error::NotConfigured`].
//! A store failure on listing also falls back to the sample set; every
//! other store failure is returned to the caller. Nothing is retried.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::analytics::{self, Analytics, StatusCounts};
use crate::email::{Email, EmailId, EmailPatch, EmailStatus, NewEmail, validate_reply};
use crate::query::EmailQuery;
use crate::sample::sample_emails;
use crate::store::EmailStore;
use crate::{Error, Result};

/// Note attached to listings served without a configured store.
pub const NOTE_UNCONFIGURED: &str = "Using mock data - store not configured";

/// Note attached to listings served after a store failure.
pub const NOTE_STORE_ERROR: &str = "Using mock data due to store error";

/// One page of emails, possibly served from the sample set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailPage {
    /// Matching emails, newest first.
    pub emails: Vec<Email>,
    /// Present when the page came from the sample set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl EmailPage {
    /// Whether this page came from the sample set instead of the store.
    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        self.note.is_some()
    }
}

/// Repository operations over the configured store.
#[derive(Clone)]
pub struct EmailService {
    store: Option<Arc<dyn EmailStore>>,
}

impl EmailService {
    /// Create a service backed by `store`.
    #[must_use]
    pub fn new(store: Arc<dyn EmailStore>) -> Self {
        Self { store: Some(store) }
    }

    /// Create a service with no store: sample reads, failing writes.
    #[must_use]
    pub fn unconfigured() -> Self {
        Self { store: None }
    }

    /// Whether a store is attached.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.store.is_some()
    }

    /// Backend name for health reporting.
    #[must_use]
    pub fn backend(&self) -> &'static str {
        self.store.as_ref().map_or("unconfigured", |s| s.backend())
    }

    fn store(&self) -> Result<&Arc<dyn EmailStore>> {
        self.store.as_ref().ok_or(Error::NotConfigured)
    }

    /// List emails matching `query`. Never fails: falls back to the sample set.
    pub async fn list_emails(&self, query: &EmailQuery) -> EmailPage {
        let Some(store) = &self.store else {
            warn!("Store not configured, serving sample emails");
            return fallback_page(query, NOTE_UNCONFIGURED);
        };

        if query.matches_nothing {
            debug!("Query matches nothing, skipping store");
            return EmailPage {
                emails: Vec::new(),
                note: None,
            };
        }

        match store.list(query).await {
            Ok(emails) => {
                debug!(count = emails.len(), "Listed emails");
                EmailPage { emails, note: None }
            }
            Err(e) => {
                warn!(error = %e, "Store list failed, serving sample emails");
                fallback_page(query, NOTE_STORE_ERROR)
            }
        }
    }

    /// Fetch one email.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if no email has this id, or the store error.
    pub async fn get_email(&self, id: &EmailId) -> Result<Email> {
        let found = match &self.store {
            Some(store) => store.get(id).await?,
            None => sample_emails(Utc::now()).into_iter().find(|e| &e.id == id),
        };
        found.ok_or_else(|| Error::NotFound(id.clone()))
    }

    /// Apply a partial update; never creates a record.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotConfigured` without a store, `Error::NotFound` if
    /// no email has this id, or the store error.
    pub async fn update_email(&self, id: &EmailId, patch: &EmailPatch) -> Result<Email> {
        let store = self.store()?;
        let email = store
            .update(id, patch, Utc::now())
            .await?
            .ok_or_else(|| Error::NotFound(id.clone()))?;

        info!(id = %id, status = %email.status, "Updated email");
        Ok(email)
    }

    /// Append a reply and mark the email `replied`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` for a blank reply or one containing `|`,
    /// `Error::NotConfigured` without a store, `Error::NotFound` if no email
    /// has this id, or the store error.
    pub async fn append_reply(&self, id: &EmailId, reply: &str) -> Result<Email> {
        validate_reply(reply)?;
        let store = self.store()?;
        let email = store
            .append_reply(id, reply, Utc::now())
            .await?
            .ok_or_else(|| Error::NotFound(id.clone()))?;

        info!(id = %id, replies = email.replies.len(), "Appended reply");
        Ok(email)
    }

    /// Create an email from a partial record.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotConfigured` without a store, `Error::InvalidInput`
    /// for a blank sender or taken id, or the store error.
    pub async fn create_email(&self, new: NewEmail) -> Result<Email> {
        let store = self.store()?;
        let email = new.into_email(Utc::now())?;
        let email = store.insert(&email).await?;

        info!(id = %email.id, priority = %email.priority, "Created email");
        Ok(email)
    }

    /// Bulk-create emails, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first error hit, as for [`Self::create_email`].
    pub async fn import(&self, emails: Vec<NewEmail>) -> Result<usize> {
        let store = self.store()?;
        let now = Utc::now();
        let mut inserted = 0;
        for new in emails {
            store.insert(&new.into_email(now)?).await?;
            inserted += 1;
        }

        info!(inserted, "Imported emails");
        Ok(inserted)
    }

    /// Dashboard analytics over the whole collection.
    ///
    /// # Errors
    ///
    /// Returns the store error if any aggregate query fails.
    pub async fn analytics(&self) -> Result<Analytics> {
        self.analytics_at(Utc::now()).await
    }

    async fn analytics_at(&self, now: DateTime<Utc>) -> Result<Analytics> {
        let Some(store) = &self.store else {
            return Ok(Analytics::from_emails(&sample_emails(now), now));
        };

        let (total, unread, replied, priorities, sentiments, sent_dates) = tokio::try_join!(
            store.count(None),
            store.count(Some(EmailStatus::Unread)),
            store.count(Some(EmailStatus::Replied)),
            store.priorities(),
            store.sentiments(),
            store.sent_dates_since(analytics::volume_window_start(now)),
        )?;

        Ok(analytics::reduce(
            StatusCounts {
                total,
                unread,
                replied,
            },
            priorities,
            sentiments,
            sent_dates,
        ))
    }
}

fn fallback_page(query: &EmailQuery, note: &str) -> EmailPage {
    EmailPage {
        emails: query.apply(&sample_emails(Utc::now())),
        note: Some(note.to_string()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::email::{Priority, Sentiment};
    use crate::store::SqliteEmailStore;
    use async_trait::async_trait;
    use chrono::Duration;

    /// Store whose every call fails.
    struct BrokenStore;

    fn broken() -> Error {
        Error::Store {
            status: 503,
            message: "unavailable".to_string(),
        }
    }

    #[async_trait]
    impl EmailStore for BrokenStore {
        fn backend(&self) -> &'static str {
            "broken"
        }
        async fn list(&self, _: &EmailQuery) -> Result<Vec<Email>> {
            Err(broken())
        }
        async fn get(&self, _: &EmailId) -> Result<Option<Email>> {
            Err(broken())
        }
        async fn update(
            &self,
            _: &EmailId,
            _: &EmailPatch,
            _: DateTime<Utc>,
        ) -> Result<Option<Email>> {
            Err(broken())
        }
        async fn append_reply(&self, _: &EmailId, _: &str, _: DateTime<Utc>) -> Result<Option<Email>> {
            Err(broken())
        }
        async fn insert(&self, _: &Email) -> Result<Email> {
            Err(broken())
        }
        async fn count(&self, _: Option<EmailStatus>) -> Result<u64> {
            Err(broken())
        }
        async fn priorities(&self) -> Result<Vec<Priority>> {
            Err(broken())
        }
        async fn sentiments(&self) -> Result<Vec<Sentiment>> {
            Err(broken())
        }
        async fn sent_dates_since(&self, _: DateTime<Utc>) -> Result<Vec<DateTime<Utc>>> {
            Err(broken())
        }
    }

    async fn service() -> EmailService {
        let store = SqliteEmailStore::in_memory().await.unwrap();
        EmailService::new(Arc::new(store))
    }

    async fn create(service: &EmailService, subject: &str, body: &str) -> Email {
        service
            .create_email(NewEmail::new("customer@example.com", subject, body))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_unconfigured_list_serves_filtered_samples() {
        let service = EmailService::unconfigured();

        let page = service.list_emails(&EmailQuery::new()).await;
        assert_eq!(page.emails.len(), 3);
        assert_eq!(page.note.as_deref(), Some(NOTE_UNCONFIGURED));

        let page = service
            .list_emails(&EmailQuery::new().with_priority(Priority::Urgent))
            .await;
        assert_eq!(page.emails.len(), 1);
        assert_eq!(page.emails[0].id.as_str(), "1");
    }

    #[tokio::test]
    async fn test_store_error_list_falls_back() {
        let service = EmailService::new(Arc::new(BrokenStore));
        let page = service
            .list_emails(&EmailQuery::new().with_search("invoice"))
            .await;

        assert!(page.is_fallback());
        assert_eq!(page.note.as_deref(), Some(NOTE_STORE_ERROR));
        assert_eq!(page.emails.len(), 1);
        assert_eq!(page.emails[0].id.as_str(), "2");
    }

    #[tokio::test]
    async fn test_unknown_filter_value_lists_nothing() {
        let raw = crate::query::RawEmailQuery {
            status: Some("pending".into()),
            ..Default::default()
        };
        let query = EmailQuery::try_from(raw).unwrap();

        let page = EmailService::unconfigured().list_emails(&query).await;
        assert!(page.emails.is_empty());
        assert_eq!(page.note.as_deref(), Some(NOTE_UNCONFIGURED));

        let service = EmailService::new(Arc::new(BrokenStore));
        let page = service.list_emails(&query).await;
        assert!(page.emails.is_empty());
        assert!(!page.is_fallback());
    }

    #[tokio::test]
    async fn test_store_error_on_get_is_surfaced() {
        let service = EmailService::new(Arc::new(BrokenStore));
        let err = service.get_email(&EmailId::new("1")).await.unwrap_err();
        assert!(matches!(err, Error::Store { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_unconfigured_get_uses_samples() {
        let service = EmailService::unconfigured();
        let email = service.get_email(&EmailId::new("3")).await.unwrap();
        assert_eq!(email.sender, "emma.w@design.co");

        let err = service.get_email(&EmailId::new("4")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_unconfigured_writes_fail() {
        let service = EmailService::unconfigured();
        let id = EmailId::new("1");

        assert!(matches!(
            service.update_email(&id, &EmailPatch::status(EmailStatus::Read)).await,
            Err(Error::NotConfigured)
        ));
        assert!(matches!(
            service.append_reply(&id, "hello").await,
            Err(Error::NotConfigured)
        ));
        assert!(matches!(
            service.create_email(NewEmail::new("a@b.c", "s", "b")).await,
            Err(Error::NotConfigured)
        ));
    }

    #[tokio::test]
    async fn test_reply_scenario() {
        let service = service().await;
        let email = create(&service, "Export broken", "The CSV export fails").await;

        service
            .append_reply(&email.id, "Sorry about that")
            .await
            .unwrap();
        let email = service
            .append_reply(&email.id, "Thanks, fixed!")
            .await
            .unwrap();

        assert_eq!(email.replies.encode(), "Sorry about that|Thanks, fixed!");
        assert_eq!(email.status, EmailStatus::Replied);
    }

    #[tokio::test]
    async fn test_invalid_reply_is_rejected_before_store() {
        let service = EmailService::new(Arc::new(BrokenStore));
        let id = EmailId::new("1");

        assert!(matches!(
            service.append_reply(&id, "a|b").await,
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            service.append_reply(&id, "").await,
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_id_creates_nothing() {
        let service = service().await;
        create(&service, "Hi", "There").await;
        let ghost = EmailId::new("ghost");

        let err = service
            .update_email(&ghost, &EmailPatch::status(EmailStatus::Resolved))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(service.append_reply(&ghost, "hi").await.unwrap_err().is_not_found());
        assert!(service.get_email(&ghost).await.unwrap_err().is_not_found());

        let page = service.list_emails(&EmailQuery::new()).await;
        assert_eq!(page.emails.len(), 1);
        assert!(!page.is_fallback());
    }

    #[tokio::test]
    async fn test_updated_at_is_monotonic() {
        let service = service().await;
        let email = create(&service, "Hi", "There").await;

        let first = service
            .update_email(&email.id, &EmailPatch::status(EmailStatus::Read))
            .await
            .unwrap();
        let second = service.append_reply(&email.id, "Done").await.unwrap();

        assert!(first.updated_at >= email.updated_at);
        assert!(second.updated_at >= first.updated_at);
    }

    #[tokio::test]
    async fn test_create_classifies_missing_labels() {
        let service = service().await;
        let email = create(
            &service,
            "URGENT: cannot login",
            "My password reset is broken",
        )
        .await;

        assert_eq!(email.priority, Priority::Urgent);
        assert_eq!(email.sentiment, Sentiment::Negative);
        assert_eq!(email.tags, vec!["authentication"]);
        assert_eq!(email.status, EmailStatus::Unread);
    }

    #[tokio::test]
    async fn test_urgent_password_search() {
        let service = service().await;
        let base = Utc::now();
        for (subject, priority, minutes) in [
            ("Password reset link expired", Priority::Urgent, 1),
            ("Password strength rules", Priority::Low, 2),
            ("Server down", Priority::Urgent, 3),
        ] {
            service
                .create_email(NewEmail {
                    priority: Some(priority),
                    sent_date: Some(base - Duration::minutes(minutes)),
                    ..NewEmail::new("x@example.com", subject, "details")
                })
                .await
                .unwrap();
        }

        let query = EmailQuery::new()
            .with_priority(Priority::Urgent)
            .with_search("password");
        let page = service.list_emails(&query).await;

        assert_eq!(page.emails.len(), 1);
        assert_eq!(page.emails[0].subject, "Password reset link expired");
    }

    #[tokio::test]
    async fn test_import_counts_inserted() {
        let service = service().await;
        let inserted = service
            .import(vec![
                NewEmail::new("a@example.com", "One", "first"),
                NewEmail::new("b@example.com", "Two", "second"),
            ])
            .await
            .unwrap();

        assert_eq!(inserted, 2);
        assert_eq!(service.list_emails(&EmailQuery::new()).await.emails.len(), 2);
    }

    #[tokio::test]
    async fn test_analytics_from_store() {
        let service = service().await;
        let now = Utc::now();
        let a = create(&service, "Hi", "Thanks, great work").await;
        create(&service, "Question", "Some info please").await;
        service
            .create_email(NewEmail {
                sent_date: Some(now - Duration::days(10)),
                ..NewEmail::new("old@example.com", "Old", "archived thread")
            })
            .await
            .unwrap();
        service.append_reply(&a.id, "Glad to help").await.unwrap();

        let analytics = service.analytics_at(now).await.unwrap();
        assert_eq!(analytics.total_emails, 3);
        assert_eq!(analytics.unread_emails, 2);
        assert_eq!(analytics.replied_emails, 1);
        assert_eq!(analytics.priority_distribution.values().sum::<u64>(), 3);
        assert_eq!(analytics.email_volume.values().sum::<u64>(), 2);
    }

    #[tokio::test]
    async fn test_analytics_unconfigured_uses_samples() {
        let analytics = EmailService::unconfigured().analytics().await.unwrap();
        assert_eq!(analytics.total_emails, 3);
        assert_eq!(analytics.unread_emails, 2);
    }

    #[tokio::test]
    async fn test_analytics_store_error_is_surfaced() {
        let service = EmailService::new(Arc::new(BrokenStore));
        assert!(service.analytics().await.is_err());
    }

    #[test]
    fn test_backend_names() {
        assert_eq!(EmailService::unconfigured().backend(), "unconfigured");
        assert_eq!(EmailService::new(Arc::new(BrokenStore)).backend(), "broken");
    }
}
