//! Email list view state.
//!
//! Holds the active query and the ids of the current page. Records live in
//! the shared [`EmailCache`], so status changes made elsewhere show up here.

use std::sync::Arc;

use mailtriage_core::{Email, EmailId, EmailQuery, EmailStatus};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::api::EmailApi;
use crate::cache::EmailCache;

/// State behind an email list: query, page, loading flag and last error.
pub struct EmailList {
    api: Arc<dyn EmailApi>,
    cache: Arc<EmailCache>,
    query: EmailQuery,
    ids: Vec<EmailId>,
    note: Option<String>,
    loading: watch::Sender<bool>,
    error: Option<String>,
}

impl EmailList {
    /// Create an empty list; call [`Self::refresh`] to load the first page.
    #[must_use]
    pub fn new(api: Arc<dyn EmailApi>, cache: Arc<EmailCache>, query: EmailQuery) -> Self {
        Self {
            api,
            cache,
            query,
            ids: Vec::new(),
            note: None,
            loading: watch::Sender::new(false),
            error: None,
        }
    }

    /// Active query.
    #[must_use]
    pub const fn query(&self) -> &EmailQuery {
        &self.query
    }

    /// Emails of the current page, in server order, read from the cache.
    #[must_use]
    pub fn emails(&self) -> Vec<Email> {
        self.ids.iter().filter_map(|id| self.cache.get(id)).collect()
    }

    /// Whether a fetch is in flight.
    #[must_use]
    pub fn loading(&self) -> bool {
        *self.loading.borrow()
    }

    /// Follow the loading flag while a fetch runs elsewhere.
    #[must_use]
    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }

    /// Message of the last failed operation.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Note attached by the server when it served sample data.
    #[must_use]
    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    /// Fetch the current page again, replacing it wholesale.
    pub async fn refresh(&mut self) {
        self.loading.send_replace(true);
        match self.api.list_emails(&self.query).await {
            Ok(page) => {
                debug!(count = page.emails.len(), "Fetched email page");
                self.ids = page.emails.iter().map(|e| e.id.clone()).collect();
                self.note = page.note;
                self.cache.upsert_many(page.emails);
                self.error = None;
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch emails");
                self.error = Some(e.to_string());
            }
        }
        self.loading.send_replace(false);
    }

    /// Switch to a new query; re-fetches only if it differs.
    pub async fn set_query(&mut self, query: EmailQuery) {
        if query == self.query {
            return;
        }
        self.query = query;
        self.refresh().await;
    }

    /// Change an email's status.
    ///
    /// The cache is updated first. On success the server's record replaces
    /// it; on failure the previous status is restored, the entry is marked
    /// stale and the error is kept in [`Self::error`].
    pub async fn update_status(&mut self, id: &EmailId, status: EmailStatus) {
        let previous = self.cache.set_status(id, status);

        match self.api.update_status(id, status).await {
            Ok(email) => {
                self.cache.upsert(email);
                self.error = None;
            }
            Err(e) => {
                warn!(id = %id, error = %e, "Status update failed, rolling back");
                if let Some(previous) = previous {
                    self.cache.set_status(id, previous);
                }
                self.cache.mark_stale(id);
                self.error = Some(e.to_string());
            }
        }
    }

    /// Append a reply and take the server's record as the new cached value.
    pub async fn add_reply(&mut self, id: &EmailId, reply: &str) {
        match self.api.add_reply(id, reply).await {
            Ok(email) => {
                self.cache.upsert(email);
                self.error = None;
            }
            Err(e) => {
                warn!(id = %id, error = %e, "Reply failed");
                self.error = Some(e.to_string());
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::LocalApi;
    use mailtriage_core::{NewEmail, Priority};
    use std::time::Duration;

    async fn setup() -> (Arc<LocalApi>, Arc<EmailCache>, EmailId) {
        let api = Arc::new(LocalApi::sqlite().await);
        let email = api
            .seed(NewEmail {
                priority: Some(Priority::Urgent),
                ..NewEmail::new("sarah@example.com", "Password reset", "Link expired")
            })
            .await;
        api.seed(NewEmail::new("mike@example.com", "Invoice", "Wrong amount"))
            .await;
        (api, Arc::new(EmailCache::new()), email.id)
    }

    #[tokio::test]
    async fn test_refresh_populates_page_and_cache() {
        let (api, cache, _) = setup().await;
        let mut list = EmailList::new(api, cache.clone(), EmailQuery::new());

        list.refresh().await;

        assert!(!list.loading());
        assert!(list.error().is_none());
        assert_eq!(list.emails().len(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_loading_is_visible_while_fetching() {
        let (api, cache, _) = setup().await;
        api.hold_lists(true);
        let mut list = EmailList::new(api.clone(), cache, EmailQuery::new());
        let mut loading = list.subscribe_loading();
        assert!(!*loading.borrow_and_update());

        let task = tokio::spawn(async move {
            list.refresh().await;
            list
        });

        tokio::time::timeout(Duration::from_secs(1), loading.wait_for(|l| *l))
            .await
            .unwrap()
            .unwrap();
        assert!(!task.is_finished());

        api.release_lists();
        let list = task.await.unwrap();
        assert!(!list.loading());
        assert!(!*loading.borrow());
        assert_eq!(list.emails().len(), 2);
    }

    #[tokio::test]
    async fn test_set_query_refetches_only_on_change() {
        let (api, cache, _) = setup().await;
        let mut list = EmailList::new(api.clone(), cache, EmailQuery::new());
        list.refresh().await;
        assert_eq!(api.list_calls(), 1);

        list.set_query(EmailQuery::new()).await;
        assert_eq!(api.list_calls(), 1);

        list.set_query(EmailQuery::new().with_priority(Priority::Urgent))
            .await;
        assert_eq!(api.list_calls(), 2);
        assert_eq!(list.emails().len(), 1);
    }

    #[tokio::test]
    async fn test_update_status_reconciles_with_server() {
        let (api, cache, id) = setup().await;
        let mut list = EmailList::new(api, cache.clone(), EmailQuery::new());
        list.refresh().await;
        let before = cache.get(&id).unwrap().updated_at;

        list.update_status(&id, EmailStatus::InProgress).await;

        let email = cache.get(&id).unwrap();
        assert_eq!(email.status, EmailStatus::InProgress);
        assert!(email.updated_at >= before);
        assert!(!cache.is_stale(&id));
        assert!(list.error().is_none());
    }

    #[tokio::test]
    async fn test_failed_update_rolls_back_and_marks_stale() {
        let (api, cache, id) = setup().await;
        let mut list = EmailList::new(api.clone(), cache.clone(), EmailQuery::new());
        list.refresh().await;
        api.fail_writes(true);

        list.update_status(&id, EmailStatus::Resolved).await;

        assert_eq!(cache.get(&id).unwrap().status, EmailStatus::Unread);
        assert!(cache.is_stale(&id));
        assert!(list.error().is_some());
    }

    #[tokio::test]
    async fn test_add_reply_replaces_cached_record() {
        let (api, cache, id) = setup().await;
        let mut list = EmailList::new(api, cache.clone(), EmailQuery::new());
        list.refresh().await;

        list.add_reply(&id, "Sorry about that").await;
        list.add_reply(&id, "Thanks, fixed!").await;

        let email = cache.get(&id).unwrap();
        assert_eq!(email.replies.encode(), "Sorry about that|Thanks, fixed!");
        assert_eq!(email.status, EmailStatus::Replied);
    }

    #[tokio::test]
    async fn test_rejected_reply_is_captured() {
        let (api, cache, id) = setup().await;
        let mut list = EmailList::new(api, cache.clone(), EmailQuery::new());
        list.refresh().await;

        list.add_reply(&id, "a|b").await;

        assert!(list.error().is_some());
        assert!(cache.get(&id).unwrap().replies.is_empty());
    }

    #[tokio::test]
    async fn test_lists_share_one_cache() {
        let (api, cache, id) = setup().await;
        let mut all = EmailList::new(api.clone(), cache.clone(), EmailQuery::new());
        let mut urgent = EmailList::new(
            api,
            cache,
            EmailQuery::new().with_priority(Priority::Urgent),
        );
        all.refresh().await;
        urgent.refresh().await;

        all.update_status(&id, EmailStatus::Archived).await;

        assert_eq!(urgent.emails()[0].status, EmailStatus::Archived);
    }
}
