//! Dashboard state: emails in the shared cache plus headline figures.
//!
//! Seeded from a [`DashboardData`] snapshot (the bundled dataset by
//! default). Mutations go to the shared [`EmailCache`], so email lists
//! built on the same cache see them too.

mod filter;
mod model;

pub use filter::DashboardFilter;
pub use model::{
    ChartSlice, DashboardAnalytics, DashboardData, DashboardStats, FilterVocabulary, HeatmapRow,
    SentimentShare, StatTrends, TeamMember, TopIssue, VolumePoint,
};

use std::sync::{Arc, PoisonError, RwLock};

use mailtriage_core::{AiDraft, Email, EmailId, EmailStatus, Priority};
use tokio::sync::watch;
use tracing::debug;

use crate::cache::EmailCache;
use crate::{ClientError, Result};

/// Figures that accompany the emails but are not stored per email.
#[derive(Debug, Clone)]
struct Overview {
    stats: DashboardStats,
    analytics: DashboardAnalytics,
    filters: FilterVocabulary,
}

/// Aggregate dashboard state over a shared email cache.
#[derive(Debug)]
pub struct Dashboard {
    cache: Arc<EmailCache>,
    overview: RwLock<Option<Overview>>,
}

impl Dashboard {
    /// Create an empty dashboard over `cache`.
    #[must_use]
    pub const fn new(cache: Arc<EmailCache>) -> Self {
        Self {
            cache,
            overview: RwLock::new(None),
        }
    }

    /// Create a dashboard seeded with the bundled dataset.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Dataset` if the bundled file does not parse.
    pub fn bundled(cache: Arc<EmailCache>) -> Result<Self> {
        let dashboard = Self::new(cache);
        dashboard.load(DashboardData::bundled()?);
        Ok(dashboard)
    }

    /// Replace the whole snapshot and notify subscribers.
    pub fn load(&self, data: DashboardData) {
        debug!(emails = data.emails.len(), "Loading dashboard data");
        *self.overview.write().unwrap_or_else(PoisonError::into_inner) = Some(Overview {
            stats: data.stats,
            analytics: data.analytics,
            filters: data.filters,
        });
        self.cache.replace(data.emails);
    }

    /// Whether a snapshot has been loaded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.overview().is_some()
    }

    /// Receiver that wakes whenever the emails change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.cache.subscribe()
    }

    /// Change one email's status.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::UnknownEmail` if the email is not loaded.
    pub fn update_email_status(&self, id: &EmailId, status: EmailStatus) -> Result<()> {
        self.cache
            .set_status(id, status)
            .map(|_| ())
            .ok_or_else(|| ClientError::UnknownEmail(id.clone()))
    }

    /// Attach an AI draft to one email.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::UnknownEmail` if the email is not loaded.
    pub fn add_ai_response(&self, id: &EmailId, draft: AiDraft) -> Result<()> {
        if self.cache.set_ai_response(id, Some(draft)) {
            Ok(())
        } else {
            Err(ClientError::UnknownEmail(id.clone()))
        }
    }

    /// All emails, newest first.
    #[must_use]
    pub fn emails(&self) -> Vec<Email> {
        self.cache.snapshot()
    }

    /// Emails passing `filter`, newest first.
    #[must_use]
    pub fn filtered_emails(&self, filter: &DashboardFilter) -> Vec<Email> {
        self.cache
            .snapshot()
            .into_iter()
            .filter(|e| filter.matches(e))
            .collect()
    }

    /// Emails with exactly this priority, newest first.
    #[must_use]
    pub fn emails_by_priority(&self, priority: Priority) -> Vec<Email> {
        self.cache
            .snapshot()
            .into_iter()
            .filter(|e| e.priority == priority)
            .collect()
    }

    /// Headline numbers, once loaded.
    #[must_use]
    pub fn stats(&self) -> Option<DashboardStats> {
        self.overview().map(|o| o.stats)
    }

    /// Chart data, once loaded.
    #[must_use]
    pub fn analytics(&self) -> Option<DashboardAnalytics> {
        self.overview().map(|o| o.analytics)
    }

    /// Filter vocabulary, once loaded.
    #[must_use]
    pub fn filters(&self) -> Option<FilterVocabulary> {
        self.overview().map(|o| o.filters)
    }

    /// Current snapshot, once loaded.
    #[must_use]
    pub fn data(&self) -> Option<DashboardData> {
        self.overview().map(|o| DashboardData {
            emails: self.emails(),
            stats: o.stats,
            analytics: o.analytics,
            filters: o.filters,
        })
    }

    fn overview(&self) -> Option<Overview> {
        self.overview
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use mailtriage_core::email::Tone;

    fn dashboard() -> (Dashboard, Arc<EmailCache>) {
        let cache = Arc::new(EmailCache::new());
        (Dashboard::bundled(cache.clone()).unwrap(), cache)
    }

    #[test]
    fn test_empty_until_loaded() {
        let dashboard = Dashboard::new(Arc::new(EmailCache::new()));
        assert!(!dashboard.is_loaded());
        assert!(dashboard.stats().is_none());
        assert!(dashboard.emails().is_empty());
    }

    #[test]
    fn test_bundled_is_loaded() {
        let (dashboard, cache) = dashboard();
        assert!(dashboard.is_loaded());
        assert_eq!(cache.len(), 2);
        assert_eq!(dashboard.stats().unwrap().total_emails, 1247);
        assert_eq!(dashboard.filters().unwrap().time_ranges.len(), 5);
    }

    #[test]
    fn test_update_status_is_shared_through_cache() {
        let (dashboard, cache) = dashboard();
        let id = EmailId::new("1");

        dashboard
            .update_email_status(&id, EmailStatus::InProgress)
            .unwrap();
        assert_eq!(cache.get(&id).unwrap().status, EmailStatus::InProgress);

        let err = dashboard
            .update_email_status(&EmailId::new("99"), EmailStatus::Read)
            .unwrap_err();
        assert!(matches!(err, ClientError::UnknownEmail(_)));
    }

    #[test]
    fn test_add_ai_response() {
        let (dashboard, _) = dashboard();
        let id = EmailId::new("2");
        let draft = AiDraft {
            generated_reply: "Hi Mike, we've corrected the invoice.".into(),
            tone: Tone::Professional,
            confidence: 0.88,
            suggestions: vec!["Confirm the new amount".into()],
            templates: vec!["billing-correction".into()],
        };

        dashboard.add_ai_response(&id, draft.clone()).unwrap();
        let email = dashboard
            .emails()
            .into_iter()
            .find(|e| e.id == id)
            .unwrap();
        assert_eq!(email.enrichment.ai_response, Some(draft));
    }

    #[test]
    fn test_filters_and_priority_views() {
        let (dashboard, _) = dashboard();

        let billing = dashboard.filtered_emails(&DashboardFilter {
            category: vec!["billing".into()],
            ..DashboardFilter::default()
        });
        assert_eq!(billing.len(), 1);
        assert_eq!(billing[0].id.as_str(), "2");

        let urgent = dashboard.emails_by_priority(Priority::Urgent);
        assert_eq!(urgent.len(), 1);
        assert!(dashboard.emails_by_priority(Priority::Low).is_empty());

        let by_name = dashboard.filtered_emails(&DashboardFilter {
            search: Some("mike chen".into()),
            ..DashboardFilter::default()
        });
        assert_eq!(by_name.len(), 1);
    }

    #[tokio::test]
    async fn test_subscribers_see_mutations() {
        let (dashboard, _) = dashboard();
        let mut rx = dashboard.subscribe();

        dashboard
            .update_email_status(&EmailId::new("1"), EmailStatus::Resolved)
            .unwrap();

        rx.changed().await.unwrap();
        let status = dashboard.emails()[0].status;
        assert_eq!(status, EmailStatus::Resolved);
    }

    #[test]
    fn test_reload_replaces_snapshot() {
        let (dashboard, cache) = dashboard();
        let mut data = dashboard.data().unwrap();
        data.emails.truncate(1);
        data.stats.urgent_queue = 0;

        dashboard.load(data);

        assert_eq!(cache.len(), 1);
        assert_eq!(dashboard.stats().unwrap().urgent_queue, 0);
    }
}
