//! Multi-valued filters of the dashboard inbox.

use mailtriage_core::{Email, EmailStatus, Priority, Sentiment};

/// Criteria for [`super::Dashboard::filtered_emails`].
///
/// Each list keeps emails whose value is any of the listed ones; an empty
/// list does not filter. Lists are AND-combined with each other and with
/// `search`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardFilter {
    /// Accepted priorities.
    pub priority: Vec<Priority>,
    /// Accepted sentiments.
    pub sentiment: Vec<Sentiment>,
    /// Accepted categories.
    pub category: Vec<String>,
    /// Accepted statuses.
    pub status: Vec<EmailStatus>,
    /// Case-insensitive text searched in subject, sender name, sender
    /// address and body.
    pub search: Option<String>,
}

impl DashboardFilter {
    /// Whether `email` passes every criterion.
    #[must_use]
    pub fn matches(&self, email: &Email) -> bool {
        (self.priority.is_empty() || self.priority.contains(&email.priority))
            && (self.sentiment.is_empty() || self.sentiment.contains(&email.sentiment))
            && (self.category.is_empty()
                || email
                    .category
                    .as_ref()
                    .is_some_and(|c| self.category.contains(c)))
            && (self.status.is_empty() || self.status.contains(&email.status))
            && self
                .search
                .as_deref()
                .filter(|s| !s.is_empty())
                .is_none_or(|s| mentions(email, &s.to_lowercase()))
    }
}

fn mentions(email: &Email, needle: &str) -> bool {
    email.mentions(needle)
        || email
            .sender_name
            .as_deref()
            .is_some_and(|n| n.to_lowercase().contains(needle))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mailtriage_core::NewEmail;

    fn email() -> Email {
        NewEmail {
            sender_name: Some("Sarah Johnson".into()),
            category: Some("account_access".into()),
            priority: Some(Priority::Urgent),
            sentiment: Some(Sentiment::Negative),
            ..NewEmail::new("sarah.j@company.com", "Cannot log in", "Token expired")
        }
        .into_email(Utc::now())
        .unwrap()
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(DashboardFilter::default().matches(&email()));
    }

    #[test]
    fn test_lists_are_any_of() {
        let filter = DashboardFilter {
            priority: vec![Priority::High, Priority::Urgent],
            category: vec!["billing".into(), "account_access".into()],
            ..DashboardFilter::default()
        };
        assert!(filter.matches(&email()));

        let filter = DashboardFilter {
            sentiment: vec![Sentiment::Positive],
            ..DashboardFilter::default()
        };
        assert!(!filter.matches(&email()));
    }

    #[test]
    fn test_search_includes_sender_name() {
        let filter = DashboardFilter {
            search: Some("johnson".into()),
            ..DashboardFilter::default()
        };
        assert!(filter.matches(&email()));
    }

    #[test]
    fn test_category_filter_skips_uncategorized() {
        let mut e = email();
        e.category = None;
        let filter = DashboardFilter {
            category: vec!["account_access".into()],
            ..DashboardFilter::default()
        };
        assert!(!filter.matches(&e));
    }
}
