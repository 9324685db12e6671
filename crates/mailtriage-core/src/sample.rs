//! Fixed sample set served when the store is unconfigured or unreachable.

use chrono::{DateTime, Duration, Utc};

use crate::email::{Email, EmailId, EmailStatus, Enrichment, Priority, Replies, Sentiment};

/// The three fallback records, timestamped relative to `now`.
#[must_use]
pub fn sample_emails(now: DateTime<Utc>) -> Vec<Email> {
    vec![
        sample(
            "1",
            "sarah.j@company.com",
            "Unable to access my account after password reset",
            "Hi, I tried to reset my password yesterday but I'm still unable to log in. \
             The reset email arrived but when I click the link it says 'Invalid or expired token'. \
             I've tried this multiple times and cleared my browser cache...",
            now - Duration::minutes(2),
            Priority::Urgent,
            Sentiment::Negative,
            EmailStatus::Unread,
            &["account", "technical"],
            now,
        ),
        sample(
            "2",
            "mike.chen@startup.io",
            "Billing discrepancy on latest invoice #INV-2024-0847",
            "Hello, I noticed there's a charge on my latest invoice that doesn't match our agreed \
             pricing plan. The invoice shows $299/month but our contract specifies $199/month for \
             the Pro plan. Could you please review this and issue a correction?",
            now - Duration::minutes(15),
            Priority::High,
            Sentiment::Neutral,
            EmailStatus::Unread,
            &["billing"],
            now,
        ),
        sample(
            "3",
            "emma.w@design.co",
            "Feature request: Dark mode support",
            "Love the platform! Would it be possible to add dark mode support? Many of our team \
             members work late hours and would appreciate a darker interface. We'd also love to \
             see custom theme options if possible.",
            now - Duration::minutes(60),
            Priority::Medium,
            Sentiment::Positive,
            EmailStatus::Read,
            &["feature-request"],
            now,
        ),
    ]
}

#[allow(clippy::too_many_arguments)]
fn sample(
    id: &str,
    sender: &str,
    subject: &str,
    body: &str,
    sent_date: DateTime<Utc>,
    priority: Priority,
    sentiment: Sentiment,
    status: EmailStatus,
    tags: &[&str],
    now: DateTime<Utc>,
) -> Email {
    Email {
        id: EmailId::new(id),
        sender: sender.to_string(),
        sender_name: None,
        subject: subject.to_string(),
        body: body.to_string(),
        sent_date,
        replies: Replies::new(),
        priority,
        sentiment,
        sentiment_confidence: None,
        category: None,
        status,
        tags: tags.iter().map(ToString::to_string).collect(),
        enrichment: Enrichment::default(),
        created_at: now,
        updated_at: now,
    }
}
