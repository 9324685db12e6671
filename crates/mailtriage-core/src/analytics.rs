//! Aggregate projections over the email collection.
//!
//! Never stored: recomputed from the current collection on each request.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::email::{Email, EmailStatus, Priority, Sentiment};

/// Length of the trailing volume window, in days.
pub const VOLUME_WINDOW_DAYS: i64 = 7;

/// Dashboard analytics as returned by `GET /analytics`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    /// Number of emails.
    pub total_emails: u64,
    /// Emails with status `unread`.
    pub unread_emails: u64,
    /// Emails with status `replied`.
    pub replied_emails: u64,
    /// Email count per priority.
    pub priority_distribution: BTreeMap<Priority, u64>,
    /// Email count per sentiment.
    pub sentiment_distribution: BTreeMap<Sentiment, u64>,
    /// Email count per calendar day (`YYYY-MM-DD`) over the trailing window.
    pub email_volume: BTreeMap<String, u64>,
}

/// Row counts a store answers directly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    /// All emails.
    pub total: u64,
    /// Emails with status `unread`.
    pub unread: u64,
    /// Emails with status `replied`.
    pub replied: u64,
}

impl Analytics {
    /// Compute every aggregate over an in-memory collection.
    #[must_use]
    pub fn from_emails(emails: &[Email], now: DateTime<Utc>) -> Self {
        let since = volume_window_start(now);
        let count = |pred: fn(&Email) -> bool| emails.iter().filter(|e| pred(e)).count() as u64;

        reduce(
            StatusCounts {
                total: emails.len() as u64,
                unread: count(Email::is_unread),
                replied: count(|e| e.status == EmailStatus::Replied),
            },
            emails.iter().map(|e| e.priority),
            emails.iter().map(|e| e.sentiment),
            emails.iter().map(|e| e.sent_date).filter(|d| *d >= since),
        )
    }
}

/// Fold store-side counts and column loads into the analytics shape.
///
/// `sent_dates` must already be restricted to the volume window.
#[must_use]
pub fn reduce(
    counts: StatusCounts,
    priorities: impl IntoIterator<Item = Priority>,
    sentiments: impl IntoIterator<Item = Sentiment>,
    sent_dates: impl IntoIterator<Item = DateTime<Utc>>,
) -> Analytics {
    Analytics {
        total_emails: counts.total,
        unread_emails: counts.unread,
        replied_emails: counts.replied,
        priority_distribution: distribution(priorities),
        sentiment_distribution: distribution(sentiments),
        email_volume: volume_by_day(sent_dates),
    }
}

/// Start of the trailing volume window ending at `now`.
#[must_use]
pub fn volume_window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(VOLUME_WINDOW_DAYS)
}

/// Count occurrences of each value.
pub fn distribution<T: Ord>(values: impl IntoIterator<Item = T>) -> BTreeMap<T, u64> {
    values.into_iter().fold(BTreeMap::new(), |mut acc, v| {
        *acc.entry(v).or_insert(0) += 1;
        acc
    })
}

/// Bucket timestamps by UTC calendar day.
pub fn volume_by_day(dates: impl IntoIterator<Item = DateTime<Utc>>) -> BTreeMap<String, u64> {
    distribution(dates.into_iter().map(|d| d.format("%Y-%m-%d").to_string()))
}
