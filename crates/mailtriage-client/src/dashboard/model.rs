//! Dashboard snapshot: emails plus precomputed headline figures.

use std::collections::BTreeMap;

use mailtriage_core::Email;
use serde::{Deserialize, Serialize};

use crate::{ClientError, Result};

const BUNDLED: &str = include_str!("../../data/dashboard.json");

/// Headline numbers shown above the inbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    /// All-time email count.
    pub total_emails: u64,
    /// Emails received today.
    pub emails_today: u64,
    /// Emails waiting in the urgent queue.
    pub urgent_queue: u64,
    /// Average first response time, preformatted (`2.1h`).
    pub avg_response_time: String,
    /// Mean satisfaction score (0.0 - 5.0).
    pub satisfaction_score: f32,
    /// Share of resolved emails, in percent.
    pub resolution_rate: f32,
    /// Change of each figure versus the previous period, in percent.
    pub trends: StatTrends,
}

/// Period-over-period change of the headline numbers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatTrends {
    /// Email count change.
    pub total_emails: f32,
    /// Response time change.
    pub avg_response_time: f32,
    /// Satisfaction change.
    pub satisfaction_score: f32,
    /// Resolution rate change.
    pub resolution_rate: f32,
}

/// Emails received and resolved on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumePoint {
    /// Display label of the day.
    pub date: String,
    /// Emails received.
    pub emails: u64,
    /// Emails resolved.
    pub resolved: u64,
}

/// One slice of a distribution chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartSlice {
    /// Label.
    pub name: String,
    /// Count.
    pub value: u64,
    /// Display color (`#RRGGBB`).
    pub color: String,
}

/// Count and share of one sentiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentShare {
    /// Label.
    pub sentiment: String,
    /// Count.
    pub count: u64,
    /// Share, in percent.
    pub percentage: f32,
}

/// Average response time per weekday for one hour of the day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapRow {
    /// Hour label (`9 AM`).
    pub hour: String,
    /// Hours to respond, keyed by weekday abbreviation.
    #[serde(flatten)]
    pub days: BTreeMap<String, f32>,
}

/// A frequent topic for the issue cloud.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopIssue {
    /// Topic label.
    pub text: String,
    /// Display weight.
    pub size: u32,
    /// Display color.
    pub color: String,
    /// Occurrences.
    pub count: u64,
}

/// One agent on the team leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    /// Agent identifier.
    pub id: String,
    /// Agent name.
    pub name: String,
    /// Avatar location.
    pub avatar: String,
    /// Emails handled this period.
    pub emails_handled: u64,
    /// Average response time, preformatted.
    pub avg_response_time: String,
    /// Satisfaction score (0.0 - 5.0).
    pub satisfaction: f32,
    /// Progress towards the period goal, in percent.
    pub goal_progress: u32,
    /// Badge earned, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
}

/// Chart data of the analytics panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardAnalytics {
    /// Daily volume.
    pub email_volume: Vec<VolumePoint>,
    /// Emails per priority.
    pub priority_distribution: Vec<ChartSlice>,
    /// Emails per sentiment.
    pub sentiment_analysis: Vec<SentimentShare>,
    /// Response time by hour and weekday.
    pub response_time_heatmap: Vec<HeatmapRow>,
    /// Frequent topics.
    pub top_issues: Vec<TopIssue>,
    /// Agent ranking.
    pub team_leaderboard: Vec<TeamMember>,
}

/// Values offered by the filter controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterVocabulary {
    /// Category names.
    pub categories: Vec<String>,
    /// Sentiment names.
    pub sentiments: Vec<String>,
    /// Priority names.
    pub priorities: Vec<String>,
    /// Time range names.
    pub time_ranges: Vec<String>,
}

/// Everything the dashboard shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardData {
    /// Emails.
    pub emails: Vec<Email>,
    /// Headline numbers.
    pub stats: DashboardStats,
    /// Chart data.
    pub analytics: DashboardAnalytics,
    /// Filter vocabulary.
    pub filters: FilterVocabulary,
}

impl DashboardData {
    /// The dataset shipped with the crate.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Dataset` if the bundled file does not parse.
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED)
    }

    /// Parse a dataset from JSON.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Dataset` if the document does not have the
    /// dashboard shape.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ClientError::Dataset(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use mailtriage_core::{EmailStatus, Priority};

    #[test]
    fn test_bundled_dataset_parses() {
        let data = DashboardData::bundled().unwrap();

        assert_eq!(data.emails.len(), 2);
        assert_eq!(data.emails[0].priority, Priority::Urgent);
        assert_eq!(data.emails[0].status, EmailStatus::Unread);
        assert!(data.emails[1].enrichment.has_attachments());
        assert_eq!(data.stats.urgent_queue, 12);
        assert_eq!(data.analytics.email_volume.len(), 7);
        assert_eq!(data.analytics.response_time_heatmap[0].days["Mon"], 2.1);
        assert_eq!(data.filters.priorities, ["urgent", "high", "medium", "low"]);
    }

    #[test]
    fn test_bad_dataset_is_reported() {
        let err = DashboardData::from_json("{\"emails\": 3}").unwrap_err();
        assert!(matches!(err, ClientError::Dataset(_)));
    }
}
