//! Email record and its classification enums.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enrichment::Enrichment;
use super::replies::Replies;

/// Opaque unique identifier for an email record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmailId(pub String);

impl EmailId {
    /// Create an email ID from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EmailId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EmailId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A string did not name any variant of a classification enum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value:?}")]
pub struct ParseEnumError {
    /// Which enum was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Urgency classification driving queue ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Needs attention right now.
    Urgent,
    /// Important, handle soon.
    High,
    /// Normal queue position.
    #[default]
    Medium,
    /// Can wait.
    Low,
}

impl Priority {
    /// Every priority, most urgent first.
    pub const ALL: [Self; 4] = [Self::Urgent, Self::High, Self::Medium, Self::Low];

    /// Convert to database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Urgent => "urgent",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "urgent" => Ok(Self::Urgent),
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            _ => Err(ParseEnumError::new("priority", s)),
        }
    }
}

/// Emotional tone of an email's content.
///
/// The three-valued scale used by simpler ingestion paths
/// (`positive`, `neutral`, `negative`) is a subset of this one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    /// Enthusiastic.
    VeryPositive,
    /// Friendly or satisfied.
    Positive,
    /// No clear tone.
    #[default]
    Neutral,
    /// Frustrated or unhappy.
    Negative,
    /// Angry.
    VeryNegative,
}

impl Sentiment {
    /// Every sentiment, most positive first.
    pub const ALL: [Self; 5] = [
        Self::VeryPositive,
        Self::Positive,
        Self::Neutral,
        Self::Negative,
        Self::VeryNegative,
    ];

    /// Convert to database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::VeryPositive => "very_positive",
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
            Self::VeryNegative => "very_negative",
        }
    }
}

impl std::str::FromStr for Sentiment {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "very_positive" => Ok(Self::VeryPositive),
            "positive" => Ok(Self::Positive),
            "neutral" => Ok(Self::Neutral),
            "negative" => Ok(Self::Negative),
            "very_negative" => Ok(Self::VeryNegative),
            _ => Err(ParseEnumError::new("sentiment", s)),
        }
    }
}

/// Workflow state of an email.
///
/// Transitions are not restricted: any status may replace any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailStatus {
    /// Not opened yet.
    #[default]
    Unread,
    /// Opened by an agent.
    Read,
    /// An agent is working on it.
    InProgress,
    /// Issue resolved.
    Resolved,
    /// At least one reply was sent.
    Replied,
    /// Hidden from the active queue.
    Archived,
}

impl EmailStatus {
    /// Every status, in workflow order.
    pub const ALL: [Self; 6] = [
        Self::Unread,
        Self::Read,
        Self::InProgress,
        Self::Resolved,
        Self::Replied,
        Self::Archived,
    ];

    /// Convert to database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unread => "unread",
            Self::Read => "read",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
            Self::Replied => "replied",
            Self::Archived => "archived",
        }
    }
}

impl std::str::FromStr for EmailStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unread" => Ok(Self::Unread),
            "read" => Ok(Self::Read),
            "in_progress" => Ok(Self::InProgress),
            "resolved" => Ok(Self::Resolved),
            "replied" => Ok(Self::Replied),
            "archived" => Ok(Self::Archived),
            _ => Err(ParseEnumError::new("status", s)),
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(
            impl std::fmt::Display for $ty {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )*
    };
}

display_as_str!(Priority, Sentiment, EmailStatus);

/// One inbound support message plus its workflow state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Email {
    /// Unique identifier, assigned at creation.
    pub id: EmailId,
    /// Sender address.
    pub sender: String,
    /// Sender display name, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,
    /// Subject line.
    pub subject: String,
    /// Free-text body.
    pub body: String,
    /// When the message was sent/received.
    pub sent_date: DateTime<Utc>,
    /// Replies sent so far, oldest first.
    #[serde(default)]
    pub replies: Replies,
    /// Urgency classification.
    #[serde(default)]
    pub priority: Priority,
    /// Tone classification.
    #[serde(default)]
    pub sentiment: Sentiment,
    /// Classifier confidence for `sentiment` (0.0 - 1.0).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment_confidence: Option<f32>,
    /// Topic, e.g. `billing` or `account_access`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Workflow state.
    #[serde(default)]
    pub status: EmailStatus,
    /// Short labels, kept in display order.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Optional derived information.
    #[serde(flatten)]
    pub enrichment: Enrichment,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last modified.
    pub updated_at: DateTime<Utc>,
}

impl Email {
    /// Whether nobody has opened this email yet.
    #[must_use]
    pub fn is_unread(&self) -> bool {
        self.status == EmailStatus::Unread
    }

    /// Case-insensitive substring match against subject, body and sender.
    ///
    /// `needle_lower` must already be lowercased.
    #[must_use]
    pub fn mentions(&self, needle_lower: &str) -> bool {
        self.subject.to_lowercase().contains(needle_lower)
            || self.body.to_lowercase().contains(needle_lower)
            || self.sender.to_lowercase().contains(needle_lower)
    }

    /// Set `updated_at`, never moving it backwards.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.updated_at {
            self.updated_at = now;
        }
    }
}
