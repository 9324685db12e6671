//! Write-side shapes: records to create and partial updates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enrichment::Enrichment;
use super::model::{Email, EmailId, EmailStatus, Priority, Sentiment};
use super::replies::Replies;
use crate::classify;
use crate::{Error, Result};

/// A full or partial record submitted for creation.
///
/// Missing fields receive server-side defaults; missing `priority`,
/// `sentiment` and `tags` are filled in by the keyword classifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewEmail {
    /// Caller-chosen identifier; generated when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EmailId>,
    /// Sender address (required).
    pub sender: String,
    /// Sender display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,
    /// Subject line.
    #[serde(default)]
    pub subject: String,
    /// Body text.
    #[serde(default)]
    pub body: String,
    /// Sent timestamp; defaults to now.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_date: Option<DateTime<Utc>>,
    /// Existing reply history.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replies: Option<Replies>,
    /// Urgency classification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// Tone classification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,
    /// Confidence for `sentiment`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment_confidence: Option<f32>,
    /// Topic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Initial workflow state; defaults to `unread`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<EmailStatus>,
    /// Labels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Optional enrichment.
    #[serde(flatten)]
    pub enrichment: Enrichment,
}

impl NewEmail {
    /// Start a new record with the required fields.
    #[must_use]
    pub fn new(
        sender: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            sender: sender.into(),
            subject: subject.into(),
            body: body.into(),
            ..Self::default()
        }
    }

    /// Materialize the record with server-assigned fields.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if the sender is blank.
    pub fn into_email(self, now: DateTime<Utc>) -> Result<Email> {
        if self.sender.trim().is_empty() {
            return Err(Error::invalid("sender is required"));
        }

        let needs_classification =
            self.priority.is_none() || self.sentiment.is_none() || self.tags.is_none();
        let guess = needs_classification.then(|| classify::classify(&self.subject, &self.body));

        Ok(Email {
            id: self.id.unwrap_or_else(EmailId::generate),
            sender: self.sender,
            sender_name: self.sender_name,
            subject: self.subject,
            body: self.body,
            sent_date: self.sent_date.unwrap_or(now),
            replies: self.replies.unwrap_or_default(),
            priority: self
                .priority
                .or_else(|| guess.as_ref().map(|g| g.priority))
                .unwrap_or_default(),
            sentiment: self
                .sentiment
                .or_else(|| guess.as_ref().map(|g| g.sentiment))
                .unwrap_or_default(),
            sentiment_confidence: self.sentiment_confidence,
            category: self.category,
            status: self.status.unwrap_or_default(),
            tags: self
                .tags
                .or_else(|| guess.map(|g| g.tags))
                .unwrap_or_default(),
            enrichment: self.enrichment,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial update applied by `PATCH /emails/{id}`.
///
/// The identifier and timestamps are not patchable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmailPatch {
    /// New sender address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    /// New sender display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,
    /// New subject.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// New body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// New sent timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_date: Option<DateTime<Utc>>,
    /// Replacement reply history.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replies: Option<Replies>,
    /// New priority.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// New sentiment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,
    /// New sentiment confidence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment_confidence: Option<f32>,
    /// New category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// New workflow state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<EmailStatus>,
    /// Replacement tag list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl EmailPatch {
    /// A patch that only changes the status.
    #[must_use]
    pub fn status(status: EmailStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Apply the patch to a record and stamp `updated_at`.
    pub fn apply(&self, email: &mut Email, now: DateTime<Utc>) {
        if let Some(sender) = &self.sender {
            email.sender.clone_from(sender);
        }
        if let Some(name) = &self.sender_name {
            email.sender_name = Some(name.clone());
        }
        if let Some(subject) = &self.subject {
            email.subject.clone_from(subject);
        }
        if let Some(body) = &self.body {
            email.body.clone_from(body);
        }
        if let Some(sent_date) = self.sent_date {
            email.sent_date = sent_date;
        }
        if let Some(replies) = &self.replies {
            email.replies = replies.clone();
        }
        if let Some(priority) = self.priority {
            email.priority = priority;
        }
        if let Some(sentiment) = self.sentiment {
            email.sentiment = sentiment;
        }
        if let Some(confidence) = self.sentiment_confidence {
            email.sentiment_confidence = Some(confidence);
        }
        if let Some(category) = &self.category {
            email.category = Some(category.clone());
        }
        if let Some(status) = self.status {
            email.status = status;
        }
        if let Some(tags) = &self.tags {
            email.tags.clone_from(tags);
        }
        email.touch(now);
    }
}
