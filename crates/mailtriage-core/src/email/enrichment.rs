//! Optional enrichment attached to an email by upstream analysis.

use serde::{Deserialize, Serialize};

/// File attached to an inbound email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// File name.
    pub name: String,
    /// MIME type.
    #[serde(rename = "type")]
    pub mime_type: String,
    /// Size in bytes.
    pub size: u64,
    /// Where the file can be retrieved.
    pub url: String,
}

/// Contact details found in the message body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactDetails {
    /// Phone number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Secondary address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternate_email: Option<String>,
    /// Company name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    /// City/region.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Words that pushed the sentiment classifier one way or the other.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentIndicators {
    /// Positive cue words.
    #[serde(default)]
    pub positive: Vec<String>,
    /// Negative cue words.
    #[serde(default)]
    pub negative: Vec<String>,
}

/// Structured information extracted from the body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedInfo {
    /// Contact details.
    #[serde(default)]
    pub contact_details: ContactDetails,
    /// Requirement phrases ("password reset assistance", ...).
    #[serde(default)]
    pub requirements: Vec<String>,
    /// Words signalling urgency.
    #[serde(default)]
    pub urgency_keywords: Vec<String>,
    /// Products or features mentioned.
    #[serde(default)]
    pub product_mentions: Vec<String>,
    /// Sentiment cue words.
    #[serde(default)]
    pub sentiment_indicators: SentimentIndicators,
}

/// Tone of a generated reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    /// Neutral business tone.
    Professional,
    /// Warm and casual.
    Friendly,
    /// Acknowledges frustration.
    Empathetic,
    /// Strictly formal.
    Formal,
}

/// AI-generated draft reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiDraft {
    /// The drafted reply text.
    pub generated_reply: String,
    /// Tone the draft was written in.
    pub tone: Tone,
    /// Model confidence (0.0 - 1.0).
    pub confidence: f32,
    /// Hints for the agent.
    #[serde(default)]
    pub suggestions: Vec<String>,
    /// Template identifiers the draft was based on.
    #[serde(default)]
    pub templates: Vec<String>,
}

/// Customer account tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountTier {
    /// Entry tier.
    Bronze,
    /// Second tier.
    Silver,
    /// Third tier.
    Gold,
    /// Top tier.
    Platinum,
}

/// What is known about the customer behind an email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerIntelligence {
    /// Account tier.
    pub account_tier: AccountTier,
    /// Satisfaction score (0.0 - 5.0).
    pub satisfaction_score: f32,
    /// Number of earlier support interactions.
    #[serde(default)]
    pub previous_interactions: u32,
    /// Customer location.
    #[serde(default)]
    pub location: String,
    /// Customer timezone abbreviation.
    #[serde(default)]
    pub timezone: String,
}

/// Optional enrichment carried alongside an email.
///
/// Flattened into the email's JSON; every field is omitted when empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Enrichment {
    /// Sender avatar location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_avatar: Option<String>,
    /// Sender phone number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_phone: Option<String>,
    /// Attached files.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    /// Extracted structured information.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_info: Option<ExtractedInfo>,
    /// Drafted reply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_response: Option<AiDraft>,
    /// Customer profile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_intelligence: Option<CustomerIntelligence>,
}

impl Enrichment {
    /// Whether no enrichment is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Whether the email carries attachments.
    #[must_use]
    pub fn has_attachments(&self) -> bool {
        !self.attachments.is_empty()
    }
}
