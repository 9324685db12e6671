//! Keyword classifier used when an email arrives without labels.
//!
//! Cheap heuristics, applied at ingestion time only: sentiment looks at
//! the body, priority and tags at subject and body together.

use crate::email::{Priority, Sentiment};

const NEGATIVE_WORDS: &[&str] = &[
    "urgent", "problem", "issue", "error", "broken", "failed", "cannot", "blocked",
];
const POSITIVE_WORDS: &[&str] = &["thank", "great", "excellent", "good", "happy", "satisfied"];

const URGENT_WORDS: &[&str] = &["urgent", "asap", "emergency", "critical", "blocked"];
const HIGH_WORDS: &[&str] = &["important", "priority", "soon"];
const LOW_WORDS: &[&str] = &["question", "info", "inquiry"];

const TAG_RULES: &[(&str, &[&str])] = &[
    ("authentication", &["password", "login"]),
    ("billing", &["payment", "billing"]),
    ("technical", &["bug", "error"]),
    ("feature-request", &["feature", "request"]),
];

/// Labels guessed for an unlabelled email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Guessed priority.
    pub priority: Priority,
    /// Guessed sentiment.
    pub sentiment: Sentiment,
    /// Guessed tags, in rule order.
    pub tags: Vec<String>,
}

/// Classify an email from its subject and body.
#[must_use]
pub fn classify(subject: &str, body: &str) -> Classification {
    let subject = subject.to_lowercase();
    let body = body.to_lowercase();

    Classification {
        priority: priority_of(&subject, &body),
        sentiment: sentiment_of(&body),
        tags: tags_of(&body),
    }
}

fn contains_any(haystack: &str, words: &[&str]) -> bool {
    words.iter().any(|w| haystack.contains(w))
}

fn sentiment_of(body: &str) -> Sentiment {
    if contains_any(body, NEGATIVE_WORDS) {
        Sentiment::Negative
    } else if contains_any(body, POSITIVE_WORDS) {
        Sentiment::Positive
    } else {
        Sentiment::Neutral
    }
}

fn priority_of(subject: &str, body: &str) -> Priority {
    let hit = |words| contains_any(subject, words) || contains_any(body, words);
    if hit(URGENT_WORDS) {
        Priority::Urgent
    } else if hit(HIGH_WORDS) {
        Priority::High
    } else if hit(LOW_WORDS) {
        Priority::Low
    } else {
        Priority::Medium
    }
}

fn tags_of(body: &str) -> Vec<String> {
    TAG_RULES
        .iter()
        .filter(|(_, words)| contains_any(body, words))
        .map(|(tag, _)| (*tag).to_string())
        .collect()
}
