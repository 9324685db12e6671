//! List filters and pagination.
//!
//! Equality filters are AND-combined; `search` is a case-insensitive
//! substring test OR-combined across subject, body and sender.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::email::{Email, EmailStatus, ParseEnumError, Priority, Sentiment};
use crate::{Error, Result};

/// Default page size.
pub const DEFAULT_LIMIT: u32 = 50;

/// Query-string value meaning "no filter".
const ALL: &str = "all";

/// Filters and pagination for listing emails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailQuery {
    /// Only emails with this status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<EmailStatus>,
    /// Only emails with this priority.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// Only emails with this sentiment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,
    /// Substring searched in subject, body and sender.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// Page size.
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Number of matching records to skip.
    #[serde(default)]
    pub offset: u32,
    /// Set when a filter named a value no record can have.
    #[serde(skip)]
    pub matches_nothing: bool,
}

const fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

impl Default for EmailQuery {
    fn default() -> Self {
        Self {
            status: None,
            priority: None,
            sentiment: None,
            search: None,
            limit: DEFAULT_LIMIT,
            offset: 0,
            matches_nothing: false,
        }
    }
}

/// Raw, unparsed query-string values as they arrive over HTTP.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEmailQuery {
    /// Status filter or `all`.
    pub status: Option<String>,
    /// Priority filter or `all`.
    pub priority: Option<String>,
    /// Sentiment filter or `all`.
    pub sentiment: Option<String>,
    /// Search text.
    pub search: Option<String>,
    /// Page size.
    pub limit: Option<String>,
    /// Offset.
    pub offset: Option<String>,
}

impl TryFrom<RawEmailQuery> for EmailQuery {
    type Error = Error;

    /// Unknown enum values do not fail: no record carries them, so the
    /// query matches nothing. Only malformed pagination is rejected.
    fn try_from(raw: RawEmailQuery) -> Result<Self> {
        let mut matches_nothing = false;
        let status = known_or_flag(raw.status.as_deref(), &mut matches_nothing);
        let priority = known_or_flag(raw.priority.as_deref(), &mut matches_nothing);
        let sentiment = known_or_flag(raw.sentiment.as_deref(), &mut matches_nothing);
        Ok(Self {
            status,
            priority,
            sentiment,
            search: raw.search.filter(|s| !s.is_empty()),
            limit: parse_number(raw.limit.as_deref(), "limit")?.unwrap_or(DEFAULT_LIMIT),
            offset: parse_number(raw.offset.as_deref(), "offset")?.unwrap_or(0),
            matches_nothing,
        })
    }
}

/// Parse a filter value, raising `unknown` instead of failing.
fn known_or_flag<T>(value: Option<&str>, unknown: &mut bool) -> Option<T>
where
    T: FromStr<Err = ParseEnumError>,
{
    parse_filter(value).unwrap_or_else(|e| {
        debug!(error = %e, "Unknown filter value, query matches nothing");
        *unknown = true;
        None
    })
}

fn parse_filter<T>(value: Option<&str>) -> std::result::Result<Option<T>, ParseEnumError>
where
    T: FromStr<Err = ParseEnumError>,
{
    match value {
        None | Some("" | ALL) => Ok(None),
        Some(v) => v.parse::<T>().map(Some),
    }
}

fn parse_number(value: Option<&str>, name: &str) -> Result<Option<u32>> {
    match value {
        None | Some("") => Ok(None),
        Some(v) => v
            .parse::<u32>()
            .map(Some)
            .map_err(|_| Error::invalid(format!("{name} must be a non-negative integer"))),
    }
}

impl EmailQuery {
    /// Create an unfiltered first page.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter on status.
    #[must_use]
    pub const fn with_status(mut self, status: EmailStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Filter on priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Filter on sentiment.
    #[must_use]
    pub const fn with_sentiment(mut self, sentiment: Sentiment) -> Self {
        self.sentiment = Some(sentiment);
        self
    }

    /// Search subject, body and sender.
    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Set pagination.
    #[must_use]
    pub const fn with_page(mut self, limit: u32, offset: u32) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }

    /// Whether `email` satisfies every filter.
    #[must_use]
    pub fn matches(&self, email: &Email) -> bool {
        !self.matches_nothing
            && self.status.is_none_or(|s| email.status == s)
            && self.priority.is_none_or(|p| email.priority == p)
            && self.sentiment.is_none_or(|s| email.sentiment == s)
            && self
                .search
                .as_deref()
                .is_none_or(|needle| email.mentions(&needle.to_lowercase()))
    }

    /// Filter, order newest first and paginate an in-memory collection.
    #[must_use]
    pub fn apply<'a>(&self, emails: impl IntoIterator<Item = &'a Email>) -> Vec<Email> {
        let mut matching: Vec<&Email> = emails.into_iter().filter(|e| self.matches(e)).collect();
        matching.sort_by(|a, b| b.sent_date.cmp(&a.sent_date));
        matching
            .into_iter()
            .skip(self.offset as usize)
            .take(self.limit as usize)
            .cloned()
            .collect()
    }

    /// Query-string pairs for transmitting this query over HTTP.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        if let Some(priority) = self.priority {
            pairs.push(("priority", priority.as_str().to_string()));
        }
        if let Some(sentiment) = self.sentiment {
            pairs.push(("sentiment", sentiment.as_str().to_string()));
        }
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        pairs.push(("limit", self.limit.to_string()));
        pairs.push(("offset", self.offset.to_string()));
        pairs
    }
}
