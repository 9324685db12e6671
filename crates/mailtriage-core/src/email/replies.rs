//! Reply history and its `|`-joined persistence encoding.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, Result};

/// Separator between replies in the stored string.
pub const REPLY_SEPARATOR: char = '|';

/// Ordered reply texts attached to an email.
///
/// Stored and transmitted as one string with replies joined by `|`, so an
/// individual reply can never contain that character.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Replies(Vec<String>);

impl Replies {
    /// Create an empty reply history.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Decode the stored `|`-joined form. An empty string means no replies.
    #[must_use]
    pub fn decode(joined: &str) -> Self {
        if joined.is_empty() {
            return Self::new();
        }
        Self(joined.split(REPLY_SEPARATOR).map(str::to_string).collect())
    }

    /// Encode into the stored `|`-joined form.
    #[must_use]
    pub fn encode(&self) -> String {
        self.0.join("|")
    }

    /// Append a reply after validating it.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if the reply is blank or contains `|`.
    pub fn push(&mut self, reply: &str) -> Result<()> {
        validate_reply(reply)?;
        self.0.push(reply.to_string());
        Ok(())
    }

    /// Number of replies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no replies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Most recent reply.
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }
}

/// Check that a reply can be stored without corrupting the encoding.
///
/// # Errors
///
/// Returns `Error::InvalidInput` if the reply is blank or contains `|`.
pub fn validate_reply(reply: &str) -> Result<()> {
    if reply.trim().is_empty() {
        return Err(Error::invalid("reply must not be empty"));
    }
    if reply.contains(REPLY_SEPARATOR) {
        return Err(Error::invalid("reply must not contain the '|' character"));
    }
    Ok(())
}

/// Apply the append rule to an already-encoded history.
#[must_use]
pub fn append_encoded(existing: &str, reply: &str) -> String {
    if existing.is_empty() {
        reply.to_string()
    } else {
        format!("{existing}{REPLY_SEPARATOR}{reply}")
    }
}

impl Serialize for Replies {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for Replies {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Stores hand back NULL for rows that never got a reply.
        let joined = Option::<String>::deserialize(deserializer)?;
        Ok(joined.map_or_else(Self::new, |s| Self::decode(&s)))
    }
}
