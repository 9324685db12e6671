//! Email records: the central entity of the support inbox.
//!
//! An email is created by ingestion (or a direct POST), read and filtered
//! many times, mutated in place by status changes and reply appends, and
//! never hard-deleted: archiving is a status, not a removal.

mod enrichment;
mod model;
mod replies;
mod write;

pub use enrichment::{
    AccountTier, AiDraft, Attachment, ContactDetails, CustomerIntelligence, Enrichment,
    ExtractedInfo, SentimentIndicators, Tone,
};
pub use model::{Email, EmailId, EmailStatus, ParseEnumError, Priority, Sentiment};
pub use replies::{REPLY_SEPARATOR, Replies, append_encoded, validate_reply};
pub use write::{EmailPatch, NewEmail};
