//! Bulk loading of emails from JSON or CSV files.
//!
//! JSON files hold an array of partial emails in the API's create format.
//! CSV files carry one email per row with `sender`, `subject`, `body` and an
//! optional `sent_date` column; everything else is filled in by the
//! classifier on insert.

use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use mailtriage_core::{EmailService, NewEmail};
use serde::Deserialize;
use tracing::{info, warn};

use crate::Result;

/// `sent_date` layout used by spreadsheet exports.
const CSV_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// File format of an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ImportFormat {
    /// A JSON array of partial emails.
    Json,
    /// Comma-separated rows with a header line.
    Csv,
}

impl ImportFormat {
    /// Guess the format from the file extension; anything but `.csv` is JSON.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Self::Csv,
            _ => Self::Json,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CsvEmail {
    sender: String,
    #[serde(default)]
    subject: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    sent_date: Option<String>,
}

impl CsvEmail {
    fn into_new_email(self) -> NewEmail {
        let sent_date = self.sent_date.as_deref().and_then(parse_sent_date);
        NewEmail {
            sent_date,
            ..NewEmail::new(self.sender, self.subject, self.body)
        }
    }
}

/// `YYYY-MM-DD HH:MM:SS` (read as UTC) or RFC 3339. Anything else is dropped
/// and the record is stamped with the import time.
fn parse_sent_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, CSV_DATE_FORMAT) {
        return Some(naive.and_utc());
    }
    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Some(date.with_timezone(&Utc));
    }
    warn!(value, "Unparseable sent_date, using import time");
    None
}

fn parse_csv(raw: &str) -> Result<Vec<NewEmail>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(raw.as_bytes());
    let mut emails = Vec::new();
    for row in reader.deserialize::<CsvEmail>() {
        emails.push(row?.into_new_email());
    }
    Ok(emails)
}

/// Load the emails in `path` into the store.
///
/// `format` overrides the guess made from the file extension.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or on the first
/// record the store rejects.
pub async fn import_file(
    path: &Path,
    format: Option<ImportFormat>,
    service: &EmailService,
) -> Result<usize> {
    let format = format.unwrap_or_else(|| ImportFormat::from_path(path));
    let raw = tokio::fs::read_to_string(path).await?;
    let emails = match format {
        ImportFormat::Json => serde_json::from_str::<Vec<NewEmail>>(&raw)?,
        ImportFormat::Csv => parse_csv(&raw)?,
    };
    info!(path = %path.display(), ?format, records = emails.len(), "Importing emails");
    Ok(service.import(emails).await?)
}
