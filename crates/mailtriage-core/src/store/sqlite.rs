//! Embedded SQLite backend.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};

use super::EmailStore;
use crate::email::{Email, EmailId, EmailPatch, EmailStatus, Enrichment, Priority, Replies, Sentiment};
use crate::query::EmailQuery;
use crate::{Error, Result};

const COLUMNS: &str = "id, sender, sender_name, subject, body, sent_date, replies, priority, \
                       sentiment, sentiment_confidence, category, status, tags, enrichment, \
                       created_at, updated_at";

/// Lowercased copies of the searchable text, so matching folds non-ASCII case too.
const SEARCH_COLUMNS: &str = "subject_lc, body_lc, sender_lc";

/// Email store backed by a local SQLite database.
pub struct SqliteEmailStore {
    pool: SqlitePool,
}

impl SqliteEmailStore {
    /// Open (or create) the database at `url`.
    ///
    /// Accepts either a `sqlite:` URL or a bare file path. A missing database
    /// file is created.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is malformed, the database connection fails
    /// or schema creation fails.
    pub async fn new(url: &str) -> Result<Self> {
        let url = if url.starts_with("sqlite:") {
            url.to_string()
        } else {
            format!("sqlite:{url}")
        };
        let options = SqliteConnectOptions::from_str(&url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.initialize().await?;
        Ok(store)
    }

    /// Create an in-memory store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let store = Self { pool };
        store.initialize().await?;
        Ok(store)
    }

    /// Initialize database schema.
    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS emails (
                id TEXT PRIMARY KEY,
                sender TEXT NOT NULL,
                sender_name TEXT,
                subject TEXT NOT NULL DEFAULT '',
                body TEXT NOT NULL DEFAULT '',
                sent_date TEXT NOT NULL,
                replies TEXT NOT NULL DEFAULT '',
                priority TEXT NOT NULL DEFAULT 'medium',
                sentiment TEXT NOT NULL DEFAULT 'neutral',
                sentiment_confidence REAL,
                category TEXT,
                status TEXT NOT NULL DEFAULT 'unread',
                tags TEXT NOT NULL DEFAULT '[]',
                enrichment TEXT NOT NULL DEFAULT '{}',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                subject_lc TEXT NOT NULL DEFAULT '',
                body_lc TEXT NOT NULL DEFAULT '',
                sender_lc TEXT NOT NULL DEFAULT ''
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        // Listing is always newest first
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_emails_sent_date ON emails(sent_date DESC)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_emails_status ON emails(status)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl EmailStore for SqliteEmailStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn list(&self, query: &EmailQuery) -> Result<Vec<Email>> {
        let mut qb: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new(format!("SELECT {COLUMNS} FROM emails WHERE 1 = 1"));

        if let Some(status) = query.status {
            qb.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(priority) = query.priority {
            qb.push(" AND priority = ").push_bind(priority.as_str());
        }
        if let Some(sentiment) = query.sentiment {
            qb.push(" AND sentiment = ").push_bind(sentiment.as_str());
        }
        if let Some(search) = &query.search {
            let pattern = like_pattern(&search.to_lowercase());
            qb.push(" AND (subject_lc LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR body_lc LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR sender_lc LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }

        qb.push(" ORDER BY sent_date DESC LIMIT ")
            .push_bind(i64::from(query.limit))
            .push(" OFFSET ")
            .push_bind(i64::from(query.offset));

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_email).collect()
    }

    async fn get(&self, id: &EmailId) -> Result<Option<Email>> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM emails WHERE id = ?"))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_email).transpose()
    }

    async fn update(
        &self,
        id: &EmailId,
        patch: &EmailPatch,
        now: DateTime<Utc>,
    ) -> Result<Option<Email>> {
        let mut qb: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("UPDATE emails SET updated_at = MAX(updated_at, ");
        qb.push_bind(timestamp(now)).push(")");

        if let Some(sender) = &patch.sender {
            qb.push(", sender = ").push_bind(sender.as_str());
            qb.push(", sender_lc = ").push_bind(sender.to_lowercase());
        }
        if let Some(name) = &patch.sender_name {
            qb.push(", sender_name = ").push_bind(name.as_str());
        }
        if let Some(subject) = &patch.subject {
            qb.push(", subject = ").push_bind(subject.as_str());
            qb.push(", subject_lc = ").push_bind(subject.to_lowercase());
        }
        if let Some(body) = &patch.body {
            qb.push(", body = ").push_bind(body.as_str());
            qb.push(", body_lc = ").push_bind(body.to_lowercase());
        }
        if let Some(sent_date) = patch.sent_date {
            qb.push(", sent_date = ").push_bind(timestamp(sent_date));
        }
        if let Some(replies) = &patch.replies {
            qb.push(", replies = ").push_bind(replies.encode());
        }
        if let Some(priority) = patch.priority {
            qb.push(", priority = ").push_bind(priority.as_str());
        }
        if let Some(sentiment) = patch.sentiment {
            qb.push(", sentiment = ").push_bind(sentiment.as_str());
        }
        if let Some(confidence) = patch.sentiment_confidence {
            qb.push(", sentiment_confidence = ")
                .push_bind(f64::from(confidence));
        }
        if let Some(category) = &patch.category {
            qb.push(", category = ").push_bind(category.as_str());
        }
        if let Some(status) = patch.status {
            qb.push(", status = ").push_bind(status.as_str());
        }
        if let Some(tags) = &patch.tags {
            qb.push(", tags = ").push_bind(serde_json::to_string(tags)?);
        }
        qb.push(" WHERE id = ").push_bind(id.as_str());

        let done = qb.build().execute(&self.pool).await?;
        if done.rows_affected() == 0 {
            return Ok(None);
        }
        self.get(id).await
    }

    async fn append_reply(
        &self,
        id: &EmailId,
        reply: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Email>> {
        // One statement, so concurrent appends cannot overwrite each other
        let done = sqlx::query(
            r"
            UPDATE emails
            SET replies = CASE WHEN replies = '' THEN ? ELSE replies || '|' || ? END,
                status = 'replied',
                updated_at = MAX(updated_at, ?)
            WHERE id = ?
            ",
        )
        .bind(reply)
        .bind(reply)
        .bind(timestamp(now))
        .bind(id.as_str())
        .execute(&self.pool)
        .await?;

        if done.rows_affected() == 0 {
            return Ok(None);
        }
        self.get(id).await
    }

    async fn insert(&self, email: &Email) -> Result<Email> {
        let result = sqlx::query(&format!(
            "INSERT INTO emails ({COLUMNS}, {SEARCH_COLUMNS}) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(email.id.as_str())
        .bind(&email.sender)
        .bind(email.sender_name.as_deref())
        .bind(&email.subject)
        .bind(&email.body)
        .bind(timestamp(email.sent_date))
        .bind(email.replies.encode())
        .bind(email.priority.as_str())
        .bind(email.sentiment.as_str())
        .bind(email.sentiment_confidence.map(f64::from))
        .bind(email.category.as_deref())
        .bind(email.status.as_str())
        .bind(serde_json::to_string(&email.tags)?)
        .bind(serde_json::to_string(&email.enrichment)?)
        .bind(timestamp(email.created_at))
        .bind(timestamp(email.updated_at))
        .bind(email.subject.to_lowercase())
        .bind(email.body.to_lowercase())
        .bind(email.sender.to_lowercase())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {}
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                return Err(Error::invalid(format!("email {} already exists", email.id)));
            }
            Err(e) => return Err(e.into()),
        }

        self.get(&email.id)
            .await?
            .ok_or_else(|| Error::NotFound(email.id.clone()))
    }

    async fn count(&self, status: Option<EmailStatus>) -> Result<u64> {
        let status = status.map(|s| s.as_str());
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM emails WHERE (? IS NULL OR status = ?)",
        )
        .bind(status)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        #[allow(clippy::cast_sign_loss)]
        Ok(count as u64)
    }

    async fn priorities(&self) -> Result<Vec<Priority>> {
        let values: Vec<String> = sqlx::query_scalar("SELECT priority FROM emails")
            .fetch_all(&self.pool)
            .await?;
        values.iter().map(|v| parse_column(v)).collect()
    }

    async fn sentiments(&self) -> Result<Vec<Sentiment>> {
        let values: Vec<String> = sqlx::query_scalar("SELECT sentiment FROM emails")
            .fetch_all(&self.pool)
            .await?;
        values.iter().map(|v| parse_column(v)).collect()
    }

    async fn sent_dates_since(&self, since: DateTime<Utc>) -> Result<Vec<DateTime<Utc>>> {
        let values: Vec<String> =
            sqlx::query_scalar("SELECT sent_date FROM emails WHERE sent_date >= ?")
                .bind(timestamp(since))
                .fetch_all(&self.pool)
                .await?;
        values.iter().map(|v| parse_timestamp(v)).collect()
    }
}

/// Fixed-width RFC 3339 so that text comparison orders chronologically.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| Error::Database(sqlx::Error::Decode(Box::new(e))))
}

fn parse_column<T>(value: &str) -> Result<T>
where
    T: std::str::FromStr<Err = crate::email::ParseEnumError>,
{
    value
        .parse()
        .map_err(|e| Error::Database(sqlx::Error::Decode(Box::new(e))))
}

/// `%term%` with LIKE wildcards in the term escaped.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Convert a database row to an `Email`.
#[allow(clippy::cast_possible_truncation)]
fn row_to_email(row: &SqliteRow) -> Result<Email> {
    let tags: String = row.get("tags");
    let enrichment: String = row.get("enrichment");
    let replies: String = row.get("replies");

    Ok(Email {
        id: EmailId::new(row.get::<String, _>("id")),
        sender: row.get("sender"),
        sender_name: row.get("sender_name"),
        subject: row.get("subject"),
        body: row.get("body"),
        sent_date: parse_timestamp(row.get("sent_date"))?,
        replies: Replies::decode(&replies),
        priority: parse_column(row.get("priority"))?,
        sentiment: parse_column(row.get("sentiment"))?,
        sentiment_confidence: row
            .get::<Option<f64>, _>("sentiment_confidence")
            .map(|c| c as f32),
        category: row.get("category"),
        status: parse_column(row.get("status"))?,
        tags: serde_json::from_str(&tags)?,
        enrichment: serde_json::from_str::<Enrichment>(&enrichment)?,
        created_at: parse_timestamp(row.get("created_at"))?,
        updated_at: parse_timestamp(row.get("updated_at"))?,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::email::NewEmail;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 9, 12, 0, 0).unwrap()
    }

    async fn seeded() -> SqliteEmailStore {
        let store = SqliteEmailStore::in_memory().await.unwrap();
        let records = [
            ("1", "Password reset broken", "cannot log in", Priority::Urgent, 2),
            ("2", "Invoice 100% wrong", "billing_v2 plan", Priority::High, 15),
            ("3", "Dark mode", "please add a password hint too", Priority::Medium, 60),
        ];
        for (id, subject, body, priority, minutes) in records {
            let email = NewEmail {
                id: Some(EmailId::new(id)),
                priority: Some(priority),
                sent_date: Some(now() - Duration::minutes(minutes)),
                ..NewEmail::new(format!("user{id}@example.com"), subject, body)
            }
            .into_email(now())
            .unwrap();
            store.insert(&email).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_insert_and_get_roundtrip() {
        let store = SqliteEmailStore::in_memory().await.unwrap();
        let mut new = NewEmail::new("a@example.com", "Hi", "Thanks a lot");
        new.tags = Some(vec!["vip".into(), "billing".into()]);
        new.enrichment.sender_phone = Some("+1 555 0100".into());
        let email = new.into_email(now()).unwrap();

        let stored = store.insert(&email).await.unwrap();
        assert_eq!(stored, email);

        let fetched = store.get(&email.id).await.unwrap().unwrap();
        assert_eq!(fetched.tags, vec!["vip", "billing"]);
        assert_eq!(fetched.enrichment.sender_phone.as_deref(), Some("+1 555 0100"));
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let store = seeded().await;
        assert!(store.get(&EmailId::new("nope")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_id_is_rejected() {
        let store = seeded().await;
        let dup = NewEmail {
            id: Some(EmailId::new("1")),
            ..NewEmail::new("x@example.com", "s", "b")
        }
        .into_email(now())
        .unwrap();

        let err = store.insert(&dup).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_list_filters_and_orders() {
        let store = seeded().await;

        let all = store.list(&EmailQuery::new()).await.unwrap();
        let ids: Vec<_> = all.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["1", "2", "3"]);

        let query = EmailQuery::new()
            .with_priority(Priority::Urgent)
            .with_search("PASSWORD");
        let result = store.list(&query).await.unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id.as_str(), "1");

        let page = store
            .list(&EmailQuery::new().with_page(1, 1))
            .await
            .unwrap();
        assert_eq!(page[0].id.as_str(), "2");
    }

    #[tokio::test]
    async fn test_search_escapes_like_wildcards() {
        let store = seeded().await;

        let result = store
            .list(&EmailQuery::new().with_search("100%"))
            .await
            .unwrap();
        assert_eq!(result.len(), 1);

        let result = store
            .list(&EmailQuery::new().with_search("ll_n"))
            .await
            .unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_search_folds_non_ascii_case() {
        let store = seeded().await;
        let email = NewEmail::new("jo@example.fr", "Écran noir au démarrage", "Rien ne s'affiche")
            .into_email(now())
            .unwrap();
        store.insert(&email).await.unwrap();

        for term in ["écran", "ÉCRAN", "DÉMARRAGE"] {
            let result = store
                .list(&EmailQuery::new().with_search(term))
                .await
                .unwrap();
            assert_eq!(result.len(), 1, "search for {term}");
            assert_eq!(result[0].id, email.id);
        }
    }

    #[tokio::test]
    async fn test_search_sees_patched_text() {
        let store = seeded().await;
        let patch = EmailPatch {
            subject: Some("Ärger mit der Rechnung".into()),
            ..EmailPatch::default()
        };
        store
            .update(&EmailId::new("3"), &patch, now())
            .await
            .unwrap();

        let result = store
            .list(&EmailQuery::new().with_search("ärger"))
            .await
            .unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id.as_str(), "3");

        let result = store
            .list(&EmailQuery::new().with_search("dark mode"))
            .await
            .unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_new_creates_missing_database_file() {
        let path = std::env::temp_dir().join(format!(
            "mailtriage-{}-{}.db",
            std::process::id(),
            uuid::Uuid::new_v4()
        ));
        assert!(!path.exists());

        let store = SqliteEmailStore::new(&format!("sqlite:{}", path.display()))
            .await
            .unwrap();
        let email = NewEmail::new("a@example.com", "Hi", "Hello")
            .into_email(now())
            .unwrap();
        store.insert(&email).await.unwrap();
        assert!(store.get(&email.id).await.unwrap().is_some());
        assert!(path.exists());

        store.pool.close().await;
        let reopened = SqliteEmailStore::new(path.to_str().unwrap()).await.unwrap();
        assert_eq!(reopened.count(None).await.unwrap(), 1);
        reopened.pool.close().await;
        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_update_patches_fields_and_stamps() {
        let store = seeded().await;
        let later = now() + Duration::minutes(5);
        let patch = EmailPatch {
            status: Some(EmailStatus::InProgress),
            tags: Some(vec!["escalated".into()]),
            ..EmailPatch::default()
        };

        let email = store
            .update(&EmailId::new("2"), &patch, later)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(email.status, EmailStatus::InProgress);
        assert_eq!(email.tags, vec!["escalated"]);
        assert_eq!(email.updated_at, later);
        assert_eq!(email.subject, "Invoice 100% wrong");
    }

    #[tokio::test]
    async fn test_update_missing_creates_nothing() {
        let store = seeded().await;
        let result = store
            .update(&EmailId::new("9"), &EmailPatch::status(EmailStatus::Read), now())
            .await
            .unwrap();

        assert!(result.is_none());
        assert_eq!(store.count(None).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_updated_at_never_moves_backwards() {
        let store = seeded().await;
        let id = EmailId::new("1");
        let earlier = now() - Duration::hours(1);

        let email = store
            .update(&id, &EmailPatch::status(EmailStatus::Read), earlier)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(email.updated_at, now());

        let email = store.append_reply(&id, "Hi", earlier).await.unwrap().unwrap();
        assert_eq!(email.updated_at, now());
    }

    #[tokio::test]
    async fn test_append_reply_joins_and_marks_replied() {
        let store = seeded().await;
        let id = EmailId::new("3");

        store.append_reply(&id, "A", now()).await.unwrap();
        let email = store.append_reply(&id, "B", now()).await.unwrap().unwrap();

        assert_eq!(email.replies.encode(), "A|B");
        assert_eq!(email.status, EmailStatus::Replied);
    }

    #[tokio::test]
    async fn test_append_reply_missing_returns_none() {
        let store = seeded().await;
        let result = store
            .append_reply(&EmailId::new("404"), "hello", now())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_aggregate_queries() {
        let store = seeded().await;
        store
            .append_reply(&EmailId::new("1"), "done", now())
            .await
            .unwrap();

        assert_eq!(store.count(None).await.unwrap(), 3);
        assert_eq!(store.count(Some(EmailStatus::Unread)).await.unwrap(), 2);
        assert_eq!(store.count(Some(EmailStatus::Replied)).await.unwrap(), 1);

        let mut priorities = store.priorities().await.unwrap();
        priorities.sort();
        assert_eq!(priorities, [Priority::Urgent, Priority::High, Priority::Medium]);
        assert_eq!(store.sentiments().await.unwrap().len(), 3);

        let recent = store
            .sent_dates_since(now() - Duration::minutes(20))
            .await
            .unwrap();
        assert_eq!(recent.len(), 2);
    }

    #[test]
    fn test_like_pattern() {
        assert_eq!(like_pattern("abc"), "%abc%");
        assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }

    #[test]
    fn test_timestamp_is_fixed_width() {
        let t = Utc.with_ymd_and_hms(2024, 1, 9, 12, 0, 0).unwrap();
        assert_eq!(timestamp(t), "2024-01-09T12:00:00.000Z");
        assert_eq!(parse_timestamp(&timestamp(t)).unwrap(), t);
    }
}
