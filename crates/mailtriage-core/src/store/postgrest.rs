//! Managed-database backend speaking the PostgREST dialect over HTTP.
//!
//! The reply append here is a read followed by a write; two concurrent
//! appends to the same email can lose one of them.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use super::EmailStore;
use crate::email::{
    Email, EmailId, EmailPatch, EmailStatus, Priority, Sentiment, append_encoded,
};
use crate::query::EmailQuery;
use crate::{Error, Result};

const TABLE_PATH: &str = "/rest/v1/emails";

/// Email store reached through a PostgREST endpoint.
pub struct PostgrestEmailStore {
    client: Client,
    endpoint: String,
}

impl PostgrestEmailStore {
    /// Create a store for the project at `base_url` using its public key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key cannot be used as a header value or the
    /// HTTP client cannot be built.
    pub fn new(base_url: &str, key: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let invalid_key = |_| Error::invalid("store key contains invalid header characters");
        headers.insert("apikey", HeaderValue::from_str(key).map_err(invalid_key)?);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {key}")).map_err(invalid_key)?,
        );

        let client = Client::builder().default_headers(headers).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}{TABLE_PATH}", base_url.trim_end_matches('/')),
        })
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = check(request.send().await?).await?;
        Ok(response.json().await?)
    }

    async fn select<T: DeserializeOwned>(&self, params: &[(&str, String)]) -> Result<Vec<T>> {
        self.fetch(self.client.get(&self.endpoint).query(params))
            .await
    }

    async fn patch_returning(
        &self,
        id: &EmailId,
        body: &serde_json::Value,
    ) -> Result<Option<Email>> {
        let rows: Vec<Email> = self
            .fetch(
                self.client
                    .patch(&self.endpoint)
                    .query(&[("id", eq(id.as_str()))])
                    .header("Prefer", "return=representation")
                    .json(body),
            )
            .await?;
        Ok(rows.into_iter().next())
    }
}

#[async_trait]
impl EmailStore for PostgrestEmailStore {
    fn backend(&self) -> &'static str {
        "postgrest"
    }

    async fn list(&self, query: &EmailQuery) -> Result<Vec<Email>> {
        self.select(&list_params(query)).await
    }

    async fn get(&self, id: &EmailId) -> Result<Option<Email>> {
        let rows: Vec<Email> = self
            .select(&[("select", "*".to_string()), ("id", eq(id.as_str()))])
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn update(
        &self,
        id: &EmailId,
        patch: &EmailPatch,
        now: DateTime<Utc>,
    ) -> Result<Option<Email>> {
        let mut body = serde_json::to_value(patch)?;
        if let Some(fields) = body.as_object_mut() {
            fields.insert("updated_at".to_string(), json!(timestamp(now)));
        }
        self.patch_returning(id, &body).await
    }

    async fn append_reply(
        &self,
        id: &EmailId,
        reply: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Email>> {
        let Some(current) = self.get(id).await? else {
            return Ok(None);
        };
        debug!(id = %id, existing = current.replies.len(), "Appending reply");

        let body = json!({
            "replies": append_encoded(&current.replies.encode(), reply),
            "status": EmailStatus::Replied,
            "updated_at": timestamp(now.max(current.updated_at)),
        });
        self.patch_returning(id, &body).await
    }

    async fn insert(&self, email: &Email) -> Result<Email> {
        let rows: Vec<Email> = self
            .fetch(
                self.client
                    .post(&self.endpoint)
                    .header("Prefer", "return=representation")
                    .json(email),
            )
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(email.id.clone()))
    }

    async fn count(&self, status: Option<EmailStatus>) -> Result<u64> {
        let mut params = vec![("select", "id".to_string()), ("limit", "0".to_string())];
        if let Some(status) = status {
            params.push(("status", eq(status.as_str())));
        }

        let response = check(
            self.client
                .get(&self.endpoint)
                .query(&params)
                .header("Prefer", "count=exact")
                .send()
                .await?,
        )
        .await?;

        response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range)
            .ok_or_else(|| Error::Store {
                status: response.status().as_u16(),
                message: "missing or malformed Content-Range header".to_string(),
            })
    }

    async fn priorities(&self) -> Result<Vec<Priority>> {
        #[derive(Deserialize)]
        struct Row {
            priority: Priority,
        }
        let rows: Vec<Row> = self.select(&[("select", "priority".to_string())]).await?;
        Ok(rows.into_iter().map(|r| r.priority).collect())
    }

    async fn sentiments(&self) -> Result<Vec<Sentiment>> {
        #[derive(Deserialize)]
        struct Row {
            sentiment: Sentiment,
        }
        let rows: Vec<Row> = self.select(&[("select", "sentiment".to_string())]).await?;
        Ok(rows.into_iter().map(|r| r.sentiment).collect())
    }

    async fn sent_dates_since(&self, since: DateTime<Utc>) -> Result<Vec<DateTime<Utc>>> {
        #[derive(Deserialize)]
        struct Row {
            sent_date: DateTime<Utc>,
        }
        let rows: Vec<Row> = self
            .select(&[
                ("select", "sent_date".to_string()),
                ("sent_date", format!("gte.{}", timestamp(since))),
            ])
            .await?;
        Ok(rows.into_iter().map(|r| r.sent_date).collect())
    }
}

/// Turn a non-success response into `Error::Store`.
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(Error::Store {
        status: status.as_u16(),
        message,
    })
}

fn eq(value: &str) -> String {
    format!("eq.{value}")
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Query parameters for a filtered, paginated listing.
fn list_params(query: &EmailQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![("select", "*".to_string())];
    if let Some(status) = query.status {
        params.push(("status", eq(status.as_str())));
    }
    if let Some(priority) = query.priority {
        params.push(("priority", eq(priority.as_str())));
    }
    if let Some(sentiment) = query.sentiment {
        params.push(("sentiment", eq(sentiment.as_str())));
    }
    if let Some(search) = &query.search {
        params.push(("or", search_filter(search)));
    }
    params.push(("order", "sent_date.desc".to_string()));
    params.push(("limit", query.limit.to_string()));
    params.push(("offset", query.offset.to_string()));
    params
}

/// `or=(...)` filter matching the term in subject, body or sender.
///
/// The pattern is double-quoted so commas and parentheses in the term
/// do not break the filter syntax.
fn search_filter(term: &str) -> String {
    let escaped = term.replace('\\', "\\\\").replace('"', "\\\"");
    let pattern = format!("\"*{escaped}*\"");
    format!("(subject.ilike.{pattern},body.ilike.{pattern},sender.ilike.{pattern})")
}

/// Total from a `Content-Range` header such as `0-24/3573` or `*/0`.
fn parse_content_range(value: &str) -> Option<u64> {
    value.rsplit_once('/')?.1.parse().ok()
}
