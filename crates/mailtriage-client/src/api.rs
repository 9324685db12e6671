//! Typed access to the REST surface.

use async_trait::async_trait;
use mailtriage_core::wire::{EmailEnvelope, ErrorBody, Health, ReplyRequest};
use mailtriage_core::{
    Analytics, Email, EmailId, EmailPage, EmailPatch, EmailQuery, EmailStatus, NewEmail,
};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use crate::{ClientError, Result};

/// Operations the view state needs from the backend.
#[async_trait]
pub trait EmailApi: Send + Sync {
    /// Fetch one page of emails.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    async fn list_emails(&self, query: &EmailQuery) -> Result<EmailPage>;

    /// Fetch one email.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the email does not exist.
    async fn get_email(&self, id: &EmailId) -> Result<Email>;

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the email does not exist.
    async fn update_email(&self, id: &EmailId, patch: &EmailPatch) -> Result<Email>;

    /// Change only the status.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the email does not exist.
    async fn update_status(&self, id: &EmailId, status: EmailStatus) -> Result<Email> {
        self.update_email(id, &EmailPatch::status(status)).await
    }

    /// Append a reply.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the reply is rejected or the
    /// email does not exist.
    async fn add_reply(&self, id: &EmailId, reply: &str) -> Result<Email>;

    /// Create an email.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    async fn create_email(&self, new: &NewEmail) -> Result<Email>;

    /// Fetch dashboard analytics.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    async fn analytics(&self) -> Result<Analytics>;
}

/// HTTP client for a running `mailtriage` server.
///
/// No timeouts or retries are configured.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for the server at `base_url` (e.g. `http://127.0.0.1:3000`).
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a client reusing an existing `reqwest` client.
    #[must_use]
    pub fn with_client(base_url: impl Into<String>, http: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn email_url(&self, id: &EmailId) -> String {
        self.url(&format!("/emails/{id}"))
    }

    /// Check server liveness and the active backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn health(&self) -> Result<Health> {
        decode(self.http.get(self.url("/health")).send().await?).await
    }
}

#[async_trait]
impl EmailApi for ApiClient {
    async fn list_emails(&self, query: &EmailQuery) -> Result<EmailPage> {
        let response = self
            .http
            .get(self.url("/emails"))
            .query(&query.to_pairs())
            .send()
            .await?;
        decode(response).await
    }

    async fn get_email(&self, id: &EmailId) -> Result<Email> {
        let envelope: EmailEnvelope = decode(self.http.get(self.email_url(id)).send().await?).await?;
        Ok(envelope.email)
    }

    async fn update_email(&self, id: &EmailId, patch: &EmailPatch) -> Result<Email> {
        let response = self.http.patch(self.email_url(id)).json(patch).send().await?;
        let envelope: EmailEnvelope = decode(response).await?;
        Ok(envelope.email)
    }

    async fn add_reply(&self, id: &EmailId, reply: &str) -> Result<Email> {
        let body = ReplyRequest {
            reply: reply.to_string(),
        };
        let response = self
            .http
            .post(format!("{}/reply", self.email_url(id)))
            .json(&body)
            .send()
            .await?;
        let envelope: EmailEnvelope = decode(response).await?;
        Ok(envelope.email)
    }

    async fn create_email(&self, new: &NewEmail) -> Result<Email> {
        let response = self.http.post(self.url("/emails")).json(new).send().await?;
        let envelope: EmailEnvelope = decode(response).await?;
        Ok(envelope.email)
    }

    async fn analytics(&self) -> Result<Analytics> {
        decode(self.http.get(self.url("/analytics")).send().await?).await
    }
}

/// Parse a success body, or turn an error body into `ClientError::Status`.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
    };
    Err(ClientError::Status {
        status: status.as_u16(),
        message,
    })
}
