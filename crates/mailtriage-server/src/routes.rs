//! HTTP routes for the email repository.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use mailtriage_core::wire::{EmailEnvelope, Health, ReplyRequest};
use mailtriage_core::{
    Analytics, EmailId, EmailPage, EmailPatch, EmailQuery, EmailService, NewEmail, RawEmailQuery,
};
use tracing::debug;

use crate::error::ApiError;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Repository operations.
    pub service: EmailService,
}

impl AppState {
    /// Wrap a service.
    #[must_use]
    pub const fn new(service: EmailService) -> Self {
        Self { service }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/emails", get(list_emails).post(create_email))
        .route("/emails/:id", get(get_email).patch(update_email))
        .route("/emails/:id/reply", post(add_reply))
        .route("/analytics", get(analytics))
        .route("/health", get(health))
        .with_state(state)
}

async fn list_emails(
    State(state): State<AppState>,
    Query(raw): Query<RawEmailQuery>,
) -> Result<Json<EmailPage>, ApiError> {
    let query = EmailQuery::try_from(raw)?;
    debug!(?query, "Listing emails");
    Ok(Json(state.service.list_emails(&query).await))
}

async fn create_email(
    State(state): State<AppState>,
    payload: Result<Json<NewEmail>, JsonRejection>,
) -> Result<Json<EmailEnvelope>, ApiError> {
    let Json(new) = payload?;
    let email = state.service.create_email(new).await?;
    Ok(Json(EmailEnvelope { email }))
}

async fn get_email(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EmailEnvelope>, ApiError> {
    let email = state.service.get_email(&EmailId::new(id)).await?;
    Ok(Json(EmailEnvelope { email }))
}

async fn update_email(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<EmailPatch>, JsonRejection>,
) -> Result<Json<EmailEnvelope>, ApiError> {
    let Json(patch) = payload?;
    let email = state.service.update_email(&EmailId::new(id), &patch).await?;
    Ok(Json(EmailEnvelope { email }))
}

async fn add_reply(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ReplyRequest>, JsonRejection>,
) -> Result<Json<EmailEnvelope>, ApiError> {
    let Json(request) = payload?;
    let email = state
        .service
        .append_reply(&EmailId::new(id), &request.reply)
        .await?;
    Ok(Json(EmailEnvelope { email }))
}

async fn analytics(State(state): State<AppState>) -> Result<Json<Analytics>, ApiError> {
    Ok(Json(state.service.analytics().await?))
}

async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
        store: state.service.backend().to_string(),
    })
}
