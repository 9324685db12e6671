//! # mailtriage-server
//!
//! REST surface for the `mailtriage` support inbox.
//!
//! - `GET /emails`, `POST /emails`
//! - `GET /emails/{id}`, `PATCH /emails/{id}`
//! - `POST /emails/{id}/reply`
//! - `GET /analytics`, `GET /health`

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod config;
mod error;
pub mod import;
pub mod routes;
pub mod telemetry;

use std::net::SocketAddr;

use mailtriage_core::EmailService;
use tokio::net::TcpListener;
use tracing::info;

pub use config::{ServerConfig, StoreSettings};
pub use error::{ApiError, Error, Result};
pub use import::{ImportFormat, import_file};
pub use routes::{AppState, router};

/// Bind `addr` and serve the API until the task is cancelled.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(addr: SocketAddr, service: EmailService) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, store = service.backend(), "Listening");
    axum::serve(listener, router(AppState::new(service))).await?;
    Ok(())
}
