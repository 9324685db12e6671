//! # mailtriage-client
//!
//! Client side of the `mailtriage` support inbox.
//!
//! - [`ApiClient`]: typed access to the REST surface
//! - [`EmailCache`]: one observable email store shared by every view
//! - [`EmailList`]: query-driven list state with optimistic status changes
//! - [`Dashboard`]: the dashboard snapshot, seeded from a bundled dataset
//! - [`spawn_analytics_poller`]: periodic analytics refresh
//!
//! View state talks to the backend through the [`EmailApi`] trait, so it can
//! run against anything that answers the same operations.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod api;
pub mod cache;
pub mod dashboard;
mod error;
pub mod list;
pub mod poll;
#[cfg(test)]
mod testing;

pub use api::{ApiClient, EmailApi};
pub use cache::EmailCache;
pub use dashboard::{Dashboard, DashboardData, DashboardFilter};
pub use error::{ClientError, Result};
pub use list::EmailList;
pub use poll::spawn_analytics_poller;
