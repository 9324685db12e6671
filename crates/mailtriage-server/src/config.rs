//! Server configuration read from the environment.

use std::net::SocketAddr;
use std::sync::Arc;

use mailtriage_core::{EmailService, PostgrestEmailStore, SqliteEmailStore};
use tracing::{info, warn};

use crate::{Error, Result};

/// Environment variable holding the store URL.
pub const STORE_URL_VAR: &str = "MAILTRIAGE_STORE_URL";
/// Environment variable holding the store's public key.
pub const STORE_KEY_VAR: &str = "MAILTRIAGE_STORE_KEY";
/// Environment variable holding the listen address.
pub const BIND_VAR: &str = "MAILTRIAGE_BIND";
/// Listen address used when none is configured.
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

/// Which store backend to open, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreSettings {
    /// No usable store: sample reads, failing writes.
    Unconfigured,
    /// Embedded `SQLite` database.
    Sqlite {
        /// `sqlite:` URL.
        url: String,
    },
    /// PostgREST endpoint.
    Postgrest {
        /// Project base URL.
        url: String,
        /// Public key sent with every request.
        key: String,
    },
}

impl StoreSettings {
    /// Pick a backend from a URL and optional key.
    ///
    /// `sqlite:` URLs ignore the key; HTTP URLs require one.
    #[must_use]
    pub fn resolve(url: Option<&str>, key: Option<&str>) -> Self {
        let url = url.map(str::trim).filter(|u| !u.is_empty());
        let key = key.map(str::trim).filter(|k| !k.is_empty());

        match (url, key) {
            (None, _) => Self::Unconfigured,
            (Some(url), _) if url.starts_with("sqlite:") => Self::Sqlite {
                url: url.to_string(),
            },
            (Some(url), Some(key)) if url.starts_with("http://") || url.starts_with("https://") => {
                Self::Postgrest {
                    url: url.to_string(),
                    key: key.to_string(),
                }
            }
            (Some(url), _) => {
                warn!(url, "Store URL is not usable without a key or known scheme");
                Self::Unconfigured
            }
        }
    }

    /// Open the configured backend and wrap it in a service.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be opened.
    pub async fn open(&self) -> Result<EmailService> {
        let service = match self {
            Self::Unconfigured => {
                warn!("No store configured, reads will serve sample data");
                EmailService::unconfigured()
            }
            Self::Sqlite { url } => {
                info!(url, "Opening SQLite store");
                EmailService::new(Arc::new(SqliteEmailStore::new(url).await?))
            }
            Self::Postgrest { url, key } => {
                info!(url, "Using PostgREST store");
                EmailService::new(Arc::new(PostgrestEmailStore::new(url, key)?))
            }
        };
        Ok(service)
    }
}

/// Runtime configuration for the `serve` and `import` commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address the HTTP server listens on.
    pub bind: SocketAddr,
    /// Store URL, if any.
    pub store_url: Option<String>,
    /// Store key, if any.
    pub store_key: Option<String>,
}

impl ServerConfig {
    /// Build from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the bind address does not parse.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the bind address does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bind = lookup(BIND_VAR).unwrap_or_else(|| DEFAULT_BIND.to_string());
        Ok(Self {
            bind: parse_bind(&bind)?,
            store_url: lookup(STORE_URL_VAR),
            store_key: lookup(STORE_KEY_VAR),
        })
    }

    /// Override the listen address.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the address does not parse.
    pub fn with_bind(mut self, bind: &str) -> Result<Self> {
        self.bind = parse_bind(bind)?;
        Ok(self)
    }

    /// Override the store URL.
    #[must_use]
    pub fn with_store_url(mut self, url: impl Into<String>) -> Self {
        self.store_url = Some(url.into());
        self
    }

    /// The backend these settings select.
    #[must_use]
    pub fn store(&self) -> StoreSettings {
        StoreSettings::resolve(self.store_url.as_deref(), self.store_key.as_deref())
    }
}

fn parse_bind(value: &str) -> Result<SocketAddr> {
    value
        .parse()
        .map_err(|e| Error::Config(format!("invalid bind address {value:?}: {e}")))
}
