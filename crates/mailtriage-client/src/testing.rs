//! In-process `EmailApi` over the core service, for unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use mailtriage_core::{
    Analytics, Email, EmailId, EmailPage, EmailPatch, EmailQuery, EmailService, NewEmail,
    SqliteEmailStore,
};

use tokio::sync::Notify;

use crate::api::EmailApi;
use crate::{ClientError, Result};

pub struct LocalApi {
    service: EmailService,
    list_calls: AtomicUsize,
    analytics_calls: AtomicUsize,
    fail_writes: AtomicBool,
    hold_lists: AtomicBool,
    release: Notify,
}

impl LocalApi {
    #[allow(clippy::unwrap_used)]
    pub async fn sqlite() -> Self {
        let store = SqliteEmailStore::in_memory().await.unwrap();
        Self {
            service: EmailService::new(Arc::new(store)),
            list_calls: AtomicUsize::new(0),
            analytics_calls: AtomicUsize::new(0),
            fail_writes: AtomicBool::new(false),
            hold_lists: AtomicBool::new(false),
            release: Notify::new(),
        }
    }

    #[allow(clippy::unwrap_used)]
    pub async fn seed(&self, new: NewEmail) -> Email {
        self.service.create_email(new).await.unwrap()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// While held, each `list_emails` call waits for [`Self::release_lists`].
    pub fn hold_lists(&self, hold: bool) {
        self.hold_lists.store(hold, Ordering::SeqCst);
    }

    pub fn release_lists(&self) {
        self.hold_lists.store(false, Ordering::SeqCst);
        self.release.notify_one();
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn analytics_calls(&self) -> usize {
        self.analytics_calls.load(Ordering::SeqCst)
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ClientError::Status {
                status: 500,
                message: "Internal server error".into(),
            });
        }
        Ok(())
    }
}

fn to_client(err: mailtriage_core::Error) -> ClientError {
    let status = match &err {
        mailtriage_core::Error::NotFound(_) => 404,
        mailtriage_core::Error::InvalidInput(_) => 400,
        _ => 500,
    };
    ClientError::Status {
        status,
        message: err.to_string(),
    }
}

#[async_trait]
impl EmailApi for LocalApi {
    async fn list_emails(&self, query: &EmailQuery) -> Result<EmailPage> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.hold_lists.load(Ordering::SeqCst) {
            self.release.notified().await;
        }
        Ok(self.service.list_emails(query).await)
    }

    async fn get_email(&self, id: &EmailId) -> Result<Email> {
        self.service.get_email(id).await.map_err(to_client)
    }

    async fn update_email(&self, id: &EmailId, patch: &EmailPatch) -> Result<Email> {
        self.check_writable()?;
        self.service.update_email(id, patch).await.map_err(to_client)
    }

    async fn add_reply(&self, id: &EmailId, reply: &str) -> Result<Email> {
        self.check_writable()?;
        self.service.append_reply(id, reply).await.map_err(to_client)
    }

    async fn create_email(&self, new: &NewEmail) -> Result<Email> {
        self.check_writable()?;
        self.service.create_email(new.clone()).await.map_err(to_client)
    }

    async fn analytics(&self) -> Result<Analytics> {
        self.analytics_calls.fetch_add(1, Ordering::SeqCst);
        self.service.analytics().await.map_err(to_client)
    }
}
