//! Shared, observable email cache.
//!
//! One instance is created by the application and handed (as `Arc`) to
//! every view that shows emails, so a change made through one view is seen
//! by all of them. Each write bumps a version number published on a
//! `tokio::sync::watch` channel.

use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use mailtriage_core::{AiDraft, Email, EmailId, EmailStatus};
use tokio::sync::watch;

#[derive(Default)]
struct Entries {
    emails: HashMap<EmailId, Email>,
    stale: HashSet<EmailId>,
}

/// Emails keyed by id, with change notification.
pub struct EmailCache {
    entries: RwLock<Entries>,
    version: watch::Sender<u64>,
}

impl Default for EmailCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EmailCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailCache")
            .field("len", &self.len())
            .field("version", &self.version())
            .finish()
    }
}

impl EmailCache {
    /// Create an empty cache at version 0.
    #[must_use]
    pub fn new() -> Self {
        let (version, _) = watch::channel(0);
        Self {
            entries: RwLock::new(Entries::default()),
            version,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Entries> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Entries> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn bump(&self) {
        self.version.send_modify(|v| *v += 1);
    }

    /// Receiver that wakes on every change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    /// Current version; increases by one per write.
    #[must_use]
    pub fn version(&self) -> u64 {
        *self.version.borrow()
    }

    /// Drop everything and load `emails`.
    pub fn replace(&self, emails: impl IntoIterator<Item = Email>) {
        {
            let mut entries = self.write();
            entries.stale.clear();
            entries.emails = emails.into_iter().map(|e| (e.id.clone(), e)).collect();
        }
        self.bump();
    }

    /// Insert or overwrite one email; clears its stale mark.
    pub fn upsert(&self, email: Email) {
        {
            let mut entries = self.write();
            entries.stale.remove(&email.id);
            entries.emails.insert(email.id.clone(), email);
        }
        self.bump();
    }

    /// Insert or overwrite several emails as one change.
    pub fn upsert_many(&self, emails: impl IntoIterator<Item = Email>) {
        {
            let mut entries = self.write();
            for email in emails {
                entries.stale.remove(&email.id);
                entries.emails.insert(email.id.clone(), email);
            }
        }
        self.bump();
    }

    /// Copy of one email.
    #[must_use]
    pub fn get(&self, id: &EmailId) -> Option<Email> {
        self.read().emails.get(id).cloned()
    }

    /// Whether the email is cached.
    #[must_use]
    pub fn contains(&self, id: &EmailId) -> bool {
        self.read().emails.contains_key(id)
    }

    /// Set an email's status, returning the previous one.
    ///
    /// Returns `None` (and changes nothing) if the email is not cached.
    pub fn set_status(&self, id: &EmailId, status: EmailStatus) -> Option<EmailStatus> {
        let previous = {
            let mut entries = self.write();
            let email = entries.emails.get_mut(id)?;
            std::mem::replace(&mut email.status, status)
        };
        self.bump();
        Some(previous)
    }

    /// Attach or clear an AI draft. Returns `false` if the email is not cached.
    pub fn set_ai_response(&self, id: &EmailId, draft: Option<AiDraft>) -> bool {
        {
            let mut entries = self.write();
            let Some(email) = entries.emails.get_mut(id) else {
                return false;
            };
            email.enrichment.ai_response = draft;
        }
        self.bump();
        true
    }

    /// Flag an entry as possibly out of sync with the server.
    pub fn mark_stale(&self, id: &EmailId) {
        let inserted = self.write().stale.insert(id.clone());
        if inserted {
            self.bump();
        }
    }

    /// Whether the entry is flagged as out of sync.
    #[must_use]
    pub fn is_stale(&self, id: &EmailId) -> bool {
        self.read().stale.contains(id)
    }

    /// Every cached email, newest `sent_date` first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Email> {
        let mut emails: Vec<Email> = self.read().emails.values().cloned().collect();
        emails.sort_by(|a, b| b.sent_date.cmp(&a.sent_date).then_with(|| a.id.cmp(&b.id)));
        emails
    }

    /// Number of cached emails.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().emails.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().emails.is_empty()
    }
}
