//! The admin session row and the storage seam behind it.
//!
//! There is exactly one logical row: the shared password digest plus the one
//! session token that is currently valid. The guard only reads and writes it
//! through [`SessionStore`].

use anyhow::Result;
use async_trait::async_trait;
use subtle::ConstantTimeEq;
use time::OffsetDateTime;
use tokio::sync::RwLock;

/// Singleton admin credential/session state.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminSession {
    pub password_hash: String,
    pub current_token: Option<String>,
    pub expires_at: Option<OffsetDateTime>,
}

impl AdminSession {
    /// A token is accepted only if it is the current one and `now < expires_at`.
    #[must_use]
    pub fn allows(&self, token: &str, now: OffsetDateTime) -> bool {
        let Some(current) = self.current_token.as_deref() else {
            return false;
        };
        let Some(expires_at) = self.expires_at else {
            return false;
        };
        !token.is_empty() && constant_time_eq(current, token) && now < expires_at
    }

    #[must_use]
    pub fn password_matches(&self, password_hash: &str) -> bool {
        constant_time_eq(&self.password_hash, password_hash)
    }
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    bool::from(a.as_bytes().ct_eq(b.as_bytes()))
}

impl std::fmt::Debug for AdminSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSession")
            .field("password_hash", &"***")
            .field("current_token", &self.current_token.as_ref().map(|_| "***"))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionOutcome {
    Inserted,
    /// A row already existed; nothing was written.
    Closed,
}

/// Persistence for the singleton admin session row.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Read the row, `None` when nobody has been provisioned yet.
    async fn load(&self) -> Result<Option<AdminSession>>;

    /// Insert the row if, and only if, none exists.
    async fn provision(&self, session: &AdminSession) -> Result<ProvisionOutcome>;

    /// Overwrite the current token and its expiry.
    async fn rotate(&self, token: &str, expires_at: OffsetDateTime) -> Result<()>;
}

/// In-process store, used for local runs without the admin table and in tests.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    row: RwLock<Option<AdminSession>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the expiry of the current session, e.g. into the past.
    pub async fn set_expires_at(&self, expires_at: Option<OffsetDateTime>) {
        if let Some(row) = self.row.write().await.as_mut() {
            row.expires_at = expires_at;
        }
    }

    pub async fn snapshot(&self) -> Option<AdminSession> {
        self.row.read().await.clone()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> Result<Option<AdminSession>> {
        Ok(self.row.read().await.clone())
    }

    async fn provision(&self, session: &AdminSession) -> Result<ProvisionOutcome> {
        let mut row = self.row.write().await;
        if row.is_some() {
            return Ok(ProvisionOutcome::Closed);
        }
        *row = Some(session.clone());
        Ok(ProvisionOutcome::Inserted)
    }

    async fn rotate(&self, token: &str, expires_at: OffsetDateTime) -> Result<()> {
        let mut row = self.row.write().await;
        let Some(row) = row.as_mut() else {
            return Err(anyhow::anyhow!("admin session row does not exist"));
        };
        row.current_token = Some(token.to_string());
        row.expires_at = Some(expires_at);
        Ok(())
    }
}
