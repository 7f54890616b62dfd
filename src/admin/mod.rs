//! Admin session guard.
//!
//! A single shared admin password protects every privileged function. A
//! successful login mints one opaque token valid for a fixed window (24 hours
//! by default); logging in again overwrites it, so at most one session is ever
//! valid. There is no server-side logout: clients drop the token and it expires.
//!
//! ## Provisioning
//!
//! The password digest lives in the same singleton row as the session. The row
//! is created either explicitly at startup from `SANCTUARY_ADMIN_PASSWORD`
//! ([`AdminGuard::seed`]) or, when first-login provisioning is enabled, by the
//! first `login` call against an empty store, which then fixes the password to
//! whatever that caller submitted. Deployments should seed the password and
//! turn first-login provisioning off.
//!
//! Failed logins are neither counted nor throttled.

mod postgres;
mod store;
mod utils;

pub use postgres::PgSessionStore;
pub use store::{AdminSession, MemorySessionStore, ProvisionOutcome, SessionStore};

use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use time::{Duration, OffsetDateTime};
use tracing::{error, info, warn};

use self::utils::{generate_session_token, hash_password};

const DEFAULT_SESSION_TTL_SECONDS: i64 = 24 * 60 * 60;

#[derive(Clone, Debug)]
pub struct AdminConfig {
    session_ttl_seconds: i64,
    first_login_provisioning: bool,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AdminConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            first_login_provisioning: true,
        }
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds.max(1);
        self
    }

    #[must_use]
    pub fn with_first_login_provisioning(mut self, enabled: bool) -> Self {
        self.first_login_provisioning = enabled;
        self
    }

    #[must_use]
    pub fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    #[must_use]
    pub fn first_login_provisioning(&self) -> bool {
        self.first_login_provisioning
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AdminAuthError {
    #[error("Invalid password")]
    InvalidCredentials,
    #[error("Unauthorized")]
    Unauthorized,
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    Deny,
}

impl Access {
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Token handed back by a successful login.
#[derive(Clone)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: OffsetDateTime,
    /// True when this login created the admin row.
    pub provisioned: bool,
}

impl std::fmt::Debug for IssuedSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedSession")
            .field("token", &"***")
            .field("expires_at", &self.expires_at)
            .field("provisioned", &self.provisioned)
            .finish()
    }
}

pub struct AdminGuard {
    config: AdminConfig,
    store: Arc<dyn SessionStore>,
}

impl std::fmt::Debug for AdminGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminGuard")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AdminGuard {
    #[must_use]
    pub fn new(config: AdminConfig, store: Arc<dyn SessionStore>) -> Self {
        Self { config, store }
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.config
    }

    /// Exchange the admin password for a fresh session token.
    ///
    /// # Errors
    /// `InvalidCredentials` for a wrong password (or an unprovisioned store when
    /// first-login provisioning is off), `Store` when the row cannot be read or written.
    pub async fn login(&self, password: &str) -> Result<IssuedSession, AdminAuthError> {
        self.login_at(password, OffsetDateTime::now_utc()).await
    }

    pub(crate) async fn login_at(
        &self,
        password: &str,
        now: OffsetDateTime,
    ) -> Result<IssuedSession, AdminAuthError> {
        let digest = hash_password(password);

        if let Some(row) = self.store.load().await? {
            return self.rotate_if_matches(&row, &digest, now).await;
        }

        if !self.config.first_login_provisioning {
            warn!("admin login rejected: no admin password provisioned");
            return Err(AdminAuthError::InvalidCredentials);
        }

        let token = generate_session_token()?;
        let expires_at = self.expiry_from(now)?;
        let session = AdminSession {
            password_hash: digest.clone(),
            current_token: Some(token.clone()),
            expires_at: Some(expires_at),
        };

        match self.store.provision(&session).await? {
            ProvisionOutcome::Inserted => {
                warn!("admin password provisioned by the first login request");
                Ok(IssuedSession {
                    token,
                    expires_at,
                    provisioned: true,
                })
            }
            ProvisionOutcome::Closed => {
                // Lost the race against another first login; compare against the winner.
                let row = self
                    .store
                    .load()
                    .await?
                    .ok_or_else(|| anyhow::anyhow!("admin row vanished after provisioning"))?;
                self.rotate_if_matches(&row, &digest, now).await
            }
        }
    }

    async fn rotate_if_matches(
        &self,
        row: &AdminSession,
        digest: &str,
        now: OffsetDateTime,
    ) -> Result<IssuedSession, AdminAuthError> {
        if !row.password_matches(digest) {
            info!("admin login rejected: invalid password");
            return Err(AdminAuthError::InvalidCredentials);
        }

        let token = generate_session_token()?;
        let expires_at = self.expiry_from(now)?;
        self.store.rotate(&token, expires_at).await?;

        Ok(IssuedSession {
            token,
            expires_at,
            provisioned: false,
        })
    }

    /// Decide whether a presented token grants admin access right now.
    ///
    /// Never fails: store errors are logged and answered with `Deny`.
    pub async fn verify(&self, token: Option<&str>) -> Access {
        self.verify_at(token, OffsetDateTime::now_utc()).await
    }

    pub(crate) async fn verify_at(&self, token: Option<&str>, now: OffsetDateTime) -> Access {
        let Some(token) = token.filter(|token| !token.is_empty()) else {
            return Access::Deny;
        };

        match self.store.load().await {
            Ok(Some(row)) if row.allows(token, now) => Access::Allow,
            Ok(_) => Access::Deny,
            Err(err) => {
                error!("Failed to load admin session: {err:#}");
                Access::Deny
            }
        }
    }

    /// `verify` for handlers that only want to bail out on denial.
    ///
    /// # Errors
    /// Returns `Unauthorized` when the token is missing, stale or unknown.
    pub async fn authorize(&self, token: Option<&str>) -> Result<(), AdminAuthError> {
        if self.verify(token).await.is_allowed() {
            Ok(())
        } else {
            Err(AdminAuthError::Unauthorized)
        }
    }

    /// Provision the admin password from configuration. An existing row is left alone.
    ///
    /// # Errors
    /// Returns an error if the store cannot be written.
    pub async fn seed(&self, password: &SecretString) -> anyhow::Result<ProvisionOutcome> {
        let session = AdminSession {
            password_hash: hash_password(password.expose_secret()),
            current_token: None,
            expires_at: None,
        };
        let outcome = self.store.provision(&session).await?;
        match outcome {
            ProvisionOutcome::Inserted => info!("admin password provisioned from configuration"),
            ProvisionOutcome::Closed => {
                info!("admin password already provisioned; configured value ignored");
            }
        }
        Ok(outcome)
    }

    fn expiry_from(&self, now: OffsetDateTime) -> Result<OffsetDateTime, AdminAuthError> {
        now.checked_add(Duration::seconds(self.config.session_ttl_seconds))
            .ok_or_else(|| {
                AdminAuthError::Store(anyhow::anyhow!(
                    "session ttl of {} seconds is out of range",
                    self.config.session_ttl_seconds
                ))
            })
    }
}
