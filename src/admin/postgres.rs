//! `admin_settings` backed session store.
//!
//! Flow Overview:
//! 1) Read the single admin row (oldest row wins if the table ever holds more).
//! 2) Provision the row under an advisory lock so two first logins cannot both insert.
//! 3) Rotate the session token in place; the last writer wins.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use time::OffsetDateTime;
use tracing::Instrument;

use super::store::{AdminSession, ProvisionOutcome, SessionStore};

const PROVISION_LOCK_ID: i64 = 7_110_424;

#[derive(Debug, Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn load(&self) -> Result<Option<AdminSession>> {
        let query = r"
            SELECT password_hash, session_token, session_expires_at
            FROM admin_settings
            ORDER BY created_at
            LIMIT 1
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to load admin settings")?;

        Ok(row.map(|row| AdminSession {
            password_hash: row.get("password_hash"),
            current_token: row.get("session_token"),
            expires_at: row.get("session_expires_at"),
        }))
    }

    async fn provision(&self, session: &AdminSession) -> Result<ProvisionOutcome> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("failed to begin provisioning transaction")?;

        let lock_query = "SELECT pg_advisory_xact_lock($1)";
        let lock_span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = lock_query
        );
        sqlx::query(lock_query)
            .bind(PROVISION_LOCK_ID)
            .execute(&mut *tx)
            .instrument(lock_span)
            .await
            .context("failed to acquire provisioning lock")?;

        let count_query = "SELECT COUNT(*) AS count FROM admin_settings";
        let count_span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = count_query
        );
        let row = sqlx::query(count_query)
            .fetch_one(&mut *tx)
            .instrument(count_span)
            .await
            .context("failed to count admin settings")?;
        let count: i64 = row.get("count");
        if count != 0 {
            tx.rollback()
                .await
                .context("failed to rollback provisioning transaction")?;
            return Ok(ProvisionOutcome::Closed);
        }

        let insert_query = r"
            INSERT INTO admin_settings (password_hash, session_token, session_expires_at)
            VALUES ($1, $2, $3)
        ";
        let insert_span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = insert_query
        );
        sqlx::query(insert_query)
            .bind(&session.password_hash)
            .bind(session.current_token.as_deref())
            .bind(session.expires_at)
            .execute(&mut *tx)
            .instrument(insert_span)
            .await
            .context("failed to insert admin settings")?;

        tx.commit()
            .await
            .context("failed to commit provisioning transaction")?;

        Ok(ProvisionOutcome::Inserted)
    }

    async fn rotate(&self, token: &str, expires_at: OffsetDateTime) -> Result<()> {
        let query = r"
            UPDATE admin_settings
            SET session_token = $1,
                session_expires_at = $2,
                updated_at = NOW()
            WHERE id = (SELECT id FROM admin_settings ORDER BY created_at LIMIT 1)
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(token)
            .bind(expires_at)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to rotate admin session")?;

        if result.rows_affected() == 0 {
            return Err(anyhow::anyhow!("admin settings row does not exist"));
        }
        Ok(())
    }
}
