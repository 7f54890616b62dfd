//! YouTube live-stream settings.
//!
//! One row in `youtube_settings` holds the channel coordinates, the API
//! credentials and the live flag. [`LiveStream`] owns every read and write of
//! that row; nothing here talks to YouTube itself.

use anyhow::{Context, Result};
use serde::Serialize;
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::{info_span, Instrument};
use utoipa::ToSchema;
use uuid::Uuid;

const SETTINGS_LOCK_ID: i64 = 7_110_425;

const SETTINGS_COLUMNS: &str =
    "id, channel_id, channel_name, channel_url, api_key, live_stream_key, COALESCE(is_live, FALSE) AS is_live";

#[derive(Clone)]
pub struct LiveSettings {
    pub id: Uuid,
    pub channel_id: Option<String>,
    pub channel_name: Option<String>,
    pub channel_url: Option<String>,
    pub api_key: Option<String>,
    pub live_stream_key: Option<String>,
    pub is_live: bool,
}

impl std::fmt::Debug for LiveSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveSettings")
            .field("id", &self.id)
            .field("channel_id", &self.channel_id)
            .field("channel_name", &self.channel_name)
            .field("is_live", &self.is_live)
            .finish_non_exhaustive()
    }
}

/// What the public site and the admin page get to see.
#[derive(ToSchema, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PublicLiveSettings {
    pub channel_id: Option<String>,
    pub channel_name: Option<String>,
    pub channel_url: Option<String>,
    pub is_live: bool,
    pub stream_url: Option<String>,
}

impl LiveSettings {
    /// Channel live page, when a channel id is configured.
    #[must_use]
    pub fn stream_url(&self) -> Option<String> {
        self.channel_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| format!("https://www.youtube.com/channel/{id}/live"))
    }

    #[must_use]
    pub fn public(&self) -> PublicLiveSettings {
        PublicLiveSettings {
            channel_id: self.channel_id.clone(),
            channel_name: self.channel_name.clone(),
            channel_url: self.channel_url.clone(),
            is_live: self.is_live,
            stream_url: self.stream_url(),
        }
    }

    fn from_row(row: &PgRow) -> Self {
        Self {
            id: row.get("id"),
            channel_id: row.get("channel_id"),
            channel_name: row.get("channel_name"),
            channel_url: row.get("channel_url"),
            api_key: row.get("api_key"),
            live_stream_key: row.get("live_stream_key"),
            is_live: row.get("is_live"),
        }
    }
}

/// Partial update; `None` leaves the stored value alone.
#[derive(Default, Clone)]
pub struct LiveSettingsUpdate {
    pub api_key: Option<String>,
    pub channel_id: Option<String>,
    pub channel_name: Option<String>,
    pub live_stream_key: Option<String>,
}

impl LiveSettingsUpdate {
    /// Channel URL derived from the channel id, if one is being set.
    #[must_use]
    pub fn channel_url(&self) -> Option<String> {
        self.channel_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| format!("https://www.youtube.com/channel/{id}"))
    }
}

#[derive(Clone, Debug)]
pub struct LiveStream {
    pool: PgPool,
}

impl LiveStream {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Current settings row, if any.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn current(&self) -> Result<Option<LiveSettings>> {
        let query = format!(
            "SELECT {SETTINGS_COLUMNS} FROM youtube_settings ORDER BY created_at ASC LIMIT 1"
        );
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = %query
        );
        let row = sqlx::query(&query)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to load youtube settings")?;
        Ok(row.as_ref().map(LiveSettings::from_row))
    }

    /// Create the settings row or update the existing one.
    ///
    /// # Errors
    /// Returns an error if the transaction fails.
    pub async fn configure(&self, update: &LiveSettingsUpdate) -> Result<LiveSettings> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(SETTINGS_LOCK_ID)
            .execute(&mut *tx)
            .await
            .context("failed to lock youtube settings")?;

        let existing: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM youtube_settings ORDER BY created_at ASC LIMIT 1")
                .fetch_optional(&mut *tx)
                .await?;

        let channel_url = update.channel_url();
        let row = if let Some(id) = existing {
            let query = format!(
                r"
                UPDATE youtube_settings
                SET api_key = COALESCE($2, api_key),
                    channel_id = COALESCE($3, channel_id),
                    channel_name = COALESCE($4, channel_name),
                    live_stream_key = COALESCE($5, live_stream_key),
                    channel_url = COALESCE($6, channel_url),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING {SETTINGS_COLUMNS}
                "
            );
            let span = info_span!(
                "db.query",
                db.system = "postgresql",
                db.operation = "UPDATE",
                db.statement = %query
            );
            sqlx::query(&query)
                .bind(id)
                .bind(update.api_key.as_deref())
                .bind(update.channel_id.as_deref())
                .bind(update.channel_name.as_deref())
                .bind(update.live_stream_key.as_deref())
                .bind(channel_url.as_deref())
                .fetch_one(&mut *tx)
                .instrument(span)
                .await
                .context("failed to update youtube settings")?
        } else {
            let query = format!(
                r"
                INSERT INTO youtube_settings
                    (api_key, channel_id, channel_name, live_stream_key, channel_url, is_live)
                VALUES ($1, $2, $3, $4, $5, FALSE)
                RETURNING {SETTINGS_COLUMNS}
                "
            );
            let span = info_span!(
                "db.query",
                db.system = "postgresql",
                db.operation = "INSERT",
                db.statement = %query
            );
            sqlx::query(&query)
                .bind(update.api_key.as_deref())
                .bind(update.channel_id.as_deref())
                .bind(update.channel_name.as_deref())
                .bind(update.live_stream_key.as_deref())
                .bind(channel_url.as_deref())
                .fetch_one(&mut *tx)
                .instrument(span)
                .await
                .context("failed to insert youtube settings")?
        };

        tx.commit().await?;
        Ok(LiveSettings::from_row(&row))
    }

    /// Flip the live flag. `None` when nothing is configured yet.
    ///
    /// # Errors
    /// Returns an error if the update fails.
    pub async fn set_live(&self, is_live: bool) -> Result<Option<LiveSettings>> {
        let query = format!(
            r"
            UPDATE youtube_settings
            SET is_live = $1, updated_at = NOW()
            WHERE id = (SELECT id FROM youtube_settings ORDER BY created_at ASC LIMIT 1)
            RETURNING {SETTINGS_COLUMNS}
            "
        );
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = %query
        );
        let row = sqlx::query(&query)
            .bind(is_live)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to update live status")?;
        Ok(row.as_ref().map(LiveSettings::from_row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(channel_id: Option<&str>) -> LiveSettings {
        LiveSettings {
            id: Uuid::nil(),
            channel_id: channel_id.map(str::to_string),
            channel_name: Some("Grace Chapel".to_string()),
            channel_url: None,
            api_key: Some("api-secret".to_string()),
            live_stream_key: Some("stream-secret".to_string()),
            is_live: true,
        }
    }

    #[test]
    fn stream_url_needs_channel_id() {
        assert_eq!(
            settings(Some("UC123")).stream_url().as_deref(),
            Some("https://www.youtube.com/channel/UC123/live")
        );
        assert_eq!(settings(Some("  ")).stream_url(), None);
        assert_eq!(settings(None).stream_url(), None);
    }

    #[test]
    fn public_view_drops_secrets() -> Result<()> {
        let value = serde_json::to_value(settings(Some("UC123")).public())?;
        let text = value.to_string();
        assert!(!text.contains("api-secret"));
        assert!(!text.contains("stream-secret"));
        assert_eq!(value["is_live"], true);
        assert_eq!(value["channel_name"], "Grace Chapel");
        Ok(())
    }

    #[test]
    fn public_view_lists_status_fields() -> Result<()> {
        let value = serde_json::to_value(settings(Some("UC123")).public())?;
        let mut keys: Vec<&str> = value
            .as_object()
            .map(|object| object.keys().map(String::as_str).collect())
            .unwrap_or_default();
        keys.sort_unstable();
        assert_eq!(
            keys,
            ["channel_id", "channel_name", "channel_url", "is_live", "stream_url"]
        );
        assert_eq!(
            value["stream_url"],
            "https://www.youtube.com/channel/UC123/live"
        );
        Ok(())
    }

    #[test]
    fn debug_redacts_secrets() {
        let rendered = format!("{:?}", settings(Some("UC123")));
        assert!(!rendered.contains("api-secret"));
        assert!(!rendered.contains("stream-secret"));
    }

    #[test]
    fn update_derives_channel_url() {
        let update = LiveSettingsUpdate {
            channel_id: Some("UC123".to_string()),
            ..LiveSettingsUpdate::default()
        };
        assert_eq!(
            update.channel_url().as_deref(),
            Some("https://www.youtube.com/channel/UC123")
        );
        assert_eq!(LiveSettingsUpdate::default().channel_url(), None);
    }
}
