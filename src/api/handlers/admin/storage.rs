//! Video and photo rows behind the privileged media handlers.

use super::types::{Photo, Video};
use anyhow::{Context, Result};
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::{info_span, Instrument};
use uuid::Uuid;

pub(crate) const VIDEO_COLUMNS: &str = "id, title, description, file_url, thumbnail_url, duration, \
     file_size, COALESCE(is_featured, FALSE) AS is_featured, upload_date, created_at";

pub(crate) const PHOTO_COLUMNS: &str = "id, title, description, file_url, thumbnail_url, \
     COALESCE(category, 'general') AS category, COALESCE(is_featured, FALSE) AS is_featured, upload_date";

pub(crate) struct VideoInsert<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub file_url: &'a str,
    pub thumbnail_url: Option<&'a str>,
    pub duration: Option<i32>,
    pub file_size: Option<i64>,
    pub is_featured: bool,
}

pub(crate) struct PhotoInsert<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub category: &'a str,
    pub is_featured: bool,
    pub file_url: &'a str,
}

pub(crate) fn video_from_row(row: &PgRow) -> Video {
    Video {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        file_url: row.get("file_url"),
        thumbnail_url: row.get("thumbnail_url"),
        duration: row.get("duration"),
        file_size: row.get("file_size"),
        is_featured: row.get("is_featured"),
        upload_date: row.get("upload_date"),
        created_at: row.get("created_at"),
    }
}

pub(crate) fn photo_from_row(row: &PgRow) -> Photo {
    Photo {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        file_url: row.get("file_url"),
        thumbnail_url: row.get("thumbnail_url"),
        category: row.get("category"),
        is_featured: row.get("is_featured"),
        upload_date: row.get("upload_date"),
    }
}

pub(crate) async fn insert_video(pool: &PgPool, video: &VideoInsert<'_>) -> Result<Video> {
    let query = format!(
        r"
        INSERT INTO videos
            (title, description, file_url, thumbnail_url, duration, file_size, is_featured, upload_date)
        VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
        RETURNING {VIDEO_COLUMNS}
        "
    );
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = %query
    );
    let row = sqlx::query(&query)
        .bind(video.title)
        .bind(video.description)
        .bind(video.file_url)
        .bind(video.thumbnail_url)
        .bind(video.duration)
        .bind(video.file_size)
        .bind(video.is_featured)
        .fetch_one(pool)
        .instrument(span)
        .await
        .context("failed to insert video")?;
    Ok(video_from_row(&row))
}

/// All videos, newest upload first.
pub(crate) async fn list_videos(pool: &PgPool) -> Result<Vec<Video>> {
    let query = format!(
        "SELECT {VIDEO_COLUMNS} FROM videos ORDER BY upload_date DESC, created_at DESC"
    );
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = %query
    );
    let rows = sqlx::query(&query)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to list videos")?;
    Ok(rows.iter().map(video_from_row).collect())
}

/// Delete a video row, returning the file URL it pointed at.
pub(crate) async fn delete_video(pool: &PgPool, id: Uuid) -> Result<Option<String>> {
    let query = "DELETE FROM videos WHERE id = $1 RETURNING file_url";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    let file_url: Option<String> = sqlx::query_scalar(query)
        .bind(id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to delete video")?;
    Ok(file_url)
}

pub(crate) async fn insert_photo(pool: &PgPool, photo: &PhotoInsert<'_>) -> Result<Photo> {
    let query = format!(
        r"
        INSERT INTO photos
            (title, description, category, is_featured, file_url, upload_date)
        VALUES ($1, $2, $3, $4, $5, NOW())
        RETURNING {PHOTO_COLUMNS}
        "
    );
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = %query
    );
    let row = sqlx::query(&query)
        .bind(photo.title)
        .bind(photo.description)
        .bind(photo.category)
        .bind(photo.is_featured)
        .bind(photo.file_url)
        .fetch_one(pool)
        .instrument(span)
        .await
        .context("failed to insert photo")?;
    Ok(photo_from_row(&row))
}

/// Photos for the gallery, featured first, newest first.
pub(crate) async fn list_photos(pool: &PgPool) -> Result<Vec<Photo>> {
    let query = format!(
        "SELECT {PHOTO_COLUMNS} FROM photos \
         ORDER BY COALESCE(is_featured, FALSE) DESC, upload_date DESC"
    );
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = %query
    );
    let rows = sqlx::query(&query)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to list photos")?;
    Ok(rows.iter().map(photo_from_row).collect())
}

/// Delete a photo row, returning its file URL; `None` if it did not exist.
pub(crate) async fn delete_photo(pool: &PgPool, id: Uuid) -> Result<Option<String>> {
    let query = "DELETE FROM photos WHERE id = $1 RETURNING file_url";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    let file_url: Option<String> = sqlx::query_scalar(query)
        .bind(id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to delete photo")?;
    Ok(file_url)
}
