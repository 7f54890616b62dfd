//! Read models the public media pages re-fetch after each change notice.

use crate::api::handlers::{
    admin::{
        list_photos, list_videos,
        types::{PhotoListResponse, VideoListResponse},
    },
    internal_error, ErrorResponse,
};
use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use sqlx::PgPool;
use tracing::instrument;

#[utoipa::path(
    get,
    path = "/v1/videos",
    responses(
        (status = 200, description = "All videos, newest first", body = VideoListResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    ),
    tag = "media"
)]
#[instrument(skip_all)]
pub async fn videos(pool: Extension<PgPool>) -> Response {
    match list_videos(&pool).await {
        Ok(videos) => (StatusCode::OK, Json(VideoListResponse { videos })).into_response(),
        Err(err) => internal_error("Failed to fetch videos", &err),
    }
}

#[utoipa::path(
    get,
    path = "/v1/photos",
    responses(
        (status = 200, description = "All photos, featured first then newest", body = PhotoListResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    ),
    tag = "media"
)]
#[instrument(skip_all)]
pub async fn photos(pool: Extension<PgPool>) -> Response {
    match list_photos(&pool).await {
        Ok(photos) => (StatusCode::OK, Json(PhotoListResponse { photos })).into_response(),
        Err(err) => internal_error("Failed to fetch photos", &err),
    }
}
