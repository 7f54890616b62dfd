use super::{
    decode_upload, require_admin, storage,
    types::{
        NewVideo, SuccessResponse, VideoAction, VideoListResponse, VideoRequest, VideoResponse,
    },
};
use crate::{
    admin::AdminGuard,
    api::handlers::{error_response, internal_error, invalid_request, non_blank, ErrorResponse},
    feed::{ChangeFeed, Table},
    media::{Bucket, MediaStore},
};
use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

#[utoipa::path(
    post,
    path = "/functions/video-upload",
    request_body = VideoRequest,
    responses(
        (status = 200, description = "Video created (`upload`), listed (`list`) or removed (`delete`)", body = VideoResponse),
        (status = 400, description = "Malformed body, unknown action or invalid video data", body = ErrorResponse),
        (status = 401, description = "Missing or expired admin token", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    ),
    tag = "admin"
)]
#[instrument(skip_all)]
pub async fn video_upload(
    guard: Extension<Arc<AdminGuard>>,
    pool: Extension<PgPool>,
    media: Extension<Arc<MediaStore>>,
    feed: Extension<ChangeFeed>,
    headers: HeaderMap,
    payload: Result<Json<VideoRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return invalid_request(&rejection),
    };

    if let Err(response) = require_admin(&guard, request.token.as_deref(), &headers).await {
        return response;
    }

    match request.action {
        VideoAction::Upload { video_data } => upload(&pool, &media, &feed, video_data).await,
        VideoAction::List => match storage::list_videos(&pool).await {
            Ok(videos) => (StatusCode::OK, Json(VideoListResponse { videos })).into_response(),
            Err(err) => internal_error("Failed to fetch videos", &err),
        },
        VideoAction::Delete { video_data } => {
            match storage::delete_video(&pool, video_data.video_id).await {
                Ok(Some(file_url)) => {
                    if let Some(key) = media.owned_key(Bucket::Videos, &file_url) {
                        if let Err(err) = media.remove(Bucket::Videos, key).await {
                            warn!("Video row deleted but file removal failed: {err:#}");
                        }
                    }
                    info!(video_id = %video_data.video_id, "video deleted");
                    feed.publish(Table::Videos);
                    (StatusCode::OK, Json(SuccessResponse { success: true })).into_response()
                }
                Ok(None) => error_response(StatusCode::NOT_FOUND, "Video not found"),
                Err(err) => internal_error("Failed to delete video", &err),
            }
        }
    }
}

/// Where the video content comes from once the request is validated.
#[derive(Debug, PartialEq, Eq)]
enum VideoSource {
    Hosted(String),
    Upload { file_name: String, bytes: Vec<u8> },
}

fn video_source(video: &NewVideo) -> Result<VideoSource, &'static str> {
    if non_blank(Some(&video.title)).is_none() {
        return Err("Video title is required");
    }
    if video.duration.is_some_and(|duration| duration < 0)
        || video.file_size.is_some_and(|size| size < 0)
    {
        return Err("Duration and file size must not be negative");
    }

    if let Some(file) = video.file.as_deref() {
        let file_name = non_blank(video.file_name.as_deref()).ok_or("File name is required")?;
        let bytes = decode_upload(file).ok_or("File must be base64 encoded")?;
        return Ok(VideoSource::Upload { file_name, bytes });
    }

    non_blank(video.file_url.as_deref())
        .map(VideoSource::Hosted)
        .ok_or("Video file URL is required")
}

async fn upload(
    pool: &PgPool,
    media: &MediaStore,
    feed: &ChangeFeed,
    video: NewVideo,
) -> Response {
    let source = match video_source(&video) {
        Ok(source) => source,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, message),
    };

    let (file_url, stored_key) = match source {
        VideoSource::Hosted(url) => (url, None),
        VideoSource::Upload { file_name, bytes } => {
            match media.put(Bucket::Videos, &file_name, &bytes).await {
                Ok(stored) => (stored.public_url, Some(stored.key)),
                Err(err) => return internal_error("Failed to upload file", &err),
            }
        }
    };

    let title = video.title.trim();
    let description = non_blank(video.description.as_deref());
    let thumbnail_url = non_blank(video.thumbnail_url.as_deref());
    let insert = storage::VideoInsert {
        title,
        description: description.as_deref(),
        file_url: &file_url,
        thumbnail_url: thumbnail_url.as_deref(),
        duration: video.duration,
        file_size: video.file_size,
        is_featured: video.is_featured.unwrap_or(false),
    };

    match storage::insert_video(pool, &insert).await {
        Ok(video) => {
            info!(video_id = %video.id, "video created");
            feed.publish(Table::Videos);
            (
                StatusCode::OK,
                Json(VideoResponse {
                    success: true,
                    video,
                }),
            )
                .into_response()
        }
        Err(err) => {
            if let Some(key) = stored_key {
                if let Err(cleanup) = media.remove(Bucket::Videos, &key).await {
                    error!("Failed to remove orphaned video file: {cleanup:#}");
                }
            }
            internal_error("Failed to save video data", &err)
        }
    }
}
