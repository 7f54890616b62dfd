use super::{
    decode_upload, require_admin, storage,
    types::{NewPhoto, PhotoAction, PhotoRequest, PhotoResponse, SuccessResponse},
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
use uuid::Uuid;

const DEFAULT_CATEGORY: &str = "general";

#[utoipa::path(
    post,
    path = "/functions/photo-upload",
    request_body = PhotoRequest,
    responses(
        (status = 200, description = "Photo stored (`upload`) or removed (`delete`)", body = PhotoResponse),
        (status = 400, description = "Malformed body, unknown action or invalid photo data", body = ErrorResponse),
        (status = 401, description = "Missing or expired admin token", body = ErrorResponse),
        (status = 404, description = "Photo not found", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    ),
    tag = "admin"
)]
#[instrument(skip_all)]
pub async fn photo_upload(
    guard: Extension<Arc<AdminGuard>>,
    pool: Extension<PgPool>,
    media: Extension<Arc<MediaStore>>,
    feed: Extension<ChangeFeed>,
    headers: HeaderMap,
    payload: Result<Json<PhotoRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return invalid_request(&rejection),
    };

    if let Err(response) = require_admin(&guard, request.token.as_deref(), &headers).await {
        return response;
    }

    match request.action {
        PhotoAction::Upload(photo) => upload(&pool, &media, &feed, photo).await,
        PhotoAction::Delete { photo_id } => delete(&pool, &media, &feed, photo_id).await,
    }
}

#[derive(Debug, PartialEq, Eq)]
struct ValidPhoto {
    title: String,
    description: Option<String>,
    category: String,
    is_featured: bool,
    file_name: String,
    bytes: Vec<u8>,
}

fn validate(photo: &NewPhoto) -> Result<ValidPhoto, &'static str> {
    let title = non_blank(Some(&photo.title)).ok_or("Photo title is required")?;
    let file_name = non_blank(Some(&photo.file_name)).ok_or("File name is required")?;
    let bytes = decode_upload(&photo.file).ok_or("File must be base64 encoded")?;
    Ok(ValidPhoto {
        title,
        description: non_blank(photo.description.as_deref()),
        category: non_blank(photo.category.as_deref())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        is_featured: photo.is_featured.unwrap_or(false),
        file_name,
        bytes,
    })
}

async fn upload(pool: &PgPool, media: &MediaStore, feed: &ChangeFeed, photo: NewPhoto) -> Response {
    let photo = match validate(&photo) {
        Ok(photo) => photo,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, message),
    };

    let stored = match media.put(Bucket::Photos, &photo.file_name, &photo.bytes).await {
        Ok(stored) => stored,
        Err(err) => return internal_error("Failed to upload file", &err),
    };

    let insert = storage::PhotoInsert {
        title: &photo.title,
        description: photo.description.as_deref(),
        category: &photo.category,
        is_featured: photo.is_featured,
        file_url: &stored.public_url,
    };

    match storage::insert_photo(pool, &insert).await {
        Ok(photo) => {
            info!(photo_id = %photo.id, key = %stored.key, "photo uploaded");
            feed.publish(Table::Photos);
            (
                StatusCode::OK,
                Json(PhotoResponse {
                    success: true,
                    photo,
                }),
            )
                .into_response()
        }
        Err(err) => {
            if let Err(cleanup) = media.remove(Bucket::Photos, &stored.key).await {
                error!("Failed to remove orphaned photo file: {cleanup:#}");
            }
            internal_error("Failed to save photo data", &err)
        }
    }
}

async fn delete(pool: &PgPool, media: &MediaStore, feed: &ChangeFeed, photo_id: Uuid) -> Response {
    let file_url = match storage::delete_photo(pool, photo_id).await {
        Ok(Some(file_url)) => file_url,
        Ok(None) => return error_response(StatusCode::NOT_FOUND, "Photo not found"),
        Err(err) => return internal_error("Failed to delete photo", &err),
    };

    // Rows may point at files hosted elsewhere; those are left alone.
    if let Some(key) = media.owned_key(Bucket::Photos, &file_url) {
        if let Err(err) = media.remove(Bucket::Photos, key).await {
            warn!("Photo row deleted but file removal failed: {err:#}");
        }
    }

    info!(photo_id = %photo_id, "photo deleted");
    feed.publish(Table::Photos);
    (StatusCode::OK, Json(SuccessResponse { success: true })).into_response()
}
