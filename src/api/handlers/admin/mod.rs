//! Privileged functions. Every action except `admin-auth` and the live-stream
//! `status` requires a currently valid admin session token.

pub mod auth;
pub mod photos;
mod storage;
pub mod types;
pub mod videos;
pub mod youtube;

pub(crate) use storage::{list_photos, list_videos};

use crate::{
    admin::AdminGuard,
    api::handlers::{admin_token, error_response},
};
use axum::{
    http::{HeaderMap, StatusCode},
    response::Response,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::info;

/// `Err` carries the ready-made 401 response.
pub(crate) async fn require_admin(
    guard: &AdminGuard,
    body_token: Option<&str>,
    headers: &HeaderMap,
) -> Result<(), Response> {
    let token = admin_token(body_token, headers);
    match guard.authorize(token.as_deref()).await {
        Ok(()) => Ok(()),
        Err(err) => {
            info!("Rejected privileged request: {err}");
            Err(error_response(StatusCode::UNAUTHORIZED, "Unauthorized"))
        }
    }
}

/// Decode an uploaded file given as plain base64 or a `data:` URL.
pub(crate) fn decode_upload(file: &str) -> Option<Vec<u8>> {
    let data = match file.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => file,
    };
    STANDARD
        .decode(data.trim())
        .ok()
        .filter(|bytes| !bytes.is_empty())
}

#[cfg(test)]
mod tests;
