//! API handlers and shared request helpers.
//!
//! Handlers mirror the site's former serverless functions: one `POST` per
//! function with an `action` discriminator in the JSON body, answering with a
//! JSON object and an `{ "error": ... }` body on failure.

pub mod admin;
pub mod changes;
pub mod health;
pub mod public;
pub mod root;

use axum::{
    extract::rejection::JsonRejection,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
}

/// Build the `{ "error": message }` body every failure path uses.
pub(crate) fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

/// Log the underlying error and answer 500 with a generic message.
pub(crate) fn internal_error(message: &str, err: &anyhow::Error) -> Response {
    error!("{message}: {err:#}");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, message)
}

/// Unknown actions and malformed bodies both end up here.
pub(crate) fn invalid_request(rejection: &JsonRejection) -> Response {
    debug!("Rejected request body: {}", rejection.body_text());
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return error_response(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large");
    }
    error_response(StatusCode::BAD_REQUEST, "Invalid request")
}

/// Lightweight email sanity check used before persisting form data.
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

/// Normalize an email for lookup/uniqueness checks.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Trimmed value, or `None` when missing or blank.
pub(crate) fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Admin token from the request body, falling back to `Authorization: Bearer`.
pub(crate) fn admin_token(body_token: Option<&str>, headers: &HeaderMap) -> Option<String> {
    non_blank(body_token).or_else(|| extract_bearer_token(headers))
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
