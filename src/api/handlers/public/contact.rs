use super::{
    required_email,
    storage::{self, NewContact},
    types::{ContactInput, ContactResponse},
};
use crate::api::handlers::{
    error_response, internal_error, invalid_request, non_blank, ErrorResponse,
};
use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use sqlx::PgPool;
use tracing::{info, instrument};

const MISSING_FIELDS: &str = "Missing required fields";

#[utoipa::path(
    post,
    path = "/functions/contact-submission",
    request_body = ContactInput,
    responses(
        (status = 200, description = "Message stored for the office", body = ContactResponse),
        (status = 400, description = "Missing fields or invalid email", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    ),
    tag = "forms"
)]
#[instrument(skip_all)]
pub async fn contact_submission(
    pool: Extension<PgPool>,
    payload: Result<Json<ContactInput>, JsonRejection>,
) -> Response {
    let input = match payload {
        Ok(Json(input)) => input,
        Err(rejection) => return invalid_request(&rejection),
    };

    let contact = match validate(&input) {
        Ok(contact) => contact,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, message),
    };

    match storage::insert_contact(&pool, &contact).await {
        Ok(data) => {
            info!(contact_id = %data.id, "contact submission received");
            (
                StatusCode::OK,
                Json(ContactResponse {
                    success: true,
                    data,
                }),
            )
                .into_response()
        }
        Err(err) => internal_error("Failed to send message", &err),
    }
}

fn validate(input: &ContactInput) -> Result<NewContact, &'static str> {
    Ok(NewContact {
        first_name: non_blank(input.first_name.as_deref()).ok_or(MISSING_FIELDS)?,
        last_name: non_blank(input.last_name.as_deref()).ok_or(MISSING_FIELDS)?,
        email: required_email(input.email.as_deref(), MISSING_FIELDS)?,
        phone: non_blank(input.phone.as_deref()),
        subject: non_blank(input.subject.as_deref()).ok_or(MISSING_FIELDS)?,
        message: non_blank(input.message.as_deref()).ok_or(MISSING_FIELDS)?,
    })
}
