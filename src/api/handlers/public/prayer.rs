use super::{
    optional_email,
    storage::{self, NewPrayerRequest},
    types::{PrayerRequestInput, PrayerRequestResponse},
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

#[utoipa::path(
    post,
    path = "/functions/prayer-request",
    request_body = PrayerRequestInput,
    responses(
        (status = 200, description = "Prayer request stored", body = PrayerRequestResponse),
        (status = 400, description = "Missing name or request", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    ),
    tag = "forms"
)]
#[instrument(skip_all)]
pub async fn prayer_request(
    pool: Extension<PgPool>,
    payload: Result<Json<PrayerRequestInput>, JsonRejection>,
) -> Response {
    let input = match payload {
        Ok(Json(input)) => input,
        Err(rejection) => return invalid_request(&rejection),
    };

    let prayer = match validate(&input) {
        Ok(prayer) => prayer,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, message),
    };

    match storage::insert_prayer_request(&pool, &prayer).await {
        Ok(data) => {
            info!(prayer_request_id = %data.id, urgent = data.is_urgent, "prayer request received");
            (
                StatusCode::OK,
                Json(PrayerRequestResponse {
                    success: true,
                    data,
                }),
            )
                .into_response()
        }
        Err(err) => internal_error("Failed to submit prayer request", &err),
    }
}

fn validate(input: &PrayerRequestInput) -> Result<NewPrayerRequest, &'static str> {
    const REQUIRED: &str = "Name and prayer request are required";
    let name = non_blank(input.name.as_deref()).ok_or(REQUIRED)?;
    let request = non_blank(input.request.as_deref()).ok_or(REQUIRED)?;
    Ok(NewPrayerRequest {
        name,
        email: optional_email(input.email.as_deref())?,
        phone: non_blank(input.phone.as_deref()),
        request,
        is_urgent: input.is_urgent.unwrap_or(false),
        is_confidential: input.is_confidential.unwrap_or(false),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_and_request_are_required() {
        let missing_name = PrayerRequestInput {
            request: Some("Healing for my mother".to_string()),
            ..PrayerRequestInput::default()
        };
        assert_eq!(
            validate(&missing_name).err(),
            Some("Name and prayer request are required")
        );

        let blank_request = PrayerRequestInput {
            name: Some("Ana".to_string()),
            request: Some("   ".to_string()),
            ..PrayerRequestInput::default()
        };
        assert!(validate(&blank_request).is_err());
    }

    #[test]
    fn optional_fields_default() {
        let input = PrayerRequestInput {
            name: Some(" Ana ".to_string()),
            request: Some("Peace".to_string()),
            email: Some(String::new()),
            phone: Some(" ".to_string()),
            ..PrayerRequestInput::default()
        };
        let prayer = validate(&input);
        assert!(prayer.is_ok_and(|p| p.name == "Ana"
            && p.email.is_none()
            && p.phone.is_none()
            && !p.is_urgent
            && !p.is_confidential));
    }

    #[test]
    fn malformed_email_is_rejected() {
        let input = PrayerRequestInput {
            name: Some("Ana".to_string()),
            request: Some("Peace".to_string()),
            email: Some("ana-at-example".to_string()),
            ..PrayerRequestInput::default()
        };
        assert_eq!(validate(&input).err(), Some("Invalid email address"));
    }
}
