use super::{
    required_email,
    storage::{self, NewVolunteer, VolunteerOutcome},
    types::{VolunteerInput, VolunteerResponse},
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
const DEFAULT_POSITION: &str = "Volunteer";

#[utoipa::path(
    post,
    path = "/functions/ministry-volunteer",
    request_body = VolunteerInput,
    responses(
        (status = 200, description = "Volunteer signed up", body = VolunteerResponse),
        (status = 400, description = "Missing fields or already volunteering", body = ErrorResponse),
        (status = 404, description = "Ministry not found or inactive", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    ),
    tag = "forms"
)]
#[instrument(skip_all)]
pub async fn ministry_volunteer(
    pool: Extension<PgPool>,
    payload: Result<Json<VolunteerInput>, JsonRejection>,
) -> Response {
    let input = match payload {
        Ok(Json(input)) => input,
        Err(rejection) => return invalid_request(&rejection),
    };

    let volunteer = match validate(&input) {
        Ok(volunteer) => volunteer,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, message),
    };

    match storage::register_volunteer(&pool, &volunteer).await {
        Ok(VolunteerOutcome::Registered(data, ministry)) => {
            info!(ministry_id = %ministry.id, volunteer_id = %data.id, "volunteer registered");
            (
                StatusCode::OK,
                Json(VolunteerResponse {
                    success: true,
                    data,
                    ministry,
                }),
            )
                .into_response()
        }
        Ok(VolunteerOutcome::MinistryNotFound) => {
            error_response(StatusCode::NOT_FOUND, "Ministry not found or inactive")
        }
        Ok(VolunteerOutcome::AlreadyVolunteering) => error_response(
            StatusCode::BAD_REQUEST,
            "You are already registered as a volunteer for this ministry",
        ),
        Err(err) => internal_error("Failed to register as volunteer", &err),
    }
}

fn validate(input: &VolunteerInput) -> Result<NewVolunteer, &'static str> {
    let ministry_id = input.ministry_id.ok_or(MISSING_FIELDS)?;
    let first_name = non_blank(input.first_name.as_deref()).ok_or(MISSING_FIELDS)?;
    let last_name = non_blank(input.last_name.as_deref()).ok_or(MISSING_FIELDS)?;
    let email = required_email(input.email.as_deref(), MISSING_FIELDS)?;
    Ok(NewVolunteer {
        ministry_id,
        first_name,
        last_name,
        email,
        phone: non_blank(input.phone.as_deref()),
        position: non_blank(input.position.as_deref())
            .unwrap_or_else(|| DEFAULT_POSITION.to_string()),
        emergency_contact: non_blank(input.emergency_contact.as_deref()),
        emergency_phone: non_blank(input.emergency_phone.as_deref()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn input() -> VolunteerInput {
        VolunteerInput {
            ministry_id: Some(Uuid::nil()),
            first_name: Some("Dorcas".to_string()),
            last_name: Some("Tabitha".to_string()),
            email: Some("dorcas@example.com".to_string()),
            ..VolunteerInput::default()
        }
    }

    #[test]
    fn position_defaults_to_volunteer() {
        assert!(validate(&input()).is_ok_and(|v| v.position == "Volunteer"));
        assert!(validate(&VolunteerInput {
            position: Some("Usher".to_string()),
            ..input()
        })
        .is_ok_and(|v| v.position == "Usher"));
    }

    #[test]
    fn ministry_is_required() {
        assert_eq!(
            validate(&VolunteerInput {
                ministry_id: None,
                ..input()
            })
            .err(),
            Some(MISSING_FIELDS)
        );
    }

    #[test]
    fn bad_email_is_reported_as_such() {
        assert_eq!(
            validate(&VolunteerInput {
                email: Some("dorcas".to_string()),
                ..input()
            })
            .err(),
            Some("Invalid email address")
        );
    }
}
