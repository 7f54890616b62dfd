use super::{
    required_email,
    storage::{self, NewRegistration, RegistrationOutcome},
    types::{EventRegistrationInput, EventRegistrationResponse},
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
use time::OffsetDateTime;
use tracing::{info, instrument};

const MISSING_FIELDS: &str = "Missing required fields";

#[utoipa::path(
    post,
    path = "/functions/event-registration",
    request_body = EventRegistrationInput,
    responses(
        (status = 200, description = "Registered for the event", body = EventRegistrationResponse),
        (status = 400, description = "Missing fields, deadline passed, event full or already registered", body = ErrorResponse),
        (status = 404, description = "Event not found or inactive", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    ),
    tag = "forms"
)]
#[instrument(skip_all)]
pub async fn event_registration(
    pool: Extension<PgPool>,
    payload: Result<Json<EventRegistrationInput>, JsonRejection>,
) -> Response {
    let input = match payload {
        Ok(Json(input)) => input,
        Err(rejection) => return invalid_request(&rejection),
    };

    let registration = match validate(&input) {
        Ok(registration) => registration,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, message),
    };

    let outcome =
        storage::register_for_event(&pool, &registration, OffsetDateTime::now_utc()).await;
    match outcome {
        Ok(RegistrationOutcome::Registered(data, event)) => {
            info!(event_id = %event.id, registration_id = %data.id, "event registration created");
            (
                StatusCode::OK,
                Json(EventRegistrationResponse {
                    success: true,
                    data,
                    event,
                }),
            )
                .into_response()
        }
        Ok(RegistrationOutcome::EventNotFound) => {
            error_response(StatusCode::NOT_FOUND, "Event not found or inactive")
        }
        Ok(RegistrationOutcome::DeadlinePassed) => {
            error_response(StatusCode::BAD_REQUEST, "Registration deadline has passed")
        }
        Ok(RegistrationOutcome::Full) => {
            error_response(StatusCode::BAD_REQUEST, "Event is at full capacity")
        }
        Ok(RegistrationOutcome::AlreadyRegistered) => error_response(
            StatusCode::BAD_REQUEST,
            "You are already registered for this event",
        ),
        Err(err) => internal_error("Failed to register for event", &err),
    }
}

fn validate(input: &EventRegistrationInput) -> Result<NewRegistration, &'static str> {
    let event_id = input.event_id.ok_or(MISSING_FIELDS)?;
    let first_name = non_blank(input.first_name.as_deref()).ok_or(MISSING_FIELDS)?;
    let last_name = non_blank(input.last_name.as_deref()).ok_or(MISSING_FIELDS)?;
    let email = required_email(input.email.as_deref(), MISSING_FIELDS)?;
    Ok(NewRegistration {
        event_id,
        first_name,
        last_name,
        email,
        phone: non_blank(input.phone.as_deref()),
        special_needs: non_blank(input.special_needs.as_deref()),
        emergency_contact: non_blank(input.emergency_contact.as_deref()),
        emergency_phone: non_blank(input.emergency_phone.as_deref()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn input() -> EventRegistrationInput {
        EventRegistrationInput {
            event_id: Some(Uuid::nil()),
            first_name: Some("Priscilla".to_string()),
            last_name: Some("Aquila".to_string()),
            email: Some("Priscilla@Example.com".to_string()),
            ..EventRegistrationInput::default()
        }
    }

    #[test]
    fn all_required_fields_must_be_present() {
        assert!(validate(&input()).is_ok_and(|r| r.email == "priscilla@example.com"));

        for broken in [
            EventRegistrationInput {
                event_id: None,
                ..input()
            },
            EventRegistrationInput {
                first_name: Some(" ".to_string()),
                ..input()
            },
            EventRegistrationInput {
                last_name: None,
                ..input()
            },
            EventRegistrationInput {
                email: None,
                ..input()
            },
        ] {
            assert_eq!(validate(&broken).err(), Some(MISSING_FIELDS));
        }
    }

    #[test]
    fn optional_fields_blank_to_none() {
        let registration = validate(&EventRegistrationInput {
            phone: Some(String::new()),
            special_needs: Some("Wheelchair access".to_string()),
            ..input()
        });
        assert!(registration.is_ok_and(|r| r.phone.is_none()
            && r.special_needs.as_deref() == Some("Wheelchair access")));
    }
}
