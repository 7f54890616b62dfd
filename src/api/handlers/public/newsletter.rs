use super::{
    required_email,
    storage::{self, NewSubscription, SubscriptionOutcome},
    types::{NewsletterInput, SubscriptionResponse},
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

const DEFAULT_SUBSCRIPTION_TYPE: &str = "weekly";

#[utoipa::path(
    post,
    path = "/functions/newsletter-subscription",
    request_body = NewsletterInput,
    responses(
        (status = 200, description = "Subscribed, or a lapsed subscription reactivated", body = SubscriptionResponse),
        (status = 400, description = "Missing or invalid email, or already subscribed", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    ),
    tag = "forms"
)]
#[instrument(skip_all)]
pub async fn newsletter_subscription(
    pool: Extension<PgPool>,
    payload: Result<Json<NewsletterInput>, JsonRejection>,
) -> Response {
    let input = match payload {
        Ok(Json(input)) => input,
        Err(rejection) => return invalid_request(&rejection),
    };

    let subscription = match validate(&input) {
        Ok(subscription) => subscription,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, message),
    };

    let (data, reactivated) = match storage::subscribe(&pool, &subscription).await {
        Ok(SubscriptionOutcome::Created(data)) => (data, false),
        Ok(SubscriptionOutcome::Reactivated(data)) => (data, true),
        Ok(SubscriptionOutcome::AlreadySubscribed) => {
            return error_response(StatusCode::BAD_REQUEST, "Email is already subscribed");
        }
        Err(err) => return internal_error("Failed to create subscription", &err),
    };

    info!(subscription_id = %data.id, reactivated, "newsletter subscription saved");
    (
        StatusCode::OK,
        Json(SubscriptionResponse {
            success: true,
            data,
            reactivated,
        }),
    )
        .into_response()
}

fn validate(input: &NewsletterInput) -> Result<NewSubscription, &'static str> {
    Ok(NewSubscription {
        email: required_email(input.email.as_deref(), "Email is required")?,
        first_name: non_blank(input.first_name.as_deref()),
        last_name: non_blank(input.last_name.as_deref()),
        subscription_type: non_blank(input.subscription_type.as_deref())
            .unwrap_or_else(|| DEFAULT_SUBSCRIPTION_TYPE.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_required_and_normalized() {
        assert_eq!(
            validate(&NewsletterInput::default()).err(),
            Some("Email is required")
        );

        let input = NewsletterInput {
            email: Some(" Lydia@Example.com ".to_string()),
            ..NewsletterInput::default()
        };
        let subscription = validate(&input);
        assert!(subscription
            .is_ok_and(|s| s.email == "lydia@example.com" && s.subscription_type == "weekly"));
    }

    #[test]
    fn explicit_subscription_type_is_kept() {
        let input = NewsletterInput {
            email: Some("lydia@example.com".to_string()),
            subscription_type: Some("monthly".to_string()),
            first_name: Some("Lydia".to_string()),
            ..NewsletterInput::default()
        };
        let subscription = validate(&input);
        assert!(subscription.is_ok_and(|s| s.subscription_type == "monthly"
            && s.first_name.as_deref() == Some("Lydia")
            && s.last_name.is_none()));
    }

    #[test]
    fn reactivated_flag_is_only_serialized_when_set() -> anyhow::Result<()> {
        use crate::api::handlers::public::types::Subscription;
        use time::OffsetDateTime;

        let data = Subscription {
            id: uuid::Uuid::nil(),
            email: "lydia@example.com".to_string(),
            first_name: None,
            last_name: None,
            subscription_type: "weekly".to_string(),
            is_active: true,
            created_at: OffsetDateTime::UNIX_EPOCH,
        };
        let fresh = serde_json::to_value(SubscriptionResponse {
            success: true,
            data: data.clone(),
            reactivated: false,
        })?;
        assert!(fresh.get("reactivated").is_none());

        let again = serde_json::to_value(SubscriptionResponse {
            success: true,
            data,
            reactivated: true,
        })?;
        assert_eq!(again["reactivated"], true);
        Ok(())
    }
}
