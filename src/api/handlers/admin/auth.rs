use super::types::{AdminAuthRequest, LoginResponse, VerifyResponse};
use crate::{
    admin::{AdminAuthError, AdminGuard},
    api::handlers::{admin_token, error_response, invalid_request, ErrorResponse},
};
use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{error, instrument};

#[utoipa::path(
    post,
    path = "/functions/admin-auth",
    request_body = AdminAuthRequest,
    responses(
        (status = 200, description = "Login succeeded (`login`) or token checked (`verify`)", body = LoginResponse),
        (status = 400, description = "Malformed body or unknown action", body = ErrorResponse),
        (status = 401, description = "Invalid password", body = ErrorResponse),
        (status = 500, description = "Session store failure", body = ErrorResponse),
    ),
    tag = "admin"
)]
#[instrument(skip_all)]
pub async fn admin_auth(
    guard: Extension<Arc<AdminGuard>>,
    headers: HeaderMap,
    payload: Result<Json<AdminAuthRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return invalid_request(&rejection),
    };

    match request {
        AdminAuthRequest::Login { password } => match guard.login(&password).await {
            Ok(session) => {
                let message = session
                    .provisioned
                    .then(|| "Admin password has been set".to_string());
                (
                    StatusCode::OK,
                    Json(LoginResponse {
                        success: true,
                        token: session.token,
                        expires_at: session.expires_at,
                        message,
                    }),
                )
                    .into_response()
            }
            Err(AdminAuthError::InvalidCredentials | AdminAuthError::Unauthorized) => {
                error_response(StatusCode::UNAUTHORIZED, "Invalid password")
            }
            Err(AdminAuthError::Store(err)) => {
                error!("Admin login failed: {err:#}");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        },
        AdminAuthRequest::Verify { token } => {
            let token = admin_token(token.as_deref(), &headers);
            let valid = guard.verify(token.as_deref()).await.is_allowed();
            (StatusCode::OK, Json(VerifyResponse { valid })).into_response()
        }
    }
}
