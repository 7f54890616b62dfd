use super::{
    require_admin,
    types::{
        LiveResponse, YoutubeAction, YoutubeConfig, YoutubeRequest, YoutubeSettingsResponse,
        YoutubeStatusResponse,
    },
};
use crate::{
    admin::AdminGuard,
    api::handlers::{error_response, internal_error, invalid_request, non_blank, ErrorResponse},
    feed::{ChangeFeed, Table},
    live::{LiveSettingsUpdate, LiveStream},
};
use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{info, instrument};

const NOT_CONFIGURED: &str = "YouTube channel not configured";

#[utoipa::path(
    post,
    path = "/functions/youtube-integration",
    request_body = YoutubeRequest,
    responses(
        (status = 200, description = "Settings saved, live flag changed, or current status (`status` needs no token)", body = YoutubeStatusResponse),
        (status = 400, description = "Malformed body or unknown action", body = ErrorResponse),
        (status = 401, description = "Missing or expired admin token", body = ErrorResponse),
        (status = 404, description = "No channel configured yet", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    ),
    tag = "admin"
)]
#[instrument(skip_all)]
pub async fn youtube_integration(
    guard: Extension<Arc<AdminGuard>>,
    live: Extension<LiveStream>,
    feed: Extension<ChangeFeed>,
    headers: HeaderMap,
    payload: Result<Json<YoutubeRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return invalid_request(&rejection),
    };

    if !matches!(request.action, YoutubeAction::Status) {
        if let Err(response) = require_admin(&guard, request.token.as_deref(), &headers).await {
            return response;
        }
    }

    match request.action {
        YoutubeAction::Configure { youtube_data } => {
            match live.configure(&settings_update(&youtube_data)).await {
                Ok(settings) => {
                    info!("youtube settings configured");
                    feed.publish(Table::YoutubeSettings);
                    (
                        StatusCode::OK,
                        Json(YoutubeSettingsResponse {
                            success: true,
                            settings: settings.public(),
                        }),
                    )
                        .into_response()
                }
                Err(err) => internal_error("Configuration failed", &err),
            }
        }
        YoutubeAction::GoLive { youtube_data } => {
            let data = youtube_data.unwrap_or_default();
            match live.set_live(true).await {
                Ok(Some(settings)) => {
                    info!(
                        title = data.title.as_deref().unwrap_or_default(),
                        description = data.description.as_deref().unwrap_or_default(),
                        "going live"
                    );
                    feed.publish(Table::YoutubeSettings);
                    (
                        StatusCode::OK,
                        Json(LiveResponse {
                            success: true,
                            message: "Live stream started".to_string(),
                            stream_url: settings.stream_url(),
                        }),
                    )
                        .into_response()
                }
                Ok(None) => error_response(StatusCode::NOT_FOUND, NOT_CONFIGURED),
                Err(err) => internal_error("Failed to go live", &err),
            }
        }
        YoutubeAction::StopLive => match live.set_live(false).await {
            Ok(Some(_)) => {
                info!("live stream stopped");
                feed.publish(Table::YoutubeSettings);
                (
                    StatusCode::OK,
                    Json(LiveResponse {
                        success: true,
                        message: "Live stream stopped".to_string(),
                        stream_url: None,
                    }),
                )
                    .into_response()
            }
            Ok(None) => error_response(StatusCode::NOT_FOUND, NOT_CONFIGURED),
            Err(err) => internal_error("Failed to stop live stream", &err),
        },
        YoutubeAction::Status => match live.current().await {
            Ok(settings) => (
                StatusCode::OK,
                Json(YoutubeStatusResponse {
                    settings: settings.map(|settings| settings.public()),
                }),
            )
                .into_response(),
            Err(err) => internal_error("Failed to load live stream status", &err),
        },
    }
}

fn settings_update(config: &YoutubeConfig) -> LiveSettingsUpdate {
    LiveSettingsUpdate {
        api_key: non_blank(config.api_key.as_deref()),
        channel_id: non_blank(config.channel_id.as_deref()),
        channel_name: non_blank(config.channel_name.as_deref()),
        live_stream_key: non_blank(config.live_stream_key.as_deref()),
    }
}
