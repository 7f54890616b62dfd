use super::{auth, decode_upload, photos, videos, youtube};
use crate::{
    admin::{AdminConfig, AdminGuard, MemorySessionStore},
    feed::ChangeFeed,
    live::LiveStream,
    media::MediaStore,
};
use anyhow::Result;
use axum::{
    body::{to_bytes, Body},
    extract::Extension,
    http::{header::AUTHORIZATION, Request, StatusCode},
    routing::post,
    Router,
};
use secrecy::SecretString;
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower::ServiceExt;

struct TestApp {
    router: Router,
    guard: Arc<AdminGuard>,
    feed: ChangeFeed,
    _media_dir: tempfile::TempDir,
}

fn test_app() -> Result<TestApp> {
    let guard = Arc::new(AdminGuard::new(
        AdminConfig::new(),
        Arc::new(MemorySessionStore::new()),
    ));
    // Never connects: every request below is answered before touching the database.
    let pool = PgPoolOptions::new().connect_lazy("postgres://sanctuary@localhost/sanctuary")?;
    let media_dir = tempfile::tempdir()?;
    let media = Arc::new(MediaStore::new(
        media_dir.path().to_path_buf(),
        "http://localhost:8080",
    ));
    let feed = ChangeFeed::default();

    let router = Router::new()
        .route("/functions/admin-auth", post(auth::admin_auth))
        .route("/functions/video-upload", post(videos::video_upload))
        .route("/functions/photo-upload", post(photos::photo_upload))
        .route(
            "/functions/youtube-integration",
            post(youtube::youtube_integration),
        )
        .layer(Extension(guard.clone()))
        .layer(Extension(pool.clone()))
        .layer(Extension(media))
        .layer(Extension(feed.clone()))
        .layer(Extension(LiveStream::new(pool)));

    Ok(TestApp {
        router,
        guard,
        feed,
        _media_dir: media_dir,
    })
}

async fn post_json(router: &Router, uri: &str, body: Value) -> Result<(StatusCode, Value)> {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))?,
        )
        .await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    Ok((status, serde_json::from_slice(&bytes)?))
}

async fn login(app: &TestApp, password: &str) -> Result<String> {
    let (status, body) = post_json(
        &app.router,
        "/functions/admin-auth",
        json!({ "action": "login", "password": password }),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    Ok(body["token"].as_str().unwrap_or_default().to_string())
}

#[tokio::test]
async fn first_login_sets_password_and_returns_token() -> Result<()> {
    let app = test_app()?;
    let (status, body) = post_json(
        &app.router,
        "/functions/admin-auth",
        json!({ "action": "login", "password": "hunter2" }),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert!(body["expires_at"].is_string());
    assert!(body["message"].is_string());

    let token = body["token"].clone();
    let (status, body) = post_json(
        &app.router,
        "/functions/admin-auth",
        json!({ "action": "verify", "token": token }),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "valid": true }));
    Ok(())
}

#[tokio::test]
async fn wrong_password_is_rejected() -> Result<()> {
    let app = test_app()?;
    app.guard
        .seed(&SecretString::from("correct horse".to_string()))
        .await?;

    let (status, body) = post_json(
        &app.router,
        "/functions/admin-auth",
        json!({ "action": "login", "password": "battery staple" }),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "Invalid password" }));

    let token = login(&app, "correct horse").await?;
    assert!(!token.is_empty());
    Ok(())
}

#[tokio::test]
async fn verify_answers_false_for_unknown_or_missing_token() -> Result<()> {
    let app = test_app()?;
    login(&app, "hunter2").await?;

    for body in [
        json!({ "action": "verify", "token": "nope" }),
        json!({ "action": "verify", "token": "" }),
        json!({ "action": "verify" }),
    ] {
        let (status, body) = post_json(&app.router, "/functions/admin-auth", body).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "valid": false }));
    }
    Ok(())
}

#[tokio::test]
async fn second_login_invalidates_first_token() -> Result<()> {
    let app = test_app()?;
    let first = login(&app, "hunter2").await?;
    let second = login(&app, "hunter2").await?;
    assert_ne!(first, second);

    let (_, body) = post_json(
        &app.router,
        "/functions/admin-auth",
        json!({ "action": "verify", "token": first }),
    )
    .await?;
    assert_eq!(body["valid"], false);
    Ok(())
}

#[tokio::test]
async fn malformed_bodies_are_bad_requests() -> Result<()> {
    let app = test_app()?;
    for (uri, body) in [
        ("/functions/admin-auth", json!({ "action": "logout" })),
        ("/functions/admin-auth", json!({ "password": "x" })),
        ("/functions/video-upload", json!({ "token": "t" })),
        ("/functions/photo-upload", json!({ "action": "rotate", "token": "t" })),
        ("/functions/youtube-integration", json!({ "action": "rewind" })),
    ] {
        let (status, body) = post_json(&app.router, uri, body).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body, json!({ "error": "Invalid request" }));
    }
    Ok(())
}

#[tokio::test]
async fn privileged_actions_require_a_valid_token() -> Result<()> {
    let app = test_app()?;
    login(&app, "hunter2").await?;
    let mut changes = app.feed.subscribe();

    for (uri, body) in [
        ("/functions/video-upload", json!({ "action": "list" })),
        (
            "/functions/video-upload",
            json!({ "action": "delete", "token": "stale", "videoData": { "videoId": uuid::Uuid::nil() } }),
        ),
        (
            "/functions/photo-upload",
            json!({ "action": "delete", "sessionToken": "stale", "photoId": uuid::Uuid::nil() }),
        ),
        (
            "/functions/youtube-integration",
            json!({ "action": "go-live", "token": "" }),
        ),
        ("/functions/youtube-integration", json!({ "action": "stop-live" })),
        (
            "/functions/youtube-integration",
            json!({ "action": "configure", "youtubeData": { "channelId": "UC1" } }),
        ),
    ] {
        let (status, body) = post_json(&app.router, uri, body).await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body, json!({ "error": "Unauthorized" }));
    }

    // Nothing was mutated, so nothing was announced.
    assert!(changes.try_recv().is_err());
    Ok(())
}

#[tokio::test]
async fn bearer_header_authorizes_when_body_has_no_token() -> Result<()> {
    let app = test_app()?;
    let token = login(&app, "hunter2").await?;

    // Valid session but invalid video data: rejected by validation, not by the guard.
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/functions/video-upload")
                .header("content-type", "application/json")
                .header(AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::from(
                    json!({ "action": "upload", "videoData": { "title": "Sunday" } }).to_string(),
                ))?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let body: Value = serde_json::from_slice(&bytes)?;
    assert_eq!(body, json!({ "error": "Video file URL is required" }));
    Ok(())
}

#[tokio::test]
async fn photo_upload_validates_before_storing() -> Result<()> {
    let app = test_app()?;
    let token = login(&app, "hunter2").await?;

    let (status, body) = post_json(
        &app.router,
        "/functions/photo-upload",
        json!({
            "action": "upload",
            "token": token,
            "title": "Choir",
            "file": "not base64!",
            "fileName": "choir.png"
        }),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "File must be base64 encoded" }));
    Ok(())
}

#[test]
fn decode_upload_accepts_plain_and_data_urls() {
    assert_eq!(decode_upload("aGVsbG8="), Some(b"hello".to_vec()));
    assert_eq!(
        decode_upload("data:image/png;base64,aGVsbG8="),
        Some(b"hello".to_vec())
    );
    assert_eq!(decode_upload(""), None);
    assert_eq!(decode_upload("%%%"), None);
}
