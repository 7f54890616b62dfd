use crate::{
    admin::{AdminConfig, AdminGuard, MemorySessionStore, PgSessionStore, SessionStore},
    api::handlers::{health, root},
    feed::ChangeFeed,
    live::LiveStream,
    media::{MediaStore, MEDIA_ROUTE},
};
use anyhow::{anyhow, Context, Result};
use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Extension, MatchedPath},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method, Request,
    },
    response::Json,
    routing::{get, options},
    Router,
};
use secrecy::SecretString;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{path::PathBuf, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::PropagateRequestIdLayer,
    services::ServeDir,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, warn, Span};
use ulid::Ulid;
use url::Url;
use utoipa_axum::router::OpenApiRouter;

pub(crate) mod handlers;
mod openapi;

pub use openapi::openapi;

/// Build the API router with all documented routes registered.
#[must_use]
pub fn router() -> OpenApiRouter {
    openapi::api_router()
}

/// Everything the server needs from the command line.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub dsn: String,
    pub frontend_base_url: String,
    pub public_base_url: String,
    pub media_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub admin: AdminConfig,
    pub admin_password: Option<SecretString>,
    pub memory_admin_store: bool,
}

/// Shared handles injected into every request as extensions.
#[derive(Clone)]
pub(crate) struct Services {
    pub pool: PgPool,
    pub guard: Arc<AdminGuard>,
    pub media: Arc<MediaStore>,
    pub feed: ChangeFeed,
    pub live: LiveStream,
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(config: ServerConfig) -> Result<()> {
    // Connect to database
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(&config.dsn)
        .await
        .context("Failed to connect to database")?;

    let store: Arc<dyn SessionStore> = if config.memory_admin_store {
        warn!("Admin sessions are kept in memory; they will not survive a restart");
        Arc::new(MemorySessionStore::new())
    } else {
        Arc::new(PgSessionStore::new(pool.clone()))
    };
    let guard = Arc::new(AdminGuard::new(config.admin.clone(), store));

    if let Some(password) = &config.admin_password {
        guard
            .seed(password)
            .await
            .context("Failed to provision admin password")?;
    } else if config.admin.first_login_provisioning() {
        warn!("No admin password configured; the first admin login will set it");
    }

    let services = Services {
        live: LiveStream::new(pool.clone()),
        pool,
        guard,
        media: Arc::new(MediaStore::new(
            config.media_dir.clone(),
            &config.public_base_url,
        )),
        feed: ChangeFeed::default(),
    };

    let frontend_origin = frontend_origin(&config.frontend_base_url)?;
    let app = app(&services, frontend_origin, config.max_upload_bytes);

    let listener = TcpListener::bind(format!("::0:{}", config.port)).await?;

    info!("Listening on [::]:{}", config.port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Full application router: documented routes plus `/`, `/openapi.json`,
/// preflight `OPTIONS /health` and the static media buckets.
pub(crate) fn app(services: &Services, frontend_origin: HeaderValue, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_origin(AllowOrigin::exact(frontend_origin));

    let (router, _openapi) = router().split_for_parts();
    router
        .route("/", get(root::root))
        .route("/health", options(health::health))
        .route("/openapi.json", get(|| async { Json(openapi()) }))
        .nest_service(MEDIA_ROUTE, ServeDir::new(services.media.root()))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(Extension(services.guard.clone()))
                .layer(Extension(services.media.clone()))
                .layer(Extension(services.feed.clone()))
                .layer(Extension(services.live.clone()))
                .layer(Extension(services.pool.clone())),
        )
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for ctrl-c: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!("Failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Gracefully shutdown");
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

fn frontend_origin(frontend_base_url: &str) -> Result<HeaderValue> {
    let parsed = Url::parse(frontend_base_url)
        .with_context(|| format!("Invalid frontend base URL: {frontend_base_url}"))?;
    let host = parsed.host_str().ok_or_else(|| {
        anyhow!("Frontend base URL must include a valid host: {frontend_base_url}")
    })?;
    let port = parsed
        .port()
        .map_or_else(String::new, |port| format!(":{port}"));
    let origin = format!("{}://{}{}", parsed.scheme(), host, port);
    HeaderValue::from_str(&origin).context("Failed to build frontend origin header")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::to_bytes,
        http::{header::ORIGIN, StatusCode},
    };
    use tower::ServiceExt;

    fn test_services(media_root: PathBuf) -> Result<Services> {
        let pool = PgPoolOptions::new().connect_lazy("postgres://sanctuary@localhost/sanctuary")?;
        Ok(Services {
            live: LiveStream::new(pool.clone()),
            pool,
            guard: Arc::new(AdminGuard::new(
                AdminConfig::new(),
                Arc::new(MemorySessionStore::new()),
            )),
            media: Arc::new(MediaStore::new(media_root, "http://localhost:8080")),
            feed: ChangeFeed::default(),
        })
    }

    #[test]
    fn frontend_origin_drops_path() -> Result<()> {
        let origin = frontend_origin("https://church.example:8443/admin/")?;
        assert_eq!(origin, "https://church.example:8443");
        assert!(frontend_origin("not a url").is_err());
        Ok(())
    }

    #[tokio::test]
    async fn root_openapi_and_request_id() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let services = test_services(dir.path().to_path_buf())?;
        let app = app(
            &services,
            HeaderValue::from_static("https://church.example"),
            1024,
        );

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/").body(Body::empty())?)
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));

        let response = app
            .oneshot(Request::builder().uri("/openapi.json").body(Body::empty())?)
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let doc: serde_json::Value = serde_json::from_slice(&bytes)?;
        assert_eq!(doc["info"]["title"], env!("CARGO_PKG_NAME"));
        Ok(())
    }

    #[tokio::test]
    async fn serves_media_files() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let services = test_services(dir.path().to_path_buf())?;
        let stored = services
            .media
            .put(crate::media::Bucket::Photos, "choir.png", b"png")
            .await?;
        let app = app(
            &services,
            HeaderValue::from_static("https://church.example"),
            1024,
        );

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/media/photos/{}", stored.key))
                    .body(Body::empty())?,
            )
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        assert_eq!(&bytes[..], b"png");
        Ok(())
    }

    #[tokio::test]
    async fn cors_names_the_frontend_origin() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let services = test_services(dir.path().to_path_buf())?;
        let app = app(
            &services,
            HeaderValue::from_static("https://church.example"),
            1024,
        );

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(ORIGIN, "https://church.example")
                    .body(Body::empty())?,
            )
            .await?;
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .and_then(|v| v.to_str().ok()),
            Some("https://church.example")
        );

        Ok(())
    }

    #[tokio::test]
    async fn oversized_bodies_are_rejected() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let services = test_services(dir.path().to_path_buf())?;
        let app = app(
            &services,
            HeaderValue::from_static("https://church.example"),
            16,
        );

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/functions/admin-auth")
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        r#"{"action":"login","password":"a very long password indeed"}"#,
                    ))?,
            )
            .await?;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        Ok(())
    }
}
