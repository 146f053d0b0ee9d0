use crate::api::handlers::{health, root};
use crate::auth::{
    AuthConfig, AuthService, MemorySessionRegistry, MemoryVerificationStore, RateLimiter,
    RedisSessionRegistry, RedisVerificationStore, SessionRegistry, SlidingWindowLimiter,
    TokenCodec, VerificationStore,
};
use anyhow::{anyhow, Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method, Request,
    },
    routing::{get, options},
    Extension,
};
use secrecy::SecretString;
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, warn, Span};
use ulid::Ulid;
use url::Url;
use utoipa_axum::router::OpenApiRouter;

pub(crate) mod handlers;
// OpenAPI router wiring and route registration live in openapi.rs.
mod openapi;

pub use openapi::openapi;

/// Build the API router with all documented routes registered.
#[must_use]
pub fn router() -> OpenApiRouter {
    openapi::api_router()
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(
    port: u16,
    dsn: String,
    redis_url: Option<String>,
    signing_secret: SecretString,
    config: AuthConfig,
) -> Result<()> {
    // Connect to database
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(&dsn)
        .await
        .context("Failed to connect to database")?;

    let codec = TokenCodec::new(
        &signing_secret,
        config.access_ttl_seconds(),
        config.refresh_ttl_seconds(),
    );
    let refresh_ttl =
        Duration::from_secs(u64::try_from(config.refresh_ttl_seconds()).unwrap_or(0));

    let (sessions, verifications): (Arc<dyn SessionRegistry>, Arc<dyn VerificationStore>) =
        if let Some(redis_url) = redis_url {
            let sessions =
                RedisSessionRegistry::connect(&redis_url, config.max_sessions(), refresh_ttl)
                    .await?;
            let verifications = RedisVerificationStore::connect(&redis_url).await?;
            (Arc::new(sessions), Arc::new(verifications))
        } else {
            // Process-local stores: sessions do not survive a restart and are
            // not shared between replicas.
            warn!("No redis url configured, using in-memory session stores");
            (
                Arc::new(MemorySessionRegistry::new(
                    config.max_sessions(),
                    refresh_ttl,
                )),
                Arc::new(MemoryVerificationStore::new()),
            )
        };

    let limiter: Arc<dyn RateLimiter> =
        Arc::new(SlidingWindowLimiter::new(config.throttle_policy()));
    let frontend_origin = frontend_origin(config.frontend_base_url())?;
    let service = Arc::new(AuthService::new(
        pool.clone(),
        codec,
        sessions,
        verifications,
        limiter,
        config,
    ));

    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(AllowOrigin::exact(frontend_origin))
        .allow_credentials(true);

    // Build the router from OpenAPI-wired routes, then extend it with non-doc routes like `/` and
    // preflight-only `OPTIONS /health`.
    let (router, _openapi) = router().split_for_parts();
    let app = router
        .route("/", get(root::root))
        .route("/health", options(health::health))
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
                .layer(Extension(service))
                .layer(Extension(pool)),
        );

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
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

    #[test]
    fn frontend_origin_strips_path() -> Result<()> {
        let origin = frontend_origin("https://pordisto.dev/app/")?;
        assert_eq!(origin, HeaderValue::from_static("https://pordisto.dev"));

        let origin = frontend_origin("http://localhost:5173")?;
        assert_eq!(origin, HeaderValue::from_static("http://localhost:5173"));
        Ok(())
    }

    #[test]
    fn frontend_origin_rejects_garbage() {
        assert!(frontend_origin("not a url").is_err());
    }
}
