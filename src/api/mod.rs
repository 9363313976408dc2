//! REST API server module
//!
//! Provides an OpenAPI 3.1 compliant REST API for accounts, download jobs
//! and live job events. Every route lives under `/api/v1`.

use crate::{Config, JobTracker, Result};
use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod auth;
pub mod error_response;
pub mod openapi;
pub mod rate_limit;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Prefix every API route is nested under
pub const API_PREFIX: &str = "/api/v1";

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Accounts
/// - `POST /auth/register` - Create an account
/// - `POST /auth/login` - Issue a bearer token
/// - `GET /auth/verify` - Current user (token required)
/// - `POST /auth/logout` - Revoke the token (token required)
///
/// ## Downloads (token required)
/// - `GET /downloads` - List the caller's downloads with counts
/// - `POST /downloads` - Submit an image URL
/// - `GET /downloads/:id` - Get one download
/// - `GET /downloads/:id/file` - Result of a completed download
///
/// ## System
/// - `GET /health` - Health check
/// - `GET /openapi.json` - OpenAPI specification
/// - `GET /events` - Server-sent events for the caller's downloads (token required)
/// - `GET /swagger-ui` - Interactive Swagger UI documentation (if enabled, not prefixed)
pub fn create_router(tracker: Arc<JobTracker>, config: Arc<Config>) -> Router {
    let state = AppState::new(tracker, config.clone());

    let public = Router::new()
        .route("/auth/register", post(routes::register))
        .route("/auth/login", post(routes::login))
        .route("/health", get(routes::health_check))
        .route("/openapi.json", get(routes::openapi_spec));

    // route_layer only wraps matched routes, so unknown paths still 404
    let protected = Router::new()
        .route("/auth/verify", get(routes::verify))
        .route("/auth/logout", post(routes::logout))
        .route("/downloads", get(routes::list_jobs).post(routes::create_job))
        .route("/downloads/:id", get(routes::get_job))
        .route("/downloads/:id/file", get(routes::get_job_file))
        .route("/events", get(routes::event_stream))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_session,
        ));

    let api = public.merge(protected).with_state(state);

    // Rate limiting sees router-relative paths, so exempt paths omit the prefix
    let api = if config.server.api.rate_limit.enabled {
        let limiter = Arc::new(rate_limit::RateLimiter::new(
            config.server.api.rate_limit.clone(),
        ));
        api.layer(middleware::from_fn_with_state(
            limiter,
            rate_limit::rate_limit_middleware,
        ))
    } else {
        api
    };

    let router = Router::new().nest(API_PREFIX, api);

    // Swagger UI serves its own copy of the document to avoid clashing with /openapi.json
    let router = if config.server.api.swagger_ui {
        router.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
    } else {
        router
    };

    let router = router.layer(TraceLayer::new_for_http());

    if config.server.api.cors_enabled {
        let cors = build_cors_layer(&config.server.api.cors_origins);
        router.layer(cors)
    } else {
        router
    }
}

/// Build a CORS layer based on configured origins
///
/// `"*"` or an empty list allows any origin.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the API server on the configured bind address.
///
/// Runs until `shutdown` resolves, then stops accepting connections and
/// lets in-flight requests finish. The tracker itself is not shut down.
///
/// # Example
///
/// ```no_run
/// use download_tracker::{Config, JobTracker};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Arc::new(Config::default());
/// let tracker = Arc::new(JobTracker::new((*config).clone()).await?);
///
/// download_tracker::api::start_api_server(tracker, config, std::future::pending()).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server(
    tracker: Arc<JobTracker>,
    config: Arc<Config>,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let bind_address = config.server.api.bind_address;

    tracing::info!(address = %bind_address, "Starting API server");

    let app = create_router(tracker, config);

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(address = %bind_address, "API server listening");

    // ConnectInfo<SocketAddr> is required by the rate limiting middleware
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
    .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
