//! System handlers: health, OpenAPI, events.

use crate::api::{AppState, auth::AuthUser};
use crate::types::Event;
use axum::{
    Extension, Json,
    extract::State,
    response::{
        IntoResponse,
        sse::{Event as SseEvent, KeepAlive, Sse},
    },
};
use serde_json::json;
use std::convert::Infallible;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

/// GET /health - Health check
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "system",
    responses(
        (status = 200, description = "Service is healthy")
    )
)]
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// GET /openapi.json - OpenAPI specification
#[utoipa::path(
    get,
    path = "/api/v1/openapi.json",
    tag = "system",
    responses(
        (status = 200, description = "OpenAPI 3.1 specification in JSON format")
    )
)]
pub async fn openapi_spec() -> impl IntoResponse {
    use crate::api::openapi::ApiDoc;
    use utoipa::OpenApi;

    Json(ApiDoc::openapi())
}

/// GET /events - Server-sent events for the caller's downloads
///
/// Events about other users' jobs are filtered out; `shutdown` is sent to
/// everyone.
#[utoipa::path(
    get,
    path = "/api/v1/events",
    tag = "system",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Server-sent events stream (text/event-stream)", content_type = "text/event-stream"),
        (status = 401, description = "Missing or invalid token", body = crate::error::ApiError)
    )
)]
pub async fn event_stream(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Sse<impl tokio_stream::Stream<Item = Result<SseEvent, Infallible>>> {
    let viewer = auth.user.id;
    let stream = BroadcastStream::new(state.tracker.subscribe());

    let sse_stream = stream.filter_map(move |result| match result {
        Ok(event) if event.is_visible_to(viewer) => to_sse(&event).map(Ok),
        Ok(_) => None,
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::warn!(user_id = viewer.0, skipped, "SSE client lagged");
            Some(Ok(SseEvent::default().event("error").data(format!(
                r#"{{"error":"lagged","skipped":{}}}"#,
                skipped
            ))))
        }
    });

    Sse::new(sse_stream).keep_alive(KeepAlive::default())
}

fn to_sse(event: &Event) -> Option<SseEvent> {
    match serde_json::to_string(event) {
        Ok(json_data) => Some(SseEvent::default().event(event.kind()).data(json_data)),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to serialize event to JSON");
            None
        }
    }
}
