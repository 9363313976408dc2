use super::*;
use crate::tracker::executor::JobExecutor;
use crate::tracker::test_helpers::{create_test_tracker, create_tracker_with};
use axum::body::Body;
use axum::http::Request;
use axum::http::StatusCode;
use serde_json::{Value, json};
use std::time::Duration;
use tower::ServiceExt;

mod jobs;

/// Router over a fresh tracker, rate limiting off so requests need no ConnectInfo
async fn create_test_app() -> (Router, Arc<JobTracker>, tempfile::TempDir) {
    let (tracker, temp_dir) = create_test_tracker().await;
    let tracker = Arc::new(tracker);
    (app_for(&tracker, |_| {}), tracker, temp_dir)
}

/// Same as [`create_test_app`] with a custom executor
async fn create_test_app_with(
    executor: Arc<dyn JobExecutor>,
) -> (Router, Arc<JobTracker>, tempfile::TempDir) {
    let (tracker, temp_dir) = create_tracker_with(executor).await;
    let tracker = Arc::new(tracker);
    (app_for(&tracker, |_| {}), tracker, temp_dir)
}

fn app_for(tracker: &Arc<JobTracker>, customize: impl FnOnce(&mut Config)) -> Router {
    let mut config = (*tracker.get_config()).clone();
    config.server.api.rate_limit.enabled = false;
    customize(&mut config);
    create_router(tracker.clone(), Arc::new(config))
}

/// Send a request under the API prefix and decode the JSON body (Null if empty)
async fn send(
    app: &Router,
    method: &str,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(format!("{}{}", API_PREFIX, path));
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

/// Register and log in through the API, returning (user_id, token)
async fn sign_up(app: &Router, email: &str) -> (i64, String) {
    let (status, body) = send(
        app,
        "POST",
        "/auth/register",
        None,
        Some(json!({"name": "Test User", "email": email, "password": "password123"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
    let user_id = body["user_id"].as_i64().unwrap();

    let (status, body) = send(
        app,
        "POST",
        "/auth/login",
        None,
        Some(json!({"email": email, "password": "password123"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    (user_id, body["token"].as_str().unwrap().to_string())
}

#[tokio::test]
async fn test_api_server_stops_on_tracker_shutdown() {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut config = crate::tracker::test_helpers::test_config(temp_dir.path());
    config.server.api.bind_address = "127.0.0.1:0".parse().unwrap(); // OS assigns a free port
    let tracker = JobTracker::new(config).await.unwrap();

    let api_handle = tracker.spawn_api_server();
    tokio::time::sleep(Duration::from_millis(100)).await;

    tracker.shutdown().await.unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), api_handle)
        .await
        .expect("server should stop after shutdown")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_cors_enabled() {
    let (tracker, _temp_dir) = create_test_tracker().await;
    let tracker = Arc::new(tracker);
    let app = app_for(&tracker, |config| {
        config.server.api.cors_enabled = true;
        config.server.api.cors_origins = vec!["http://localhost:5173".to_string()];
    });

    let request = Request::builder()
        .uri("/api/v1/health")
        .header("Origin", "http://localhost:5173")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "http://localhost:5173"
    );
}

#[tokio::test]
async fn test_cors_disabled() {
    let (tracker, _temp_dir) = create_test_tracker().await;
    let tracker = Arc::new(tracker);
    let app = app_for(&tracker, |config| config.server.api.cors_enabled = false);

    let request = Request::builder()
        .uri("/api/v1/health")
        .header("Origin", "http://localhost:5173")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        !response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}

#[tokio::test]
async fn test_routes_require_prefix() {
    let (app, _tracker, _temp_dir) = create_test_app().await;

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_route_is_404_not_401() {
    let (app, _tracker, _temp_dir) = create_test_app().await;

    let (status, _) = send(&app, "GET", "/does-not-exist", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_swagger_ui_toggle() {
    let (tracker, _temp_dir) = create_test_tracker().await;
    let tracker = Arc::new(tracker);

    let enabled = app_for(&tracker, |config| config.server.api.swagger_ui = true);
    let request = Request::builder()
        .uri("/swagger-ui/")
        .body(Body::empty())
        .unwrap();
    let response = enabled.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let disabled = app_for(&tracker, |config| config.server.api.swagger_ui = false);
    let request = Request::builder()
        .uri("/swagger-ui/")
        .body(Body::empty())
        .unwrap();
    let response = disabled.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_rate_limit_applies_per_ip() {
    use axum::extract::connect_info::MockConnectInfo;
    use std::net::SocketAddr;

    let (tracker, _temp_dir) = create_test_tracker().await;
    let tracker = Arc::new(tracker);
    let mut config = (*tracker.get_config()).clone();
    config.server.api.rate_limit.enabled = true;
    config.server.api.rate_limit.max_requests = 2;
    config.server.api.rate_limit.window = Duration::from_secs(60);
    let app = create_router(tracker, Arc::new(config))
        .layer(MockConnectInfo(SocketAddr::from(([192, 168, 1, 20], 5000))));

    let body = json!({"email": "nobody@example.com", "password": "password123"});
    for _ in 0..2 {
        let (status, _) = send(&app, "POST", "/auth/login", None, Some(body.clone())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
    let (status, body_json) = send(&app, "POST", "/auth/login", None, Some(body)).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body_json["error"]["code"], "rate_limited");

    // health is exempt
    let (status, _) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
}
