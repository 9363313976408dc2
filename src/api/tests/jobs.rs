use super::*;
use crate::tracker::test_helpers::{GatedExecutor, locator, wait_for_status};
use crate::types::{JobId, Status, UserId};

async fn create(app: &Router, token: &str, url: &str) -> (StatusCode, Value) {
    send(app, "POST", "/downloads", Some(token), Some(json!({ "url": url }))).await
}

#[tokio::test]
async fn test_job_routes_require_token() {
    let (app, _tracker, _temp_dir) = create_test_app().await;

    for (method, path) in [
        ("GET", "/downloads"),
        ("POST", "/downloads"),
        ("GET", "/downloads/1"),
        ("GET", "/downloads/1/file"),
    ] {
        let (status, _) = send(&app, method, path, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, path);
    }
}

#[tokio::test]
async fn test_create_job_returns_pending_summary() {
    let (app, _tracker, _temp_dir) = create_test_app_with(GatedExecutor::new()).await;
    let (user_id, token) = sign_up(&app, "alice@example.com").await;

    let url = locator("my-cool-image", 123456);
    let (status, body) = create(&app, &token, &url).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["url"], url);
    assert_eq!(body["filename"], "my cool image");
    assert_eq!(body["user_id"], user_id);
    assert!(body["status"] == "pending" || body["status"] == "processing");
    assert_eq!(body["file_path"], Value::Null);
    assert_eq!(body["error_message"], Value::Null);
}

#[tokio::test]
async fn test_create_job_rejects_bad_urls() {
    let (app, _tracker, _temp_dir) = create_test_app().await;
    let (_, token) = sign_up(&app, "bob@example.com").await;

    for url in ["", "not a url", "https://example.com/photo_1.htm", "ftp://freepik.com/a_1.htm"] {
        let (status, body) = create(&app, &token, url).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "url {:?}", url);
        assert_eq!(body["error"]["details"]["field"], "url");
    }

    let (status, _) = send(&app, "POST", "/downloads", Some(&token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_duplicate_job_conflict() {
    let (app, _tracker, _temp_dir) = create_test_app_with(GatedExecutor::new()).await;
    let (_, token) = sign_up(&app, "carol@example.com").await;
    let url = locator("sunset", 1);

    let (status, _) = create(&app, &token, &url).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = create(&app, &token, &url).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "duplicate_job");
}

#[tokio::test]
async fn test_list_jobs_with_stats() {
    let (app, tracker, _temp_dir) = create_test_app().await;
    let (user_id, token) = sign_up(&app, "dave@example.com").await;

    let mut ids = Vec::new();
    for n in 1..=3 {
        let (_, body) = create(&app, &token, &locator("photo", n)).await;
        ids.push(JobId(body["id"].as_i64().unwrap()));
    }
    for id in &ids {
        wait_for_status(&tracker, UserId(user_id), *id, Status::Completed).await;
    }

    let (status, body) = send(&app, "GET", "/downloads", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let downloads = body["downloads"].as_array().unwrap();
    assert_eq!(downloads.len(), 3);
    // newest first
    assert_eq!(downloads[0]["id"], ids[2].0);
    assert_eq!(downloads[2]["id"], ids[0].0);
    assert_eq!(
        body["stats"],
        json!({"total": 3, "pending": 0, "processing": 0, "completed": 3, "failed": 0})
    );
}

#[tokio::test]
async fn test_jobs_are_owner_scoped() {
    let (app, _tracker, _temp_dir) = create_test_app_with(GatedExecutor::new()).await;
    let (_, alice) = sign_up(&app, "alice@example.com").await;
    let (_, mallory) = sign_up(&app, "mallory@example.com").await;

    let (_, body) = create(&app, &alice, &locator("private", 7)).await;
    let id = body["id"].as_i64().unwrap();

    let (status, body) = send(&app, "GET", &format!("/downloads/{}", id), Some(&mallory), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "job_not_found");

    let (status, _) = send(&app, "GET", &format!("/downloads/{}/file", id), Some(&mallory), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, "GET", "/downloads", Some(&mallory), None).await;
    assert_eq!(body["downloads"], json!([]));
    assert_eq!(body["stats"]["total"], 0);

    // the same URL is not a duplicate for another owner
    let (status, _) = create(&app, &mallory, &locator("private", 7)).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_get_job_and_file_after_completion() {
    let (app, tracker, _temp_dir) = create_test_app().await;
    let (user_id, token) = sign_up(&app, "erin@example.com").await;

    let (_, body) = create(&app, &token, &locator("mountain-lake", 42)).await;
    let id = body["id"].as_i64().unwrap();
    wait_for_status(&tracker, UserId(user_id), JobId(id), Status::Completed).await;

    let (status, body) = send(&app, "GET", &format!("/downloads/{}", id), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");
    assert_eq!(body["progress"], 100);
    assert!(body["completed_at"].is_string());

    let (status, body) = send(&app, "GET", &format!("/downloads/{}/file", id), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id);
    assert_eq!(body["file_name"], format!("{}_mountain lake.jpg", id));
}

#[tokio::test]
async fn test_file_not_available_before_completion() {
    let (app, _tracker, _temp_dir) = create_test_app_with(GatedExecutor::new()).await;
    let (_, token) = sign_up(&app, "frank@example.com").await;

    let (_, body) = create(&app, &token, &locator("waiting", 3)).await;
    let id = body["id"].as_i64().unwrap();

    let (status, body) = send(&app, "GET", &format!("/downloads/{}/file", id), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "job_not_completed");
}

#[tokio::test]
async fn test_unknown_and_malformed_ids() {
    let (app, _tracker, _temp_dir) = create_test_app().await;
    let (_, token) = sign_up(&app, "gina@example.com").await;

    let (status, _) = send(&app, "GET", "/downloads/9999", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "GET", "/downloads/abc", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_after_shutdown_is_unavailable() {
    let (app, tracker, _temp_dir) = create_test_app().await;
    let (_, token) = sign_up(&app, "hank@example.com").await;

    tracker.shutdown().await.unwrap();

    let (status, body) = create(&app, &token, &locator("late", 1)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "shutting_down");
}
