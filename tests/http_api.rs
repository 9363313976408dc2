//! Live HTTP round trip against a running API server

mod common;

use common::{free_local_addr, test_config};
use download_tracker::JobTracker;
use serde_json::{Value, json};
use std::time::Duration;

#[tokio::test]
async fn test_http_job_flow() {
    let temp_dir = tempfile::tempdir().unwrap();
    let addr = free_local_addr();
    let mut config = test_config(temp_dir.path());
    config.server.api.bind_address = addr;
    config.server.api.rate_limit.enabled = true;
    config.server.api.rate_limit.max_requests = 10_000;

    let tracker = JobTracker::new(config).await.unwrap();
    let server = tracker.spawn_api_server();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let base = format!("http://{}/api/v1", addr);
    let client = reqwest::Client::new();

    let health: Value = client
        .get(format!("{}/health", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");

    let response = client
        .post(format!("{}/auth/register", base))
        .json(&json!({"name": "Web User", "email": "web@example.com", "password": "password123"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);

    let session: Value = client
        .post(format!("{}/auth/login", base))
        .json(&json!({"email": "web@example.com", "password": "password123"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let token = session["token"].as_str().unwrap().to_string();

    let response = client
        .post(format!("{}/downloads", base))
        .bearer_auth(&token)
        .json(&json!({"url": "https://www.freepik.com/free-photo/city-at-night_77.htm"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    let job: Value = response.json().await.unwrap();
    let id = job["id"].as_i64().unwrap();

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    let job = loop {
        let job: Value = client
            .get(format!("{}/downloads/{}", base, id))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        if job["status"] == "completed" {
            break job;
        }
        assert!(tokio::time::Instant::now() < deadline, "job did not complete");
        tokio::time::sleep(Duration::from_millis(20)).await;
    };
    assert_eq!(job["filename"], "city at night");

    let list: Value = client
        .get(format!("{}/downloads", base))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list["stats"]["total"], 1);
    assert_eq!(list["stats"]["completed"], 1);

    tracker.shutdown().await.unwrap();
    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}
