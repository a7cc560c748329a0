//! JSON API driven the way a front end drives it: start, poll, fetch, inspect

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::*;
use image_harvest::api::create_router;
use image_harvest::{Config, ImageHarvester};
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::MockServer;

fn app() -> Router {
    let harvester = Arc::new(ImageHarvester::new(Config::default()).unwrap());
    let config = harvester.get_config();
    create_router(harvester, config)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, axum::body::Bytes) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body)
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let (status, body) = send(app, Request::get(uri).body(Body::empty()).unwrap()).await;
    (status, serde_json::from_slice(&body).unwrap())
}

async fn post_json(app: &Router, uri: &str, payload: Value) -> (StatusCode, Value) {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

async fn updates_until_complete(app: &Router) -> Vec<Value> {
    let mut events = Vec::new();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    while tokio::time::Instant::now() < deadline {
        let (status, batch) = get_json(app, "/api/updates").await;
        assert_eq!(status, StatusCode::OK);
        events.extend(batch.as_array().unwrap().iter().cloned());
        if events.iter().any(|e| e["type"] == "complete") {
            return events;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("run did not complete: {:?}", events);
}

#[tokio::test]
async fn front_end_flow_from_start_to_provenance() {
    let server = MockServer::start().await;
    serve(&server, "/set/alice_1.png", "image/png", novelai_png(12, 6)).await;
    serve(&server, "/set/bob_1.png", "image/png", plain_png(3, 3)).await;

    let app = app();

    let (status, started) = post_json(
        &app,
        "/api/start",
        json!({
            "base_url": format!("{}/set/", server.uri()),
            "template": "{name}_{num}.png",
            "names": "alice, bob",
            "start_num": 1,
            "end_num": 1,
            "parallel": 2
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(started["job_count"], 2);

    let events = updates_until_complete(&app).await;
    let images: Vec<&Value> = events.iter().filter(|e| e["type"] == "image").collect();
    assert_eq!(images.len(), 2);

    let alice = images
        .iter()
        .find(|e| e["tokens"]["name"] == "alice")
        .unwrap();
    assert_eq!(alice["resolution"], "12x6");
    assert_eq!(alice["is_recognized_source"], true);
    let id = alice["id"].as_str().unwrap();

    let (status, bytes) = send(
        &app,
        Request::get(format!("/image/{}", id))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&bytes[..], &novelai_png(12, 6)[..]);

    let (status, provenance) =
        get_json(&app, &format!("/api/images/{}/provenance", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(provenance["recognized"], true);
    assert_eq!(provenance["record"]["seed"], "3141592653");
    let first = &provenance["entries"][0];
    assert_eq!(first["label"], "Title");
    assert_eq!(first["value"], "NovelAI generated image");

    let bob = images.iter().find(|e| e["tokens"]["name"] == "bob").unwrap();
    let (status, provenance) = get_json(
        &app,
        &format!("/api/images/{}/provenance", bob["id"].as_str().unwrap()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(provenance["recognized"], false);
    assert!(provenance["record"].is_null());

    let (status, health) = get_json(&app, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["running"], false);
}

#[tokio::test]
async fn export_through_api_writes_cached_images() {
    let server = MockServer::start().await;
    serve(&server, "/1.png", "image/png", plain_png(5, 5)).await;
    serve(&server, "/2.png", "image/png", plain_png(6, 6)).await;

    let app = app();
    let (status, _) = post_json(
        &app,
        "/api/start",
        json!({
            "base_url": format!("{}/", server.uri()),
            "template": "{num}.png",
            "start_num": 1,
            "end_num": 2
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    updates_until_complete(&app).await;

    let dir = tempfile::tempdir().unwrap();
    let (status, saved) = post_json(
        &app,
        "/api/save",
        json!({ "path": dir.path().to_string_lossy() }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved["count"], 2);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
}
