use super::*;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::time::Duration;
use tower::ServiceExt;


/// Helper to create a test ImageHarvester wrapped in Arc, with its config
fn create_test_harvester() -> (Arc<ImageHarvester>, Arc<Config>) {
    let harvester = crate::harvester::test_helpers::create_test_harvester();
    let config = harvester.get_config();
    (Arc::new(harvester), config)
}

/// Router over a fresh harvester; the harvester is returned for direct inspection
fn test_app() -> (Router, Arc<ImageHarvester>) {
    let (harvester, config) = create_test_harvester();
    (create_router(harvester.clone(), config), harvester)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// Poll `/api/updates` until `Complete`, returning every event
async fn poll_until_complete(app: &Router) -> Vec<serde_json::Value> {
    let mut events = Vec::new();
    for _ in 0..1000 {
        let response = app.clone().oneshot(get("/api/updates")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let batch = body_json(response).await;
        events.extend(batch.as_array().unwrap().iter().cloned());
        if events.iter().any(|e| e["type"] == "complete") {
            return events;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("run did not complete: {:?}", events);
}

#[tokio::test]
async fn test_api_server_spawns() {
    let (harvester, config) = create_test_harvester();

    // Port 0 = OS assigns a free port
    let mut config = (*config).clone();
    config.server.api.bind_address = "127.0.0.1:0".parse().unwrap();
    let config = Arc::new(config);

    let api_handle = tokio::spawn({
        let harvester = harvester.clone();
        let config = config.clone();
        async move { start_api_server(harvester, config).await }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!api_handle.is_finished());
    api_handle.abort();
}

#[tokio::test]
async fn test_cors_enabled() {
    let (harvester, config) = create_test_harvester();
    let mut config = (*config).clone();
    config.server.api.cors_enabled = true;
    config.server.api.cors_origins = vec!["*".to_string()];
    let app = create_router(harvester, Arc::new(config));

    let request = Request::builder()
        .uri("/api/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}

#[tokio::test]
async fn test_cors_specific_origin() {
    let (harvester, config) = create_test_harvester();
    let mut config = (*config).clone();
    config.server.api.cors_origins = vec!["http://gallery.local".to_string()];
    let app = create_router(harvester, Arc::new(config));

    let request = Request::builder()
        .uri("/api/health")
        .header("Origin", "http://gallery.local")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "http://gallery.local"
    );
}

#[tokio::test]
async fn test_cors_disabled() {
    let (harvester, config) = create_test_harvester();
    let mut config = (*config).clone();
    config.server.api.cors_enabled = false;
    let app = create_router(harvester, Arc::new(config));

    let request = Request::builder()
        .uri("/api/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert!(
        !response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let (app, _harvester) = test_app();
    let response = app.oneshot(get("/api/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "not_found");
    assert_eq!(body["error"]["message"], "route /api/nope not found");
}
