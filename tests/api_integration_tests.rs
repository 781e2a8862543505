//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each endpoint.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use local_stash::{api::create_router, AppState, CacheEngine, Config, MemoryBackend, StorageBackend};
use serde_json::{json, Value};
use tower::ServiceExt;

// == Helper Functions ==

fn create_test_app() -> Router {
    let backend: Arc<dyn StorageBackend> = Arc::new(MemoryBackend::new());
    let engine = CacheEngine::new(&Config::default(), backend);
    create_router(AppState::new(engine))
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn put(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

// == SET Endpoint Tests ==

#[tokio::test]
async fn test_set_endpoint_returns_persisted_value() {
    let app = create_test_app();

    let response = app
        .oneshot(put(
            "/state/userLoginData",
            r#"{"value":{"userName":"ada","password":"pw"},"cache_timeout":false}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["key"], "userLoginData");
    assert_eq!(json["value"]["userName"], "ada");
    assert_eq!(json["expires"], false);
}

#[tokio::test]
async fn test_set_endpoint_merges_objects() {
    let app = create_test_app();

    app.clone()
        .oneshot(put("/state/num", r#"{"value":{"num1":0},"cache_timeout":false}"#))
        .await
        .unwrap();
    let response = app
        .oneshot(put("/state/num", r#"{"value":{"num2":1},"cache_timeout":false}"#))
        .await
        .unwrap();

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["value"], json!({"num1": 0, "num2": 1}));
}

#[tokio::test]
async fn test_set_endpoint_invalid_json() {
    let app = create_test_app();

    let response = app
        .oneshot(put("/state/k", r#"{"value":"#))
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

// == GET Endpoint Tests ==

#[tokio::test]
async fn test_get_endpoint_success() {
    let app = create_test_app();

    app.clone()
        .oneshot(put("/state/foo", r#"{"value":"bar!","cache_timeout":false}"#))
        .await
        .unwrap();

    let response = app.oneshot(get("/state/foo")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["key"], "foo");
    assert_eq!(json["value"], "bar!");
}

#[tokio::test]
async fn test_get_endpoint_not_found() {
    let app = create_test_app();

    let response = app.oneshot(get("/state/missing")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_to_json(response.into_body()).await;
    assert!(json["error"].as_str().unwrap().contains("missing"));
}

#[tokio::test]
async fn test_get_endpoint_after_expiry() {
    let app = create_test_app();

    app.clone()
        .oneshot(put(
            "/state/short",
            r#"{"value":[1,2],"cache_timeout":true,"cache_time":50}"#,
        ))
        .await
        .unwrap();

    let response = app.clone().oneshot(get("/state/short")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    tokio::time::sleep(Duration::from_millis(200)).await;

    let response = app.oneshot(get("/state/short")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// == DELETE Endpoint Tests ==

#[tokio::test]
async fn test_delete_endpoint() {
    let app = create_test_app();

    app.clone()
        .oneshot(put("/state/gone", r#"{"value":1,"cache_timeout":false}"#))
        .await
        .unwrap();

    let response = app.clone().oneshot(delete("/state/gone")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/state/gone")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reset_endpoint_clears_everything() {
    let app = create_test_app();

    for key in ["a", "b", "c"] {
        app.clone()
            .oneshot(put(
                &format!("/state/{}", key),
                r#"{"value":true,"cache_timeout":false}"#,
            ))
            .await
            .unwrap();
    }

    let response = app.clone().oneshot(delete("/state")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/stats")).await.unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["total_entries"], 0);
}

// == STATS / HEALTH Endpoint Tests ==

#[tokio::test]
async fn test_stats_endpoint_tracks_activity() {
    let app = create_test_app();

    app.clone()
        .oneshot(put("/state/k", r#"{"value":1,"cache_timeout":false}"#))
        .await
        .unwrap();
    app.clone().oneshot(get("/state/k")).await.unwrap();
    app.clone().oneshot(get("/state/missing")).await.unwrap();

    let response = app.oneshot(get("/stats")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["writes"], 1);
    assert_eq!(json["hits"], 1);
    assert_eq!(json["misses"], 1);
    assert_eq!(json["total_entries"], 1);
    assert_eq!(json["encrypt"], true);
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app();

    let response = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "healthy");
}
