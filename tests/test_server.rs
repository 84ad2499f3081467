//! Integration test: demo server endpoints

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chest_xray_diagnosis::server::create_router;
use serde_json::Value;
use tower::ServiceExt;

async fn get_json(uri: &str) -> (StatusCode, Value) {
    let response = create_router()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 64).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_root_greeting() {
    let (status, body) = get_json("/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Hello World");
}

#[tokio::test]
async fn test_welcome_echoes_name() {
    let (status, body) = get_json("/Welcome?name=Ada").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({ "name": "Ada" }));
}

#[tokio::test]
async fn test_welcome_decodes_query() {
    let (_, body) = get_json("/Welcome?name=Dr%20Who").await;
    assert_eq!(body["name"], "Dr Who");
}

#[tokio::test]
async fn test_welcome_without_name() {
    let (status, body) = get_json("/Welcome").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], true);
}

#[tokio::test]
async fn test_health_endpoint() {
    let (status, body) = get_json("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_unknown_route() {
    let (status, body) = get_json("/api/predict").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], true);
}
