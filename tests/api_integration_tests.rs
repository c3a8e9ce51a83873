//! API Integration Tests
//!
//! Drives the full development-mode pipeline with `oneshot` requests: routing, the not-found
//! stage, error normalization and the cross-origin policy.

use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use chrono::DateTime;
use serde_json::Value;
use showcase_server::app::app;
use showcase_server::config::Environment;
use tower::ServiceExt;

async fn get(uri: &str) -> (StatusCode, Value) {
    send(Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

async fn send(request: Request<Body>) -> (StatusCode, Value) {
    let response = app(&Environment::development())
        .oneshot(request)
        .await
        .unwrap();
    let status = response.status();

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();

    (status, json)
}

#[tokio::test]
async fn test_health_reports_up() {
    let (status, json) = get("/api/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "UP");
    let timestamp = json["timestamp"].as_str().unwrap();
    assert!(DateTime::parse_from_rfc3339(timestamp).is_ok());
}

#[tokio::test]
async fn test_v1_welcome_with_and_without_trailing_slash() {
    for uri in ["/api/v1", "/api/v1/"] {
        let (status, json) = get(uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(json["message"], "Welcome to API v1");
    }
}

#[tokio::test]
async fn test_random_number_stays_in_range() {
    let app = app(&Environment::development());

    for _ in 0..200 {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/random-number")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        let n = json["randomNumber"].as_u64().unwrap();
        assert!((1..=100).contains(&n), "out of range: {n}");
    }
}

#[tokio::test]
async fn test_unknown_api_route_is_operational_404() {
    let (status, json) = get("/api/v2/nothing").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["status"], "error");
    assert_eq!(json["message"], "API route not found: /api/v2/nothing");
    assert_eq!(json["error"]["isOperational"], true);
    assert!(json["stack"].is_string());
}

#[tokio::test]
async fn test_unknown_page_in_development_is_404() {
    let (status, json) = get("/dashboard").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], "Resource not found: /dashboard");
}

#[tokio::test]
async fn test_wrong_method_is_normalized() {
    let (status, json) = send(
        Request::builder()
            .method(Method::POST)
            .uri("/api/health")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(json["status"], "error");
    assert_eq!(json["message"], "Method Not Allowed");
    assert_eq!(json["error"]["statusCode"], 405);
}

#[tokio::test]
async fn test_cors_allows_dev_client_with_credentials() {
    let response = app(&Environment::development())
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/health")
                .header(header::ORIGIN, "http://localhost:5173")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let headers = response.headers();
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:5173"
    );
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
}

#[tokio::test]
async fn test_cors_ignores_unlisted_origin() {
    let response = app(&Environment::development())
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .header(header::ORIGIN, "https://evil.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none()
    );
}
