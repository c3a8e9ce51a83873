//! Fault normalization across handler errors, panics and framework rejections

use anyhow::anyhow;
use axum::{
    Json, Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
    routing::{get, post},
};
use serde_json::Value;
use showcase_server::app::{BODY_LIMIT, with_pipeline};
use showcase_server::config::{Environment, Mode};
use showcase_server::error::{AppError, GENERIC_MESSAGE};
use tower::ServiceExt;

async fn bad_request() -> Result<&'static str, AppError> {
    Err(AppError::new("name is required", StatusCode::BAD_REQUEST))
}

async fn internal() -> Result<&'static str, AppError> {
    Err(anyhow!("connection reset by peer").into())
}

async fn hidden_not_found() -> Result<&'static str, AppError> {
    Err(AppError::not_found("not for your eyes").with_operational(false))
}

async fn panics() -> &'static str {
    panic!("handler exploded")
}

async fn echo(Json(value): Json<Value>) -> Json<Value> {
    Json(value)
}

fn test_app(mode: Mode) -> Router {
    let router = Router::new()
        .route("/bad-request", get(bad_request))
        .route("/internal", get(internal))
        .route("/hidden", get(hidden_not_found))
        .route("/panic", get(panics))
        .route("/echo", post(echo));

    let env = Environment {
        mode,
        session_secret: Some("secret".to_owned()),
        ..Environment::development()
    };
    with_pipeline(router, &env)
}

async fn call(mode: Mode, request: Request<Body>) -> (StatusCode, Value) {
    let response = test_app(mode).oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

async fn get_path(mode: Mode, uri: &str) -> (StatusCode, Value) {
    call(mode, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

#[tokio::test]
async fn test_operational_error_message_reaches_client_in_production() {
    let (status, json) = get_path(Mode::Production, "/bad-request").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json, serde_json::json!({"status": "error", "message": "name is required"}));
}

#[tokio::test]
async fn test_internal_error_is_generic_in_production() {
    let (status, json) = get_path(Mode::Production, "/internal").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["message"], GENERIC_MESSAGE);
}

#[tokio::test]
async fn test_internal_error_is_detailed_in_development() {
    let (status, json) = get_path(Mode::Development, "/internal").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["message"], "connection reset by peer");
    assert_eq!(json["error"]["isOperational"], false);
    assert!(json["stack"].as_str().unwrap().contains("connection reset by peer"));
}

#[tokio::test]
async fn test_non_operational_override_hides_4xx_in_production() {
    let (status, json) = get_path(Mode::Production, "/hidden").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["message"], GENERIC_MESSAGE);
}

#[tokio::test]
async fn test_panic_becomes_non_operational_fault() {
    let (status, json) = get_path(Mode::Production, "/panic").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["message"], GENERIC_MESSAGE);

    let (status, json) = get_path(Mode::Development, "/panic").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["message"].as_str().unwrap().contains("handler exploded"));
}

#[tokio::test]
async fn test_malformed_json_rejection_is_normalized() {
    let (status, json) = call(
        Mode::Production,
        Request::builder()
            .method(Method::POST)
            .uri("/echo")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], "error");
    assert!(!json["message"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let big = format!("{{\"data\":\"{}\"}}", "x".repeat(BODY_LIMIT));
    let (status, json) = call(
        Mode::Production,
        Request::builder()
            .method(Method::POST)
            .uri("/echo")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(big))
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(json["status"], "error");
}

#[tokio::test]
async fn test_small_body_passes_through() {
    let (status, json) = call(
        Mode::Production,
        Request::builder()
            .method(Method::POST)
            .uri("/echo")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"hello":"world"}"#))
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["hello"], "world");
}
