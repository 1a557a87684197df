//! Router-level tests for the LabRat HTTP surface, backed by the mock vision backend.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use base64::Engine;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use labrat_api::{router, AppState, Assistant};
use labrat_inference::{BackendKind, MockInferenceBackend};

const LIMIT: usize = 1024 * 1024;

fn app(mock: &MockInferenceBackend) -> Router {
    let assistant = Assistant::new(BackendKind::Bedrock, Arc::new(mock.clone()));
    router(AppState::new(assistant), LIMIT)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn png_data_url() -> String {
    let img = image::RgbaImage::from_fn(320, 240, |x, y| {
        image::Rgba([((x * 13) ^ (y * 7)) as u8, (x + 2 * y) as u8, (x * y % 199) as u8, 255])
    });
    let mut cursor = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut cursor, image::ImageFormat::Png)
        .unwrap();
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(cursor.into_inner())
    )
}

#[tokio::test]
async fn test_health_reports_service_and_backends() {
    let mock = MockInferenceBackend::new();
    let request = Request::get("/api/health").body(Body::empty()).unwrap();
    let (status, body) = send(app(&mock), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "LabRat API");
    assert_eq!(body["backends"][0]["healthy"], true);
    assert_eq!(body["backends"][0]["default"], true);
}

#[tokio::test]
async fn test_health_stays_healthy_when_backend_is_down() {
    let mock = MockInferenceBackend::new().with_health(false);
    let request = Request::get("/api/health").body(Body::empty()).unwrap();
    let (status, body) = send(app(&mock), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["backends"][0]["healthy"], false);
}

#[tokio::test]
async fn test_general_chat() {
    let mock = MockInferenceBackend::new().with_fixed_response("Use a pendulum.");
    let (status, body) = send(
        app(&mock),
        post_json("/api/labrat", json!({"input": "How do I measure g?"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["text"], "Use a pendulum.");
    assert_eq!(body["model"], "mock-vision");
    assert_eq!(mock.call_count(), 1);
    assert!(mock.get_calls()[0].prompt.contains("How do I measure g?"));
}

#[tokio::test]
async fn test_unknown_type_falls_back_to_chat() {
    let mock = MockInferenceBackend::new();
    let (status, body) = send(
        app(&mock),
        post_json("/api/labrat", json!({"type": "poetry", "input": "hi"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test]
async fn test_whiteboard_conversion_returns_cells() {
    let reply = "Here you go.\n```python\n# Fit the line\nimport numpy as np\n```";
    let mock = MockInferenceBackend::new().with_fixed_response(reply);
    let (status, body) = send(
        app(&mock),
        post_json(
            "/api/labrat",
            json!({"type": "whiteboard_conversion", "input": "y = mx + b"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["text"], reply);
}

#[tokio::test]
async fn test_drawing_analysis_without_image_is_an_error_body() {
    let mock = MockInferenceBackend::new();
    let (status, body) = send(
        app(&mock),
        post_json(
            "/api/labrat",
            json!({"type": "drawing_analysis", "input": "my sketch"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["error"].as_str().unwrap().contains("image"));
    assert!(body.get("success").is_none());
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_drawing_analysis_with_image() {
    let reply = "## Code Conversion Assessment\nYES\n\nFeasibility Score (1-10): 9\nConfidence Level (1-10): 6\n\n```python\n# Plot\nimport matplotlib\n```";
    let mock = MockInferenceBackend::new().with_fixed_response(reply);
    let (status, body) = send(
        app(&mock),
        post_json(
            "/api/labrat",
            json!({
                "type": "drawing_analysis",
                "input": "circuit",
                "image": png_data_url(),
                "verbose": false,
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["feasibility_score"], 9);
    assert_eq!(body["confidence_score"], 6);
    assert_eq!(body["code_conversion_feasible"], true);
    assert_eq!(body["notebook_cells"].as_array().unwrap().len(), 1);
    assert!(body.get("reasoning").is_none());
    assert!(mock.get_calls()[0].image_encoding.is_some());
}

#[tokio::test]
async fn test_provider_failure_is_reported_in_body() {
    let mock = MockInferenceBackend::new().with_failure("throttled");
    let (status, body) = send(app(&mock), post_json("/api/labrat", json!({"input": "hi"}))).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["error"].as_str().unwrap().contains("throttled"));
    assert!(body.get("text").is_none());
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let mock = MockInferenceBackend::new();
    let request = Request::builder()
        .method("POST")
        .uri("/api/labrat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(app(&mock), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_upload_text_and_broken_file() {
    let mock = MockInferenceBackend::new().with_fixed_response("```python\n# Compute\nx = 1\n```");
    let notes = base64::engine::general_purpose::STANDARD.encode("distance = speed * time");
    let (status, body) = send(
        app(&mock),
        post_json(
            "/api/upload",
            json!({"files": [
                {"data": notes, "type": "text/plain", "name": "notes.txt"},
                {"data": "", "type": "text/plain", "name": "empty.txt"},
            ]}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["filename"], "notes.txt");
    assert_eq!(results[0]["success"], true);
    assert_eq!(results[0]["notebook_cells"].as_array().unwrap().len(), 1);
    assert_eq!(results[1]["filename"], "empty.txt");
    assert!(results[1]["error"].is_string());
}

#[tokio::test]
async fn test_upload_without_files_is_bad_request() {
    let mock = MockInferenceBackend::new();
    let (status, body) = send(app(&mock), post_json("/api/upload", json!({"files": []}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No files provided");
}

#[tokio::test]
async fn test_create_notebook() {
    let mock = MockInferenceBackend::new();
    let (status, body) = send(
        app(&mock),
        post_json(
            "/api/create-notebook",
            json!({
                "cells": [{"cell_type": "code", "language": "python", "code": "print(1)", "description": "Print", "index": 1}],
                "name": "Optics",
                "ipynb": true,
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["notebook"]["name"], "Optics");
    assert_eq!(body["ipynb"]["nbformat"], 4);
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let mock = MockInferenceBackend::new();
    let big = "x".repeat(LIMIT + 1);
    let request = post_json("/api/labrat", json!({ "input": big }));
    let response = app(&mock).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_request_id_header_is_set() {
    let mock = MockInferenceBackend::new();
    let request = Request::get("/api/health").body(Body::empty()).unwrap();
    let response = app(&mock).oneshot(request).await.unwrap();

    assert!(response.headers().contains_key("x-request-id"));
}
