// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Endpoint tests for POST /vlm
//!
//! Captioning configuration is read from the process environment, so
//! every assertion that touches VLM_* variables lives in the single
//! `test_vlm_endpoint_lifecycle` test to keep them sequential.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::routing::post;
use axum::Router;
use http_body_util::BodyExt;
use image::DynamicImage;
use ocr_read_backend::api::{build_router, AppState};
use std::io::Cursor;
use tower::ServiceExt;

const BOUNDARY: &str = "test-boundary-7MA4YWxkTrZu0gW";

const VLM_ENV_VARS: &[&str] = &[
    "VLM_API_URL",
    "VLM_API_KEY",
    "VLM_API_MODE",
    "VLM_API_MODEL",
    "VLM_API_CHAT",
    "VLM_API_DESC_KEY",
    "VLM_API_TIMEOUT",
];

fn test_state() -> AppState {
    AppState::with_engine_factory(Box::new(|_| anyhow::bail!("no engine in this test")))
}

fn tiny_png() -> Vec<u8> {
    let image = DynamicImage::new_rgb8(4, 4);
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, image::ImageFormat::Png)
        .unwrap();
    buffer.into_inner()
}

fn file_upload_body(data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        b"Content-Disposition: form-data; name=\"file\"; filename=\"photo.png\"\r\nContent-Type: application/octet-stream\r\n\r\n",
    );
    body.extend_from_slice(data);
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn post_vlm(body: Vec<u8>) -> Request<Body> {
    Request::post("/vlm")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn response_json(response: axum::response::Response) -> (StatusCode, serde_json::Value) {
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap();
    (status, value)
}

/// Serve a fixed response body on an ephemeral port, return the URL
async fn spawn_upstream(status: StatusCode, body: &'static str) -> String {
    let app = Router::new().route("/caption", post(move || async move { (status, body) }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/caption", addr)
}

#[tokio::test]
async fn test_vlm_missing_file_part() {
    let app = build_router(test_state());

    let body = format!("--{b}--\r\n", b = BOUNDARY).into_bytes();
    let (status, json) = response_json(app.oneshot(post_vlm(body)).await.unwrap()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error_type"], "invalid_request");
    assert!(json["message"].as_str().unwrap().contains("file"));
}

#[tokio::test]
async fn test_vlm_unreadable_image() {
    // The image is rejected before configuration is consulted, so this
    // test is safe to run alongside the lifecycle test.
    let app = build_router(test_state());

    let body = file_upload_body(b"definitely not an image");
    let (status, json) = response_json(app.oneshot(post_vlm(body)).await.unwrap()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error_type"], "invalid_image");
    assert!(json["message"].as_str().unwrap().contains("image"));
}

#[tokio::test]
async fn test_vlm_endpoint_lifecycle() {
    for var in VLM_ENV_VARS {
        std::env::remove_var(var);
    }
    let app = build_router(test_state());

    // 1. Unconfigured upstream -> 503
    let (status, json) =
        response_json(app.clone().oneshot(post_vlm(file_upload_body(&tiny_png()))).await.unwrap())
            .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["error_type"], "vlm_not_configured");
    assert!(json["message"].as_str().unwrap().contains("VLM_API_URL"));

    // 2. Chat-completions shaped response -> description extracted
    let url = spawn_upstream(
        StatusCode::OK,
        r#"{"choices":[{"message":{"content":"a cat"}}]}"#,
    )
    .await;
    std::env::set_var("VLM_API_URL", &url);
    std::env::set_var("VLM_API_MODE", "base64");
    std::env::set_var("VLM_API_MODEL", "test-captioner");

    let (status, json) =
        response_json(app.clone().oneshot(post_vlm(file_upload_body(&tiny_png()))).await.unwrap())
            .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["description"], "a cat");
    assert_eq!(json["model"], "test-captioner");
    assert!(json["duration_ms"].is_u64());

    // 3. Unrecognized JSON shape -> 502 with the body excerpted
    let url = spawn_upstream(StatusCode::OK, r#"{"weird":1,"payload":[2,3]}"#).await;
    std::env::set_var("VLM_API_URL", &url);

    let (status, json) =
        response_json(app.clone().oneshot(post_vlm(file_upload_body(&tiny_png()))).await.unwrap())
            .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["error_type"], "upstream_invalid_response");
    assert!(json["message"].as_str().unwrap().contains("\"weird\":1"));

    // 4. Upstream error status propagates with the body
    let url = spawn_upstream(StatusCode::INTERNAL_SERVER_ERROR, "model crashed").await;
    std::env::set_var("VLM_API_URL", &url);

    let (status, json) =
        response_json(app.clone().oneshot(post_vlm(file_upload_body(&tiny_png()))).await.unwrap())
            .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error_type"], "upstream_error");
    assert!(json["message"].as_str().unwrap().contains("model crashed"));

    // 5. Non-JSON body -> 502
    let url = spawn_upstream(StatusCode::OK, "<html>hello</html>").await;
    std::env::set_var("VLM_API_URL", &url);

    let (status, json) =
        response_json(app.oneshot(post_vlm(file_upload_body(&tiny_png()))).await.unwrap()).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["error_type"], "upstream_invalid_response");
    assert!(json["message"].as_str().unwrap().contains("<html>"));

    for var in VLM_ENV_VARS {
        std::env::remove_var(var);
    }
}
