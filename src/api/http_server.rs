// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Router construction and server startup

use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::ocr::ocr_handler;
use crate::api::vlm::vlm_handler;
use crate::vision::{EngineFactory, OcrEngineManager, TesseractEngine, TextRecognizer};

/// Shared handler state
///
/// The OCR engine manager is the only shared mutable resource; the
/// captioning handler is stateless (configuration is re-read per
/// request).
#[derive(Clone)]
pub struct AppState {
    pub ocr_engines: Arc<OcrEngineManager>,
}

impl AppState {
    /// State backed by the tesseract engine
    pub fn new() -> Self {
        Self::with_engine_factory(Box::new(|languages| {
            let engine = TesseractEngine::new(languages)?;
            Ok(Arc::new(engine) as Arc<dyn TextRecognizer>)
        }))
    }

    /// State with a custom engine factory (used by tests)
    pub fn with_engine_factory(factory: EngineFactory) -> Self {
        Self {
            ocr_engines: Arc::new(OcrEngineManager::new(factory)),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/ocr", post(ocr_handler))
        .route("/vlm", post(vlm_handler))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until shutdown
pub async fn start_server(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("API server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for shutdown signal: {}", e);
    } else {
        tracing::info!("shutdown signal received");
    }
}

async fn health_handler() -> impl IntoResponse {
    axum::Json(json!({"status": "ok"}))
}
