// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! OCR endpoint handler

use axum::extract::{Multipart, State};
use axum::Json;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::request::OcrUpload;
use super::response::OcrResponse;
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::vision::decode_image_bytes;

/// POST /ocr - Extract text from an uploaded image
///
/// Accepts multipart/form-data with a required `file` part and an
/// optional comma-separated `languages` part (default "chi_sim,eng").
///
/// # Response
/// - `text`: recognized lines joined by newline
/// - `confidences`: per-line confidence scores (0.0-1.0)
/// - `avg_confidence`: arithmetic mean, 0.0 when nothing was detected
/// - `languages`: resolved language list
/// - `duration_ms`: wall-clock time
///
/// # Errors
/// - 400: malformed upload or unreadable image
/// - 503: OCR engine could not be constructed
/// - 500: recognition failed
pub async fn ocr_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<OcrResponse>, ApiError> {
    let started = Instant::now();

    let upload = OcrUpload::from_multipart(multipart).await?;

    let (image, image_info) = decode_image_bytes(&upload.file).map_err(|e| {
        warn!("failed to decode uploaded image: {}", e);
        ApiError::InvalidImage(format!("could not read image file: {}", e))
    })?;

    debug!(
        "OCR request: {}x{}, {} bytes, languages: {}",
        image_info.width,
        image_info.height,
        image_info.size_bytes,
        upload.languages.join(",")
    );

    let engine = state
        .ocr_engines
        .engine_for(&upload.languages)
        .await
        .map_err(|e| {
            warn!("OCR engine unavailable: {}", e);
            ApiError::OcrUnavailable(format!("OCR engine unavailable: {}", e))
        })?;

    let languages = engine.languages().to_vec();

    let lines = tokio::task::spawn_blocking(move || engine.recognize(&image))
        .await
        .map_err(|e| ApiError::Internal(format!("OCR task failed: {}", e)))?
        .map_err(|e| {
            warn!("OCR recognition failed: {}", e);
            ApiError::OcrFailed(format!("OCR failed: {}", e))
        })?;

    let response = OcrResponse::from_lines(&lines, languages, started.elapsed());

    info!(
        "OCR complete: {} lines, {:.2} avg confidence, {}ms",
        response.confidences.len(),
        response.avg_confidence,
        response.duration_ms
    );

    Ok(Json(response))
}
