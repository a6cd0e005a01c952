// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Captioning endpoint handler

use axum::extract::Multipart;
use axum::Json;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::response::VlmResponse;
use crate::api::errors::ApiError;
use crate::config::VlmConfig;
use crate::vision::{decode_image_bytes, prepare_upload, CaptionClient};

/// POST /vlm - Caption an uploaded image via the configured upstream
///
/// Accepts multipart/form-data with a required `file` part. The image
/// is re-encoded as JPEG (longest edge capped at 1920px) and forwarded
/// to the upstream named by `VLM_API_URL` in the configured encoding.
///
/// # Errors
/// - 400: malformed upload or unreadable image
/// - 503: no upstream configured, or upstream unreachable
/// - 504: upstream timed out
/// - upstream status / 502: upstream error or unusable response body
pub async fn vlm_handler(multipart: Multipart) -> Result<Json<VlmResponse>, ApiError> {
    let started = Instant::now();

    let file = read_file_part(multipart).await?;

    let (image, image_info) = decode_image_bytes(&file).map_err(|e| {
        warn!("failed to decode uploaded image: {}", e);
        ApiError::InvalidImage(format!("could not read image file: {}", e))
    })?;

    debug!(
        "captioning request: {}x{}, {} bytes",
        image_info.width, image_info.height, image_info.size_bytes
    );

    // Configuration is read fresh on every request
    let config = VlmConfig::from_env().ok_or_else(|| {
        ApiError::VlmNotConfigured(
            "no captioning upstream configured: set VLM_API_URL".to_string(),
        )
    })?;

    let jpeg = prepare_upload(&image)
        .map_err(|e| ApiError::Internal(format!("failed to re-encode image: {}", e)))?;
    debug!("prepared upload: {} bytes", jpeg.len());

    let client = CaptionClient::new(config)?;
    let caption = client.caption(jpeg).await?;

    let response = VlmResponse {
        description: caption.description,
        duration_ms: started.elapsed().as_millis() as u64,
        model: caption.model,
    };

    info!(
        "caption complete: {} chars, {}ms",
        response.description.len(),
        response.duration_ms
    );

    Ok(Json(response))
}

/// Read the required `file` part from the multipart form
async fn read_file_part(mut multipart: Multipart) -> Result<Vec<u8>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidRequest(format!("malformed multipart body: {}", e)))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::InvalidRequest(format!("failed to read file part: {}", e)))?;
            return Ok(bytes.to_vec());
        }
    }

    Err(ApiError::InvalidRequest("missing 'file' part".to_string()))
}
