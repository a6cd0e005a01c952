// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! API error taxonomy

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::vision::CaptionError;

/// JSON body returned for every failed request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error_type: String,
    pub message: String,
}

/// Everything that can go wrong while handling a request
///
/// No retries anywhere; each variant surfaces immediately to the caller
/// with a human-readable message.
#[derive(Debug, Clone)]
pub enum ApiError {
    /// Malformed multipart body or missing `file` part (400)
    InvalidRequest(String),
    /// Uploaded bytes could not be decoded as an image (400)
    InvalidImage(String),
    /// OCR engine could not be constructed (503)
    OcrUnavailable(String),
    /// OCR recognition failed (500)
    OcrFailed(String),
    /// No captioning upstream configured (503)
    VlmNotConfigured(String),
    /// Captioning upstream could not be reached (503)
    UpstreamUnreachable(String),
    /// Captioning upstream timed out (504)
    UpstreamTimeout(String),
    /// Captioning upstream answered with an error status (propagated, or 502)
    UpstreamStatus { status: u16, body: String },
    /// Captioning upstream answered 2xx but the body was unusable (502)
    UpstreamInvalid { reason: String, body: String },
    /// Anything else (500)
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) | ApiError::InvalidImage(_) => StatusCode::BAD_REQUEST,
            ApiError::OcrUnavailable(_)
            | ApiError::VlmNotConfigured(_)
            | ApiError::UpstreamUnreachable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::OcrFailed(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::UpstreamStatus { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ApiError::UpstreamInvalid { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        let (error_type, message) = match self {
            ApiError::InvalidRequest(msg) => ("invalid_request", msg.clone()),
            ApiError::InvalidImage(msg) => ("invalid_image", msg.clone()),
            ApiError::OcrUnavailable(msg) => ("ocr_unavailable", msg.clone()),
            ApiError::OcrFailed(msg) => ("ocr_failed", msg.clone()),
            ApiError::VlmNotConfigured(msg) => ("vlm_not_configured", msg.clone()),
            ApiError::UpstreamUnreachable(msg) => ("upstream_unreachable", msg.clone()),
            ApiError::UpstreamTimeout(msg) => ("upstream_timeout", msg.clone()),
            ApiError::UpstreamStatus { status, body } => (
                "upstream_error",
                format!("captioning upstream returned HTTP {}: {}", status, body),
            ),
            ApiError::UpstreamInvalid { reason, body } => {
                ("upstream_invalid_response", format!("{}: {}", reason, body))
            }
            ApiError::Internal(msg) => ("internal_error", msg.clone()),
        };

        ErrorResponse {
            error_type: error_type.to_string(),
            message,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_response())).into_response()
    }
}

impl From<CaptionError> for ApiError {
    fn from(err: CaptionError) -> Self {
        match err {
            CaptionError::Timeout(timeout) => ApiError::UpstreamTimeout(format!(
                "captioning upstream timed out after {:.0}s; increase VLM_API_TIMEOUT",
                timeout.as_secs_f64()
            )),
            CaptionError::Unreachable(msg) => {
                ApiError::UpstreamUnreachable(format!("captioning upstream unreachable: {}", msg))
            }
            CaptionError::UpstreamStatus { status, body } => {
                ApiError::UpstreamStatus { status, body }
            }
            CaptionError::InvalidBody { body } => ApiError::UpstreamInvalid {
                reason: "captioning upstream returned a non-JSON body".to_string(),
                body,
            },
            CaptionError::MissingDescription { body } => ApiError::UpstreamInvalid {
                reason: "no description found in upstream response".to_string(),
                body,
            },
            CaptionError::Request(msg) => ApiError::Internal(msg),
        }
    }
}
