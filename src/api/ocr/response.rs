// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! OCR response types

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::vision::TextLine;

/// Response from OCR processing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrResponse {
    /// Recognized lines joined by newline
    pub text: String,
    /// Per-line confidence scores (0.0-1.0)
    pub confidences: Vec<f32>,
    /// Arithmetic mean confidence, 0.0 when nothing was detected
    pub avg_confidence: f32,
    /// Languages the engine actually ran with
    pub languages: Vec<String>,
    /// Wall-clock time for the whole request
    pub duration_ms: u64,
}

impl OcrResponse {
    /// Flatten recognized lines into the response shape
    pub fn from_lines(lines: &[TextLine], languages: Vec<String>, elapsed: Duration) -> Self {
        let text = lines
            .iter()
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let confidences: Vec<f32> = lines.iter().map(|line| line.confidence).collect();

        let avg_confidence = if confidences.is_empty() {
            0.0
        } else {
            let mean = confidences.iter().sum::<f32>() / confidences.len() as f32;
            (mean * 10_000.0).round() / 10_000.0
        };

        Self {
            text,
            confidences,
            avg_confidence,
            languages,
            duration_ms: elapsed.as_millis() as u64,
        }
    }
}
