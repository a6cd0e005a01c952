// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! OCR upload parsing

use axum::extract::Multipart;

use crate::api::errors::ApiError;

/// Default language pair when the form omits `languages`
pub const DEFAULT_LANGUAGES: &[&str] = &["chi_sim", "eng"];

/// Parsed `POST /ocr` upload
#[derive(Debug)]
pub struct OcrUpload {
    /// Raw image bytes from the `file` part
    pub file: Vec<u8>,
    /// Resolved language list
    pub languages: Vec<String>,
}

impl OcrUpload {
    /// Read the multipart form
    ///
    /// Expects a required `file` part and an optional comma-separated
    /// `languages` part. Unknown parts are ignored.
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut file: Option<Vec<u8>> = None;
        let mut languages: Option<String> = None;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::InvalidRequest(format!("malformed multipart body: {}", e)))?
        {
            match field.name() {
                Some("file") => {
                    let bytes = field.bytes().await.map_err(|e| {
                        ApiError::InvalidRequest(format!("failed to read file part: {}", e))
                    })?;
                    file = Some(bytes.to_vec());
                }
                Some("languages") => {
                    let text = field.text().await.map_err(|e| {
                        ApiError::InvalidRequest(format!("failed to read languages part: {}", e))
                    })?;
                    languages = Some(text);
                }
                _ => {}
            }
        }

        let file = file
            .ok_or_else(|| ApiError::InvalidRequest("missing 'file' part".to_string()))?;

        Ok(Self {
            file,
            languages: parse_languages(languages.as_deref()),
        })
    }
}

/// Split a comma-separated language list, falling back to the defaults
/// when the list is absent or empty. Duplicate entries are dropped so
/// the engine cache sees a proper set.
pub fn parse_languages(raw: Option<&str>) -> Vec<String> {
    let mut parsed: Vec<String> = Vec::new();
    for lang in raw
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        if !parsed.iter().any(|seen| seen == lang) {
            parsed.push(lang.to_string());
        }
    }

    if parsed.is_empty() {
        DEFAULT_LANGUAGES.iter().map(|s| s.to_string()).collect()
    } else {
        parsed
    }
}
