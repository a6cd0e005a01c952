// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Captioning upstream configuration read from the environment

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// How the image is encoded in the outbound captioning request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestMode {
    /// Raw file part in a multipart form
    Multipart,
    /// Base64 string embedded in a JSON field
    Base64,
    /// OpenAI-style chat completions body with a data-URL image
    Chat,
}

impl RequestMode {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "base64" => RequestMode::Base64,
            "chat" => RequestMode::Chat,
            _ => RequestMode::Multipart,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestMode::Multipart => "multipart",
            RequestMode::Base64 => "base64",
            RequestMode::Chat => "chat",
        }
    }
}

/// Configuration for the remote captioning upstream
///
/// Read fresh from the environment on every request; nothing is cached
/// and only the presence of the URL is validated.
#[derive(Debug, Clone)]
pub struct VlmConfig {
    /// Upstream endpoint URL
    pub url: String,
    /// API key, sent as `<auth_header>: <key_prefix><api_key>`
    pub api_key: Option<String>,
    /// Header name carrying the key
    pub auth_header: String,
    /// Prefix prepended to the key
    pub key_prefix: String,
    /// Outbound request encoding
    pub mode: RequestMode,
    /// Field name carrying the image (multipart part / JSON key)
    pub image_field: String,
    /// Response key checked first when extracting the description
    pub desc_key: String,
    /// Model name forwarded upstream and echoed in responses
    pub model: Option<String>,
    /// Total request timeout
    pub timeout: Duration,
    /// Extra static fields added to the outbound request
    pub extra_fields: Vec<(String, String)>,
    /// Prompt used in chat mode
    pub prompt: String,
    /// Completion budget in chat mode
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

impl VlmConfig {
    /// Read configuration from the process environment
    ///
    /// Returns `None` when no upstream URL is configured.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read configuration through an arbitrary lookup (testable seam)
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let url = get("VLM_API_URL").filter(|u| !u.trim().is_empty())?;

        let mut mode = get("VLM_API_MODE")
            .map(|m| RequestMode::parse(&m))
            .unwrap_or(RequestMode::Multipart);

        // Legacy flag from before chat was a mode of its own
        if get("VLM_API_CHAT").map(|v| is_truthy(&v)).unwrap_or(false) {
            mode = RequestMode::Chat;
        }

        let timeout_secs = get("VLM_API_TIMEOUT")
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(30.0);

        Some(Self {
            url,
            api_key: get("VLM_API_KEY"),
            auth_header: get("VLM_API_AUTH_HEADER").unwrap_or_else(|| "Authorization".to_string()),
            key_prefix: get("VLM_API_KEY_PREFIX").unwrap_or_else(|| "Bearer ".to_string()),
            mode,
            image_field: get("VLM_API_IMAGE_FIELD").unwrap_or_else(|| "file".to_string()),
            desc_key: get("VLM_API_DESC_KEY").unwrap_or_else(|| "description".to_string()),
            model: get("VLM_API_MODEL"),
            timeout: Duration::from_secs_f64(timeout_secs.max(0.0)),
            extra_fields: parse_extra_fields(&get("VLM_API_EXTRA_FIELDS").unwrap_or_default()),
            prompt: get("VLM_API_PROMPT")
                .unwrap_or_else(|| "Please describe the image concisely.".to_string()),
            max_tokens: get("VLM_API_MAX_TOKENS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(512),
            temperature: get("VLM_API_TEMPERATURE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0.7),
            top_p: get("VLM_API_TOP_P")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0.7),
        })
    }
}

/// Parse comma-separated `key=value` pairs, e.g. `extra=1,lang=zh`
fn parse_extra_fields(raw: &str) -> Vec<(String, String)> {
    raw.split(',')
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), value.trim().to_string()))
        })
        .collect()
}

pub(crate) fn is_truthy(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "1" | "true" | "yes")
}
