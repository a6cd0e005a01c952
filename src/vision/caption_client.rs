// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Client for the remote captioning upstream
//!
//! Builds the outbound request in one of three encodings (multipart
//! file upload, base64 JSON field, or an OpenAI-style chat completions
//! body) and extracts the description from whatever JSON shape the
//! upstream answers with.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::vlm::{RequestMode, VlmConfig};

/// Connect timeout, independent of the configured total timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Upstream body excerpts in error messages are capped at this length
const BODY_EXCERPT_LIMIT: usize = 512;

/// Response keys tried when the configured key and the chat path both miss
const FALLBACK_KEYS: &[&str] = &["description", "caption", "text", "result", "output", "data"];

// --- OpenAI-compatible serde structs ---

#[derive(serde::Serialize)]
struct ChatRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    messages: Vec<ChatMessage>,
    stream: bool,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
}

#[derive(serde::Serialize)]
struct ChatMessage {
    role: String,
    content: serde_json::Value,
}

/// A caption returned by the upstream
#[derive(Debug, Clone)]
pub struct Caption {
    pub description: String,
    pub model: Option<String>,
}

#[derive(Debug, Error)]
pub enum CaptionError {
    #[error("captioning upstream timed out after {0:?}")]
    Timeout(Duration),

    #[error("captioning upstream unreachable: {0}")]
    Unreachable(String),

    #[error("captioning upstream returned HTTP {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("captioning upstream returned a non-JSON body: {body}")]
    InvalidBody { body: String },

    #[error("no description found in upstream response: {body}")]
    MissingDescription { body: String },

    #[error("failed to build upstream request: {0}")]
    Request(String),
}

/// Client for a single captioning request
pub struct CaptionClient {
    client: Client,
    config: VlmConfig,
}

impl CaptionClient {
    /// Build a client with the configured timeouts
    pub fn new(config: VlmConfig) -> Result<Self, CaptionError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| CaptionError::Request(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Send the image (JPEG bytes) upstream and extract a description
    pub async fn caption(&self, jpeg: Vec<u8>) -> Result<Caption, CaptionError> {
        debug!(
            "captioning request: url={} mode={} bytes={}",
            self.config.url,
            self.config.mode.as_str(),
            jpeg.len()
        );

        let mut request = match self.config.mode {
            RequestMode::Multipart => self.multipart_request(jpeg)?,
            RequestMode::Base64 => self.base64_request(&jpeg),
            RequestMode::Chat => self.chat_request(&jpeg),
        };

        if let Some(ref key) = self.config.api_key {
            request = request.header(
                self.config.auth_header.as_str(),
                format!("{}{}", self.config.key_prefix, key),
            );
        }

        let response = request.send().await.map_err(|e| self.transport_error(e))?;

        let status = response.status();
        // The timeout also covers reading the body
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(CaptionError::UpstreamStatus {
                status: status.as_u16(),
                body: excerpt(&body),
            });
        }

        let value: serde_json::Value =
            serde_json::from_str(&body).map_err(|_| CaptionError::InvalidBody {
                body: excerpt(&body),
            })?;

        let description = extract_description(&value, &self.config.desc_key).ok_or_else(|| {
            CaptionError::MissingDescription {
                body: excerpt(&body),
            }
        })?;

        Ok(Caption {
            description,
            model: self.config.model.clone(),
        })
    }

    fn transport_error(&self, e: reqwest::Error) -> CaptionError {
        if e.is_timeout() {
            CaptionError::Timeout(self.config.timeout)
        } else {
            CaptionError::Unreachable(e.to_string())
        }
    }

    fn multipart_request(&self, jpeg: Vec<u8>) -> Result<reqwest::RequestBuilder, CaptionError> {
        let part = Part::bytes(jpeg)
            .file_name("image.jpg")
            .mime_str("image/jpeg")
            .map_err(|e| CaptionError::Request(e.to_string()))?;

        let mut form = Form::new().part(self.config.image_field.clone(), part);
        if let Some(ref model) = self.config.model {
            form = form.text("model", model.clone());
        }
        for (key, value) in &self.config.extra_fields {
            form = form.text(key.clone(), value.clone());
        }

        Ok(self.client.post(&self.config.url).multipart(form))
    }

    fn base64_request(&self, jpeg: &[u8]) -> reqwest::RequestBuilder {
        let mut body = serde_json::Map::new();
        body.insert(
            self.config.image_field.clone(),
            serde_json::Value::String(STANDARD.encode(jpeg)),
        );
        if let Some(ref model) = self.config.model {
            body.insert("model".to_string(), serde_json::Value::String(model.clone()));
        }
        for (key, value) in &self.config.extra_fields {
            body.insert(key.clone(), serde_json::Value::String(value.clone()));
        }

        self.client
            .post(&self.config.url)
            .json(&serde_json::Value::Object(body))
    }

    fn chat_request(&self, jpeg: &[u8]) -> reqwest::RequestBuilder {
        let data_url = format!("data:image/jpeg;base64,{}", STANDARD.encode(jpeg));

        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: serde_json::json!([
                    {"type": "image_url", "image_url": {"url": data_url}},
                    {"type": "text", "text": self.config.prompt}
                ]),
            }],
            stream: false,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            top_p: self.config.top_p,
        };

        self.client.post(&self.config.url).json(&request)
    }
}

/// Extract a description from an upstream response
///
/// Strategies are tried in order: the configured key as a top-level
/// string, the chat-completions path, then a fixed list of common key
/// names. Empty strings never match.
pub fn extract_description(value: &serde_json::Value, desc_key: &str) -> Option<String> {
    let configured = |v: &serde_json::Value| top_level_string(v, desc_key);
    let strategies: [&dyn Fn(&serde_json::Value) -> Option<String>; 3] =
        [&configured, &chat_choices, &fallback_keys];

    strategies.iter().find_map(|strategy| strategy(value))
}

fn top_level_string(value: &serde_json::Value, key: &str) -> Option<String> {
    value
        .get(key)?
        .as_str()
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

/// `choices[0].message.content` (SiliconFlow/OpenAI-compatible upstreams)
fn chat_choices(value: &serde_json::Value) -> Option<String> {
    value
        .get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

fn fallback_keys(value: &serde_json::Value) -> Option<String> {
    FALLBACK_KEYS
        .iter()
        .find_map(|key| top_level_string(value, key))
}

/// Truncate a body for inclusion in an error message
fn excerpt(body: &str) -> String {
    if body.len() <= BODY_EXCERPT_LIMIT {
        return body.to_string();
    }
    let mut end = BODY_EXCERPT_LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
