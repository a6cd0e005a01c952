// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Captioning response types

use serde::{Deserialize, Serialize};

/// Response from the captioning endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VlmResponse {
    /// Natural-language description of the image
    pub description: String,
    /// Wall-clock time for the whole request
    pub duration_ms: u64,
    /// Model name, present when one is configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}
