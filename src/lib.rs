// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod config;
pub mod vision;

// Re-export main types
pub use api::{build_router, start_server, ApiError, AppState, ErrorResponse};
pub use config::{RequestMode, VlmConfig};
pub use vision::{
    Caption, CaptionClient, CaptionError, OcrEngineManager, TesseractEngine, TextLine,
    TextRecognizer,
};
