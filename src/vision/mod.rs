// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision processing module
//!
//! This module provides:
//! - OCR (Optical Character Recognition) via the tesseract CLI
//! - Image captioning via a remote vision-language upstream
//!
//! The OCR engine runs locally; captioning is proxied to a configurable
//! HTTP endpoint.

pub mod caption_client;
pub mod engine_manager;
pub mod image_utils;
pub mod ocr_engine;

pub use caption_client::{Caption, CaptionClient, CaptionError};
pub use engine_manager::{EngineFactory, OcrEngineManager};
pub use image_utils::{decode_image_bytes, detect_format, prepare_upload, ImageError, ImageInfo};
pub use ocr_engine::{TesseractEngine, TextLine, TextRecognizer};
