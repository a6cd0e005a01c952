// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Captioning API endpoint module
//!
//! Provides POST /vlm for describing images via the configured
//! captioning upstream.

pub mod handler;
pub mod response;

pub use handler::vlm_handler;
pub use response::VlmResponse;
