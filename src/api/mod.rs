// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! HTTP API module

pub mod errors;
pub mod http_server;
pub mod ocr;
pub mod vlm;

pub use errors::{ApiError, ErrorResponse};
pub use http_server::{build_router, start_server, AppState};
