// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Service configuration

pub mod vlm;

pub use vlm::{RequestMode, VlmConfig};
