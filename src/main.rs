// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use dotenv::dotenv;
use ocr_read_backend::api::{start_server, AppState};
use std::{env, net::SocketAddr};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    // VLM_DEBUG bumps the default log level; RUST_LOG still wins
    let vlm_debug = env::var("VLM_DEBUG")
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false);
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", if vlm_debug { "debug" } else { "info" });
    }
    tracing_subscriber::fmt::init();

    let port = env::var("API_PORT")
        .ok()
        .and_then(|v| v.parse::<u16>().ok())
        .unwrap_or(8000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    start_server(addr, AppState::new()).await
}
