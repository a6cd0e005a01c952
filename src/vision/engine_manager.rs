// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Process-wide OCR engine cache keyed by language set

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::vision::ocr_engine::TextRecognizer;

/// Builds a recognizer for a language set
pub type EngineFactory =
    Box<dyn Fn(&[String]) -> anyhow::Result<Arc<dyn TextRecognizer>> + Send + Sync>;

/// Holds the most recently built OCR engine and rebuilds it when the
/// requested language set changes.
///
/// Engine construction loads language models, so the engine is reused
/// across requests. A rebuild is a full reconstruction; the lock keeps
/// concurrent requests with differing language sets from racing on it.
pub struct OcrEngineManager {
    factory: EngineFactory,
    current: RwLock<Option<Arc<dyn TextRecognizer>>>,
}

impl OcrEngineManager {
    pub fn new(factory: EngineFactory) -> Self {
        Self {
            factory,
            current: RwLock::new(None),
        }
    }

    /// Get an engine for the given language set, rebuilding if needed
    pub async fn engine_for(&self, languages: &[String]) -> anyhow::Result<Arc<dyn TextRecognizer>> {
        // Fast path: current engine already speaks these languages
        if let Some(engine) = self.current.read().await.as_ref() {
            if same_language_set(engine.languages(), languages) {
                return Ok(engine.clone());
            }
        }

        let mut slot = self.current.write().await;

        // Re-check: another request may have rebuilt while we waited
        if let Some(engine) = slot.as_ref() {
            if same_language_set(engine.languages(), languages) {
                return Ok(engine.clone());
            }
        }

        info!("building OCR engine for languages: {}", languages.join(","));
        let engine = (self.factory)(languages)?;
        *slot = Some(engine.clone());
        Ok(engine)
    }
}

/// Order-insensitive language set comparison; duplicates don't count
fn same_language_set(a: &[String], b: &[String]) -> bool {
    fn normalize(langs: &[String]) -> Vec<&str> {
        let mut set: Vec<&str> = langs.iter().map(String::as_str).collect();
        set.sort_unstable();
        set.dedup();
        set
    }
    normalize(a) == normalize(b)
}
