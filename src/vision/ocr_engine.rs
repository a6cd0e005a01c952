// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! OCR engine backend over the tesseract CLI

use anyhow::{anyhow, bail, Result};
use image::DynamicImage;
use rusty_tesseract::{Args, Data};
use std::collections::HashMap;
use tracing::debug;

/// One recognized line of text with its confidence score (0.0-1.0)
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub confidence: f32,
}

/// Trait for text recognition backends
pub trait TextRecognizer: Send + Sync {
    /// The language set this engine was built with
    fn languages(&self) -> &[String];

    /// Recognize text lines in an image
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<TextLine>>;
}

/// Tesseract-backed OCR engine
///
/// Construction verifies the requested languages against the installed
/// tessdata packs, so a bad language list fails up front rather than on
/// the first recognition call.
pub struct TesseractEngine {
    languages: Vec<String>,
    args: Args,
}

impl TesseractEngine {
    /// Create an engine for the given language set (tesseract codes, e.g. "eng", "chi_sim")
    pub fn new(languages: &[String]) -> Result<Self> {
        if languages.is_empty() {
            bail!("at least one OCR language is required");
        }

        let installed = rusty_tesseract::get_tesseract_langs()
            .map_err(|e| anyhow!("tesseract is not available: {}", e))?;

        for lang in languages {
            if !installed.contains(lang) {
                bail!(
                    "OCR language '{}' is not installed (installed: {})",
                    lang,
                    installed.join(", ")
                );
            }
        }

        let args = Args {
            lang: languages.join("+"),
            config_variables: HashMap::new(),
            dpi: None,
            psm: None,
            oem: None,
        };

        debug!("tesseract engine ready for languages: {}", args.lang);

        Ok(Self {
            languages: languages.to_vec(),
            args,
        })
    }
}

impl TextRecognizer for TesseractEngine {
    fn languages(&self) -> &[String] {
        &self.languages
    }

    fn recognize(&self, image: &DynamicImage) -> Result<Vec<TextLine>> {
        let ocr_image = rusty_tesseract::Image::from_dynamic_image(image)
            .map_err(|e| anyhow!("failed to prepare image for OCR: {}", e))?;

        let output = rusty_tesseract::image_to_data(&ocr_image, &self.args)
            .map_err(|e| anyhow!("tesseract recognition failed: {}", e))?;

        Ok(fold_into_lines(&output.data))
    }
}

/// Fold tesseract TSV rows into per-line text and confidence
///
/// Word rows (level 5) are grouped by (page, block, paragraph, line);
/// each line's text is the space-joined word text and its confidence is
/// the mean word confidence scaled from tesseract's 0-100 to 0.0-1.0.
pub fn fold_into_lines(rows: &[Data]) -> Vec<TextLine> {
    let mut lines: Vec<TextLine> = Vec::new();
    let mut current_key: Option<(i32, i32, i32, i32)> = None;
    let mut words: Vec<String> = Vec::new();
    let mut confs: Vec<f32> = Vec::new();

    let flush = |words: &mut Vec<String>, confs: &mut Vec<f32>, lines: &mut Vec<TextLine>| {
        if words.is_empty() {
            return;
        }
        let confidence = confs.iter().sum::<f32>() / confs.len() as f32 / 100.0;
        lines.push(TextLine {
            text: words.join(" "),
            confidence,
        });
        words.clear();
        confs.clear();
    };

    for row in rows {
        // Level 5 rows are words; coarser levels carry no text
        if row.level != 5 || row.text.trim().is_empty() {
            continue;
        }

        let key = (row.page_num, row.block_num, row.par_num, row.line_num);
        if current_key != Some(key) {
            flush(&mut words, &mut confs, &mut lines);
            current_key = Some(key);
        }

        words.push(row.text.trim().to_string());
        confs.push(row.conf.max(0.0));
    }

    flush(&mut words, &mut confs, &mut lines);
    lines
}
