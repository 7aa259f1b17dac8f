//! Multi-configuration OCR execution and channel assembly.
//!
//! Each preprocessed bitmap is run under several engine configurations;
//! the longest non-empty result wins (the oracle exposes no confidence
//! score, so length is the only completeness proxy available). Engine
//! failures and timeouts become empty results, never errors.

use anyhow::{anyhow, Result};
use image::GrayImage;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::engine::{EngineConfig, OcrEngine};
use super::preprocess::PreprocessedSet;
use crate::config::OcrRunnerConfig;
use crate::log;

/// Text channels extracted from one image (or accumulated per folder).
///
/// `full` is the concatenation of the three strategy channels with
/// blank-line separators; it serves as the pattern-matching fallback
/// source.
#[derive(Clone, Debug, Default)]
pub struct ChannelText {
    pub highlighted: String,
    pub bright: String,
    pub standard: String,
    pub full: String,
}

impl ChannelText {
    /// Builds channels from a manual text override: everything lands in
    /// `full`, the per-strategy channels stay empty.
    pub fn from_override(text: &str) -> Self {
        Self {
            full: text.to_string(),
            ..Self::default()
        }
    }

    /// Appends another image's channels, separating with blank lines.
    pub fn append(&mut self, other: &ChannelText) {
        append_channel(&mut self.highlighted, &other.highlighted);
        append_channel(&mut self.bright, &other.bright);
        append_channel(&mut self.standard, &other.standard);
        append_channel(&mut self.full, &other.full);
    }

    /// Applies a text transform to every channel.
    pub fn map(&self, f: impl Fn(&str) -> String) -> ChannelText {
        ChannelText {
            highlighted: f(&self.highlighted),
            bright: f(&self.bright),
            standard: f(&self.standard),
            full: f(&self.full),
        }
    }
}

fn append_channel(dest: &mut String, addition: &str) {
    if addition.trim().is_empty() {
        return;
    }
    if !dest.is_empty() {
        dest.push_str("\n\n");
    }
    dest.push_str(addition);
}

/// Runs every engine configuration over one bitmap and keeps the longest
/// non-empty result. Failures count as empty.
pub fn run_configs(
    engine: &Arc<dyn OcrEngine + Send + Sync>,
    img: &GrayImage,
    config: &OcrRunnerConfig,
) -> String {
    let timeout = Duration::from_millis(config.timeout_ms);
    let mut best = String::new();

    for engine_config in &config.engine_configs {
        let text = match recognize_with_timeout(engine, img, engine_config, timeout) {
            Ok(text) => text,
            Err(e) => {
                log(&format!(
                    "OCR failed ({} psm {}): {}",
                    engine_config.languages, engine_config.psm, e
                ));
                String::new()
            }
        };

        if !text.trim().is_empty() && text.chars().count() > best.chars().count() {
            best = text;
        }
    }

    best
}

/// Wraps one OCR invocation in a bounded timeout. Tesseract is the
/// slowest, least predictable step in the pipeline; a hung invocation
/// must not stall the whole batch.
fn recognize_with_timeout(
    engine: &Arc<dyn OcrEngine + Send + Sync>,
    img: &GrayImage,
    config: &EngineConfig,
    timeout: Duration,
) -> Result<String> {
    let (sender, receiver) = mpsc::channel();
    let engine = Arc::clone(engine);
    let img = img.clone();
    let config = config.clone();

    thread::spawn(move || {
        let _ = sender.send(engine.recognize(&img, &config));
    });

    match receiver.recv_timeout(timeout) {
        Ok(result) => result,
        Err(_) => Err(anyhow!("OCR timed out after {} ms", timeout.as_millis())),
    }
}

/// Runs OCR over all three strategy bitmaps and assembles the channels.
pub fn extract_channels(
    engine: &Arc<dyn OcrEngine + Send + Sync>,
    set: &PreprocessedSet,
    config: &OcrRunnerConfig,
) -> ChannelText {
    let highlighted = run_configs(engine, &set.highlighted, config);
    let bright = run_configs(engine, &set.bright, config);
    let standard = run_configs(engine, &set.standard, config);

    let mut full = String::new();
    for channel in [&highlighted, &bright, &standard] {
        append_channel(&mut full, channel);
    }

    ChannelText {
        highlighted,
        bright,
        standard,
        full,
    }
}
