use anyhow::{anyhow, Result};
use image::GrayImage;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Command;
use tempfile::NamedTempFile;

use super::setup::TesseractPaths;

/// One Tesseract invocation profile: script hint plus page segmentation
/// mode. The runner tries several per bitmap and keeps the longest result.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Tesseract language string, e.g. "chi_tra+eng"
    pub languages: String,
    /// Page segmentation mode (6 = uniform block, 11 = sparse text)
    pub psm: u8,
}

impl EngineConfig {
    pub fn new(languages: &str, psm: u8) -> Self {
        Self {
            languages: languages.to_string(),
            psm,
        }
    }
}

/// Opaque OCR oracle. Production code shells out to Tesseract; tests
/// substitute deterministic fakes.
pub trait OcrEngine {
    fn recognize(&self, img: &GrayImage, config: &EngineConfig) -> Result<String>;
}

/// OCR backed by the Tesseract executable.
pub struct TesseractEngine {
    executable: PathBuf,
    tessdata: PathBuf,
}

impl TesseractEngine {
    pub fn new(paths: TesseractPaths) -> Self {
        Self {
            executable: paths.executable,
            tessdata: paths.tessdata,
        }
    }
}

impl OcrEngine for TesseractEngine {
    /// Runs Tesseract on a preprocessed grayscale bitmap and returns the
    /// raw recognized text.
    fn recognize(&self, img: &GrayImage, config: &EngineConfig) -> Result<String> {
        // Save image to temporary file
        let temp_input = NamedTempFile::with_suffix(".png")?;
        img.save(temp_input.path())?;

        // Run Tesseract to stdout
        let output = Command::new(&self.executable)
            .arg(temp_input.path())
            .arg("stdout")
            .arg("--tessdata-dir")
            .arg(&self.tessdata)
            .arg("-l")
            .arg(&config.languages)
            .arg("--oem")
            .arg("3")
            .arg("--psm")
            .arg(config.psm.to_string())
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("Tesseract failed: {}", stderr));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}
