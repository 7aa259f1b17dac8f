//! Scanner configuration.
//!
//! Loads settings from config.json next to the executable at startup.
//! Keyword tables, blacklists and preprocessing thresholds are immutable
//! once loaded and passed explicitly into the pipeline components.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::ocr::engine::EngineConfig;

/// Complete scanner configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    pub ocr: OcrRunnerConfig,
    pub preprocess: PreprocessConfig,
    pub classify: ClassifyConfig,
    pub name: NameConfig,
    pub index: IndexConfig,
}

/// OCR strategy-runner settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrRunnerConfig {
    /// Engine configurations tried per bitmap; the longest non-empty
    /// result wins.
    pub engine_configs: Vec<EngineConfig>,
    /// Per-invocation OCR timeout. Expiry is treated as an empty result.
    pub timeout_ms: u64,
    /// Maximum number of images OCR'd per folder. The gallery still
    /// lists every image.
    pub max_ocr_images: usize,
}

impl Default for OcrRunnerConfig {
    fn default() -> Self {
        Self {
            engine_configs: vec![
                EngineConfig::new("chi_tra+eng", 6),
                EngineConfig::new("chi_tra+eng", 11),
                EngineConfig::new("eng", 6),
            ],
            timeout_ms: 30000,
            max_ocr_images: 5,
        }
    }
}

/// Image preprocessing thresholds.
///
/// Hue values are degrees (0-360), saturation/value fractions (0.0-1.0).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// 2x upscale of the grayscale body-text bitmap before binarization
    pub standard_upscale: bool,
    /// Hue band for orange highlight text
    pub orange_hue_min: f32,
    pub orange_hue_max: f32,
    /// Red wraps across 0 degrees, so it needs a second band:
    /// hue >= red_hue_min OR hue <= red_hue_max
    pub red_hue_min: f32,
    pub red_hue_max: f32,
    /// Minimum saturation/value for a pixel to count as highlight text
    pub min_saturation: f32,
    pub min_value: f32,
    /// Luminance percentile for the bright-glow threshold
    pub bright_percentile: f32,
    /// Upscale factors fed to Tesseract
    pub highlighted_scale: u32,
    pub bright_scale: u32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            standard_upscale: true,
            orange_hue_min: 10.0,
            orange_hue_max: 45.0,
            red_hue_min: 340.0,
            red_hue_max: 10.0,
            min_saturation: 0.45,
            min_value: 0.45,
            bright_percentile: 0.92,
            highlighted_scale: 3,
            bright_scale: 4,
        }
    }
}

/// Keyword tables for the announcement classifier.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifyConfig {
    pub character_keywords: Vec<String>,
    pub balance_keywords: Vec<String>,
    pub event_keywords: Vec<String>,
    /// Minimum winning score; below this the announcement is flagged for
    /// manual review.
    pub min_score: u32,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            character_keywords: strings(&[
                "new", "character", "hero", "general", "warrior", "emperor",
                "legend", "mythic", "transcend", "awaken", "rarity", "costume",
                "skin", "avatar", "新武將", "武將", "介紹", "登場", "角色",
            ]),
            balance_keywords: strings(&[
                "balance", "rework", "update", "adjustment", "patch", "buff",
                "nerf", "revamp", "remake", "class", "平衡", "更新", "調整",
                "重做", "技能修改",
            ]),
            event_keywords: strings(&[
                "event", "limited", "special", "celebration", "festival",
                "活動", "限時", "特別",
            ]),
            min_score: 2,
        }
    }
}

/// Name-extractor word lists.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct NameConfig {
    /// Boilerplate slug words removed before building the phonetic target
    pub ignore_words: Vec<String>,
    /// Game vocabulary that is never a character name
    pub blacklist: Vec<String>,
    /// Ideographs from stat/skill vocabulary; any candidate containing
    /// one is rejected
    pub disallowed_chars: String,
}

impl Default for NameConfig {
    fn default() -> Self {
        Self {
            ignore_words: strings(&[
                "emperor", "rarity", "legend", "new", "character", "hero",
                "skin", "costume", "general", "warrior", "awakened",
            ]),
            blacklist: strings(&[
                "新武將", "武將", "介紹", "登場", "角色", "更新", "技能",
                "傷害", "攻擊", "對象", "造成", "發動", "獲得", "增加",
                "減少", "平衡", "調整", "活動", "限時", "特別", "皇帝",
            ]),
            disallowed_chars: "技能級星階".to_string(),
        }
    }
}

/// Entry caps for the merged index sections.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Cap for announcements/README.md
    pub recent_cap: usize,
    /// Cap for the top-level README.md
    pub root_cap: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            recent_cap: 10,
            root_cap: 5,
        }
    }
}

fn strings(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

/// Loads configuration from the given path or returns defaults.
pub fn load_config(config_path: &Path) -> ScannerConfig {
    if config_path.exists() {
        match fs::read_to_string(config_path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    crate::log("Config loaded from config.json");
                    return config;
                }
                Err(e) => {
                    crate::log(&format!(
                        "Failed to parse config.json: {}. Using defaults.",
                        e
                    ));
                }
            },
            Err(e) => {
                crate::log(&format!(
                    "Failed to read config.json: {}. Using defaults.",
                    e
                ));
            }
        }
    } else {
        crate::log("config.json not found. Using default config.");
    }

    ScannerConfig::default()
}

/// Loads configuration from config.json next to the executable.
pub fn load_or_default() -> ScannerConfig {
    let config_path = crate::paths::get_base_dir().join("config.json");
    load_config(&config_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_round_trips() {
        let config = ScannerConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: ScannerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.classify.min_score, config.classify.min_score);
        assert_eq!(parsed.ocr.engine_configs.len(), 3);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let parsed: ScannerConfig =
            serde_json::from_str(r#"{"index": {"root_cap": 3}}"#).unwrap();
        assert_eq!(parsed.index.root_cap, 3);
        assert_eq!(parsed.index.recent_cap, 10);
        assert!(!parsed.classify.character_keywords.is_empty());
    }

    #[test]
    fn test_load_config_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("config.json"));
        assert_eq!(config.classify.min_score, 2);
    }
}
