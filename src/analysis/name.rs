use anyhow::Result;
use regex::Regex;

use super::is_cjk;
use super::translit::Transliterator;
use crate::config::NameConfig;
use crate::log;
use crate::ocr::ChannelText;

/// A labeled pattern in the extraction cascade.
struct NamePattern {
    label: &'static str,
    regex: Regex,
}

/// Pattern/keyword sources, highest confidence first. Header keywords are
/// usually color-highlighted, so the highlighted channel is tried before
/// the others.
const PATTERNS: &[(&str, &str)] = &[
    ("new-general", r"新武將[：:\s]*([\u{4e00}-\u{9fff}]{2,4})"),
    ("new-character", r"新角色[：:\s]*([\u{4e00}-\u{9fff}]{2,4})"),
    ("introduction", r"武將介紹[：:\s]*([\u{4e00}-\u{9fff}]{2,4})"),
    ("debut", r"([\u{4e00}-\u{9fff}]{2,4})\s*登場"),
];

/// Extracts a character name from the OCR channels of one folder.
pub struct NameExtractor<'a> {
    patterns: Vec<NamePattern>,
    date_prefix: Regex,
    config: &'a NameConfig,
}

impl<'a> NameExtractor<'a> {
    pub fn new(config: &'a NameConfig) -> Result<Self> {
        let patterns = PATTERNS
            .iter()
            .map(|&(label, pattern)| {
                Ok(NamePattern {
                    label,
                    regex: Regex::new(pattern)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            patterns,
            date_prefix: Regex::new(r"^\d{4}-\d{1,2}(-\d{1,2})?-?")?,
            config,
        })
    }

    /// Runs the full cascade: labeled patterns per channel in confidence
    /// order, then the phonetic fallback against the slug-derived target.
    pub fn extract(
        &self,
        channels: &ChannelText,
        folder_slug: &str,
        translit: &dyn Transliterator,
    ) -> Option<String> {
        let standard_head = first_third(&channels.standard);
        let sources = [
            ("highlighted", channels.highlighted.as_str()),
            ("bright", channels.bright.as_str()),
            ("standard", standard_head.as_str()),
            ("full", channels.full.as_str()),
        ];

        for (channel, text) in sources {
            if text.is_empty() {
                continue;
            }
            if let Some(name) = self.try_patterns(channel, text) {
                return Some(name);
            }
        }

        let target = self.target_token(folder_slug);
        if target.is_empty() {
            return None;
        }

        if let Some(name) = self.phonetic_search(&channels.full, &target, translit) {
            log(&format!(
                "Name matched phonetically against '{}': {}",
                target, name
            ));
            return Some(name);
        }

        None
    }

    /// Tries every labeled pattern against one channel. A candidate that
    /// fails validation is discarded and the cascade continues.
    fn try_patterns(&self, channel: &str, text: &str) -> Option<String> {
        for pattern in &self.patterns {
            if let Some(captures) = pattern.regex.captures(text) {
                let candidate = captures.get(1)?.as_str();
                if is_valid_name(candidate, self.config) {
                    log(&format!(
                        "Name matched by '{}' pattern in {} channel: {}",
                        pattern.label, channel, candidate
                    ));
                    return Some(candidate.to_string());
                }
            }
        }
        None
    }

    /// Derives the Latin target token from the folder slug: date prefix
    /// stripped, boilerplate words dropped, the rest lowercased and
    /// concatenated ("2025-08-13-Emperor-Rarity-Jiang-Wei" -> "jiangwei").
    fn target_token(&self, folder_slug: &str) -> String {
        let stripped = self.date_prefix.replace(folder_slug, "");
        stripped
            .split(['-', '_'])
            .map(|word| word.to_lowercase())
            .filter(|word| !word.is_empty() && !self.config.ignore_words.contains(word))
            .collect()
    }

    /// Enumerates every 2-4 ideograph window of every contiguous CJK run,
    /// in text order, and returns the first whose reading matches the
    /// target: exact equality, or target-inside-candidate when the target
    /// is long enough to rule out coincidence.
    fn phonetic_search(
        &self,
        text: &str,
        target: &str,
        translit: &dyn Transliterator,
    ) -> Option<String> {
        for run in cjk_runs(text) {
            for start in 0..run.len() {
                for len in 2..=4usize {
                    if start + len > run.len() {
                        break;
                    }
                    let candidate: String = run[start..start + len].iter().collect();
                    let Some(reading) = translit.transliterate(&candidate) else {
                        continue;
                    };
                    if reading == target || (target.len() > 3 && reading.contains(target)) {
                        return Some(candidate);
                    }
                }
            }
        }
        None
    }
}

/// Validates a cascade candidate: 2-4 ideographs, all CJK, not a known
/// game-vocabulary word, and free of stat/skill ideographs.
pub fn is_valid_name(candidate: &str, config: &NameConfig) -> bool {
    let len = candidate.chars().count();
    if !(2..=4).contains(&len) {
        return false;
    }
    if !candidate.chars().all(is_cjk) {
        return false;
    }
    if config.blacklist.iter().any(|word| word == candidate) {
        return false;
    }
    if candidate
        .chars()
        .any(|c| config.disallowed_chars.contains(c))
    {
        return false;
    }
    true
}

/// First ceil(n/3) lines of the channel. Headers sit at the top of body
/// scans; the tail is mostly skill text and OCR noise.
fn first_third(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    if lines.is_empty() {
        return String::new();
    }
    let keep = lines.len().div_ceil(3);
    lines[..keep].join("\n")
}

/// Maximal runs of contiguous CJK ideographs, in text order.
fn cjk_runs(text: &str) -> Vec<Vec<char>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();
    for c in text.chars() {
        if is_cjk(c) {
            current.push(c);
        } else if !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::translit::SyllableTable;

    fn channels(highlighted: &str, bright: &str, standard: &str, full: &str) -> ChannelText {
        ChannelText {
            highlighted: highlighted.to_string(),
            bright: bright.to_string(),
            standard: standard.to_string(),
            full: full.to_string(),
        }
    }

    fn extractor(config: &NameConfig) -> NameExtractor<'_> {
        NameExtractor::new(config).unwrap()
    }

    #[test]
    fn test_pattern_match_in_highlighted_channel() {
        let config = NameConfig::default();
        let table = SyllableTable::new();
        let ch = channels("新武將：姜維", "", "", "新武將：姜維");
        let name = extractor(&config).extract(&ch, "2025-08-13-Emperor-Rarity-Jiang-Wei", &table);
        assert_eq!(name.as_deref(), Some("姜維"));
    }

    #[test]
    fn test_highlighted_wins_over_full() {
        let config = NameConfig::default();
        let table = SyllableTable::new();
        let ch = channels("新武將：呂布", "", "", "新武將：姜維");
        let name = extractor(&config).extract(&ch, "slug", &table);
        assert_eq!(name.as_deref(), Some("呂布"));
    }

    #[test]
    fn test_debut_pattern() {
        let config = NameConfig::default();
        let table = SyllableTable::new();
        let ch = channels("", "趙雲 登場", "", "");
        let name = extractor(&config).extract(&ch, "slug", &table);
        assert_eq!(name.as_deref(), Some("趙雲"));
    }

    #[test]
    fn test_invalid_candidate_falls_through_to_phonetic() {
        let config = NameConfig::default();
        let table = SyllableTable::new();
        // Cascade hit contains 技/能 (disallowed), so the phonetic
        // fallback must find the real name instead
        let ch = channels(
            "新武將：技能強化",
            "",
            "",
            "新武將：技能強化\n本週 姜維 參戰",
        );
        let name = extractor(&config).extract(&ch, "2025-08-13-Emperor-Rarity-Jiang-Wei", &table);
        assert_eq!(name.as_deref(), Some("姜維"));
    }

    #[test]
    fn test_phonetic_substring_match() {
        let config = NameConfig::default();
        let table = SyllableTable::new();
        let ch = channels("", "", "", "神呂布 降臨");
        let name = extractor(&config).extract(&ch, "2024-05-01-New-Hero-Lu-Bu", &table);
        assert_eq!(name.as_deref(), Some("神呂布"));
    }

    #[test]
    fn test_short_target_requires_exact_match() {
        let config = NameConfig::default();
        let table = SyllableTable::new();
        // Target "wei" (3 letters): substring matches are rejected, and
        // no candidate reads exactly "wei"
        let ch = channels("", "", "", "魏延 姜維");
        let name = extractor(&config).extract(&ch, "2024-05-01-New-Hero-Wei", &table);
        assert_eq!(name, None);
    }

    #[test]
    fn test_no_match_returns_none() {
        let config = NameConfig::default();
        let table = SyllableTable::new();
        let ch = channels("", "", "", "balance notes only");
        let name = extractor(&config).extract(&ch, "2025-09-01-warrior-class-rework", &table);
        assert_eq!(name, None);
    }

    #[test]
    fn test_target_token_derivation() {
        let config = NameConfig::default();
        let ex = extractor(&config);
        assert_eq!(
            ex.target_token("2025-08-13-Emperor-Rarity-Jiang-Wei"),
            "jiangwei"
        );
        assert_eq!(ex.target_token("2024-05-New-Hero-Lu-Bu"), "lubu");
        assert_eq!(ex.target_token("2025-09-01-warrior-class-rework"), "classrework");
    }

    #[test]
    fn test_validator_rejects_bad_lengths() {
        let config = NameConfig::default();
        assert!(!is_valid_name("姜", &config));
        assert!(!is_valid_name("姜維姜維姜", &config));
        assert!(is_valid_name("姜維", &config));
    }

    #[test]
    fn test_validator_rejects_non_cjk() {
        let config = NameConfig::default();
        assert!(!is_valid_name("姜w", &config));
        assert!(!is_valid_name("ab", &config));
    }

    #[test]
    fn test_validator_rejects_blacklist_and_disallowed_chars() {
        let config = NameConfig::default();
        assert!(!is_valid_name("武將", &config));
        assert!(!is_valid_name("更新", &config));
        // Not blacklisted as a word, but contains 技
        assert!(!is_valid_name("技強化", &config));
    }

    #[test]
    fn test_first_third() {
        assert_eq!(first_third("a\nb\nc\nd\ne\nf"), "a\nb");
        assert_eq!(first_third("a"), "a");
        assert_eq!(first_third(""), "");
    }
}
