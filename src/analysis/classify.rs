use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

use crate::config::ClassifyConfig;

static VERSION_RE: OnceLock<Regex> = OnceLock::new();
static SKILL_MARKER_RE: OnceLock<Regex> = OnceLock::new();

/// Semantic announcement category.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Category {
    NewCharacterRelease,
    BalanceUpdate,
    EventAnnouncement,
    Unclassified,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Category::NewCharacterRelease => "New Character Release",
            Category::BalanceUpdate => "Balance Update",
            Category::EventAnnouncement => "Event Announcement",
            Category::Unclassified => "Unknown - Requires Manual Review",
        };
        write!(f, "{}", label)
    }
}

/// Score vector behind a classification decision.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CategoryScores {
    pub character: u32,
    pub balance: u32,
    pub event: u32,
}

/// Category plus the scores that produced it; embedded in the generated
/// document's front matter, never persisted on its own.
#[derive(Clone, Debug)]
pub struct Classification {
    pub category: Category,
    pub scores: CategoryScores,
}

/// Scores normalized OCR text and folder slug against the three keyword
/// taxonomies and picks a category.
///
/// Slug keyword hits weigh 3 (folder names are curated), text hits weigh 2
/// (OCR is noisy). Structural bonuses: a version-like token in the slug
/// leans balance; many distinct skill markers lean balance, a single one
/// leans character (a lone highlighted skill usually accompanies a
/// new-character teaser).
///
/// Decision is deterministic: ties at the maximum resolve by fixed
/// priority character > balance > event, independent of keyword-table
/// iteration order. A winning score below `min_score` means the
/// announcement needs manual review.
pub fn classify(text: &str, folder_slug: &str, config: &ClassifyConfig) -> Classification {
    let slug_lower = folder_slug.to_lowercase();
    let text_lower = text.to_lowercase();

    let mut scores = CategoryScores {
        character: keyword_score(&config.character_keywords, &slug_lower, &text_lower),
        balance: keyword_score(&config.balance_keywords, &slug_lower, &text_lower),
        event: keyword_score(&config.event_keywords, &slug_lower, &text_lower),
    };

    // Version-like token in the slug (v1.2, 3.5) points at a patch
    let version_re =
        VERSION_RE.get_or_init(|| Regex::new(r"v?\d+\.\d+").expect("valid version pattern"));
    if version_re.is_match(&slug_lower) {
        scores.balance += 2;
    }

    match distinct_skill_markers(text) {
        1 => scores.character += 1,
        n if n >= 3 => scores.balance += 2,
        _ => {}
    }

    let max = scores.character.max(scores.balance).max(scores.event);
    let category = if max < config.min_score {
        Category::Unclassified
    } else if scores.character == max {
        Category::NewCharacterRelease
    } else if scores.balance == max {
        Category::BalanceUpdate
    } else {
        Category::EventAnnouncement
    };

    Classification { category, scores }
}

fn keyword_score(keywords: &[String], slug_lower: &str, text_lower: &str) -> u32 {
    let mut score = 0;
    for keyword in keywords {
        if slug_lower.contains(keyword.as_str()) {
            score += 3;
        }
        if text_lower.contains(keyword.as_str()) {
            score += 2;
        }
    }
    score
}

/// Counts distinct "skill N" slot markers (either script) in the text.
fn distinct_skill_markers(text: &str) -> usize {
    let marker_re = SKILL_MARKER_RE
        .get_or_init(|| Regex::new(r"(?:技能|[Ss]kill)\s*([1-4])").expect("valid marker pattern"));
    let slots: HashSet<&str> = marker_re
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .collect();
    slots.len()
}
