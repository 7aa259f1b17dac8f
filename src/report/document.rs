use chrono::{Local, NaiveDate};
use regex::Regex;
use std::sync::OnceLock;

use crate::analysis::{Category, Classification, Skill};

/// Marker line prefix written into every generated README. It is read
/// back byte-for-byte as the reprocessing guard: documents without it are
/// treated as manually edited and never overwritten.
pub const AUTO_MARKER: &str = "*Auto-generated on ";

static DATE_PREFIX_RE: OnceLock<Regex> = OnceLock::new();
static FULL_DATE_RE: OnceLock<Regex> = OnceLock::new();
static MONTH_DATE_RE: OnceLock<Regex> = OnceLock::new();
static DOTTED_VERSION_RE: OnceLock<Regex> = OnceLock::new();
static BARE_VERSION_RE: OnceLock<Regex> = OnceLock::new();

/// A synthesized per-folder document.
pub struct GeneratedDocument {
    pub title: String,
    pub date: String,
    pub content: String,
}

/// Returns true when the content carries the auto-generation marker.
pub fn is_auto_generated(content: &str) -> bool {
    content.contains(AUTO_MARKER)
}

/// English rendering of the slug: date prefix stripped, separators
/// replaced with spaces, each word capitalized.
pub fn title_base(slug: &str) -> String {
    let date_prefix = DATE_PREFIX_RE
        .get_or_init(|| Regex::new(r"^\d{4}-\d{1,2}(-\d{1,2})?-?").expect("valid date prefix"));
    let stripped = date_prefix.replace(slug, "");
    stripped
        .split(['-', '_', ' '])
        .filter(|word| !word.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

/// Long-form display date from the slug's date prefix, falling back to
/// the processing date.
pub fn display_date(slug: &str) -> String {
    let full = FULL_DATE_RE
        .get_or_init(|| Regex::new(r"(\d{4})-(\d{1,2})-(\d{1,2})").expect("valid date pattern"));
    if let Some(c) = full.captures(slug) {
        let date = NaiveDate::from_ymd_opt(
            c[1].parse().unwrap_or(0),
            c[2].parse().unwrap_or(0),
            c[3].parse().unwrap_or(0),
        );
        if let Some(date) = date {
            return date.format("%B %d, %Y").to_string();
        }
    }

    let month = MONTH_DATE_RE
        .get_or_init(|| Regex::new(r"(\d{4})-(\d{1,2})").expect("valid month pattern"));
    if let Some(c) = month.captures(slug) {
        let date =
            NaiveDate::from_ymd_opt(c[1].parse().unwrap_or(0), c[2].parse().unwrap_or(0), 1);
        if let Some(date) = date {
            return date.format("%B %Y").to_string();
        }
    }

    Local::now().format("%B %d, %Y").to_string()
}

/// Recognized version token in the English slug rendering: a dotted
/// version like "V1.2" preferred, then the original bare digit form.
fn version_token(base: &str) -> Option<String> {
    let dotted = DOTTED_VERSION_RE
        .get_or_init(|| Regex::new(r"[vV]?\d+(?:\.\d+)+").expect("valid version pattern"));
    if let Some(m) = dotted.find(base) {
        return Some(m.as_str().to_string());
    }
    let bare =
        BARE_VERSION_RE.get_or_init(|| Regex::new(r"\d+[a-z]?").expect("valid version pattern"));
    bare.find(base).map(|m| m.as_str().to_string())
}

/// Derives the document title from slug, category and extracted name.
pub fn synthesize_title(slug: &str, category: Category, name: Option<&str>) -> String {
    let base = title_base(slug);
    let slug_lower = slug.to_lowercase();

    match category {
        Category::NewCharacterRelease => match name {
            Some(name) => format!("新武將介紹 - {} ({})", name, base),
            None => format!("新武將介紹 - {} (New Character Release)", base),
        },
        Category::BalanceUpdate => {
            if slug_lower.contains("warrior") && slug_lower.contains("class") {
                "Warrior Class Rework (戰士職業重做)".to_string()
            } else if slug_lower.contains("rework") {
                let stem = base
                    .split_whitespace()
                    .filter(|word| !word.eq_ignore_ascii_case("rework"))
                    .collect::<Vec<_>>()
                    .join(" ");
                format!("{} Rework ({}重做)", stem, stem)
            } else if let Some(version) = version_token(&base) {
                format!("Balance Update - {} (平衡更新)", version)
            } else {
                format!("Balance Update - {} (平衡更新)", base)
            }
        }
        _ => base,
    }
}

/// Composes the full per-folder README.
///
/// `image_names` are the gallery file names in filename order; `skills`
/// come from the normalized full channel. The content ends with the
/// auto-generation marker line.
pub fn render_document(
    slug: &str,
    image_names: &[String],
    classification: &Classification,
    name: Option<&str>,
    skills: &[Skill],
) -> GeneratedDocument {
    let category = classification.category;
    let title = synthesize_title(slug, category, name);
    let date = display_date(slug);
    let base = title_base(slug);

    let mut content = format!("# {}\n", title);
    content.push_str(&format!("**Date:** {}\n", date));
    content.push_str(&format!("**Type:** {}\n", category));

    match category {
        Category::BalanceUpdate => content.push_str("**Status:** Active\n"),
        Category::NewCharacterRelease => content.push_str("**Event:** Special Release\n"),
        _ => {}
    }

    content.push_str("\n## Announcement Images\n");
    for (i, image_name) in image_names.iter().enumerate() {
        let position = i + 1;
        let caption = match category {
            Category::NewCharacterRelease if position == 1 => "Main Announcement".to_string(),
            Category::NewCharacterRelease => format!("Character Introduction {}", position),
            Category::BalanceUpdate if position == 1 => "Main Announcement".to_string(),
            Category::BalanceUpdate => format!("Balance Update Image {}", position),
            _ => format!("Announcement Image {}", position),
        };
        content.push_str(&format!("![{}](images/{})\n", caption, image_name));
    }

    content.push_str("\n## Summary\n");
    content.push_str(&summary_body(category, slug, name.unwrap_or(&base), skills));

    content.push_str("\n## Notes\n");
    content.push_str("- Images automatically detected and processed\n");
    content.push_str(
        "- For detailed information, please refer to the original announcement images above\n",
    );
    content.push_str("\n---\n");
    content.push_str(&format!(
        "{}{}*\n",
        AUTO_MARKER,
        Local::now().format("%Y-%m-%d %H:%M:%S")
    ));

    GeneratedDocument {
        title,
        date,
        content,
    }
}

fn summary_body(category: Category, slug: &str, display_name: &str, skills: &[Skill]) -> String {
    match category {
        Category::NewCharacterRelease => {
            if skills.len() >= 2 {
                let mut body = format!("- New character: {}\n", display_name);
                body.push_str("- Event type: Special Character Release\n");
                for skill in skills {
                    if skill.description.chars().count() > 5 {
                        body.push_str(&format!(
                            "- 技能{}【{}】：{}\n",
                            skill.number, skill.name, skill.description
                        ));
                    }
                }
                body
            } else {
                "New character release with unique abilities and skills.\n\n\
                 For detailed skill information, please refer to the announcement images above.\n"
                    .to_string()
            }
        }
        Category::BalanceUpdate => {
            if slug.to_lowercase().contains("warrior") {
                "This update focuses on warrior class adjustments.\n".to_string()
            } else if !skills.is_empty() {
                let mut body = "Character balance adjustments including:\n\n".to_string();
                for skill in skills {
                    let preview: String = skill.description.chars().take(100).collect();
                    body.push_str(&format!(
                        "**技能{} Changes:** {}...\n\n",
                        skill.number, preview
                    ));
                }
                body
            } else {
                "Balance update with character skill and parameter adjustments.\n".to_string()
            }
        }
        _ => "General game announcement with important updates and information.\n".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::CategoryScores;

    fn classification(category: Category) -> Classification {
        Classification {
            category,
            scores: CategoryScores::default(),
        }
    }

    fn skill(number: u8, name: &str, description: &str) -> Skill {
        Skill {
            number,
            name: name.to_string(),
            description: description.to_string(),
        }
    }

    #[test]
    fn test_title_base() {
        assert_eq!(
            title_base("2025-08-13-Emperor-Rarity-Jiang-Wei"),
            "Emperor Rarity Jiang Wei"
        );
        assert_eq!(title_base("2025-09-warrior_class_rework"), "Warrior Class Rework");
        assert_eq!(title_base("no-date-slug"), "No Date Slug");
    }

    #[test]
    fn test_display_date_formats() {
        assert_eq!(display_date("2025-08-13-something"), "August 13, 2025");
        assert_eq!(display_date("2025-08-news"), "August 2025");
        // No prefix: falls back to today, which always parses long-form
        let today = display_date("undated-slug");
        assert!(today.contains(","));
    }

    #[test]
    fn test_character_title_with_name() {
        let title = synthesize_title(
            "2025-08-13-Emperor-Rarity-Jiang-Wei",
            Category::NewCharacterRelease,
            Some("姜維"),
        );
        assert!(title.contains("姜維"));
        assert!(title.contains("Jiang Wei"));
    }

    #[test]
    fn test_character_title_without_name_carries_marker() {
        let title = synthesize_title(
            "2025-08-13-Emperor-Rarity-Jiang-Wei",
            Category::NewCharacterRelease,
            None,
        );
        assert!(title.contains("New Character Release"));
        assert!(title.contains("Jiang Wei"));
    }

    #[test]
    fn test_warrior_class_rework_fixed_title() {
        let title = synthesize_title(
            "2025-09-01-warrior-class-rework",
            Category::BalanceUpdate,
            None,
        );
        assert_eq!(title, "Warrior Class Rework (戰士職業重做)");
    }

    #[test]
    fn test_generic_rework_title() {
        let title = synthesize_title("2025-09-01-archer-rework", Category::BalanceUpdate, None);
        assert_eq!(title, "Archer Rework (Archer重做)");
    }

    #[test]
    fn test_balance_title_prefers_version() {
        let title = synthesize_title("2025-07-v1.2-balance-patch", Category::BalanceUpdate, None);
        assert_eq!(title, "Balance Update - V1.2 (平衡更新)");
    }

    #[test]
    fn test_event_title_is_plain_base() {
        let title = synthesize_title(
            "2025-10-01-anniversary-festival",
            Category::EventAnnouncement,
            None,
        );
        assert_eq!(title, "Anniversary Festival");
    }

    #[test]
    fn test_document_structure() {
        let doc = render_document(
            "2025-08-13-Emperor-Rarity-Jiang-Wei",
            &["01.jpg".to_string(), "02.png".to_string()],
            &classification(Category::NewCharacterRelease),
            Some("姜維"),
            &[
                skill(1, "天水麒麟", "對敵方造成範圍傷害並減速"),
                skill(2, "智勇雙全", "提升全體友軍攻擊力持續十秒"),
            ],
        );

        assert!(doc.content.starts_with("# 新武將介紹 - 姜維"));
        assert!(doc.content.contains("**Date:** August 13, 2025"));
        assert!(doc.content.contains("**Type:** New Character Release"));
        assert!(doc.content.contains("**Event:** Special Release"));
        assert!(doc.content.contains("![Main Announcement](images/01.jpg)"));
        assert!(doc.content.contains("![Character Introduction 2](images/02.png)"));
        assert!(doc.content.contains("- New character: 姜維"));
        assert!(doc.content.contains("- 技能1【天水麒麟】"));
        assert!(doc.content.contains("- 技能2【智勇雙全】"));
        assert!(is_auto_generated(&doc.content));
    }

    #[test]
    fn test_character_document_few_skills_generic_fallback() {
        let doc = render_document(
            "2025-08-13-New-Hero",
            &[],
            &classification(Category::NewCharacterRelease),
            None,
            &[skill(1, "唯一", "只有一個技能的描述")],
        );
        assert!(doc.content.contains("New character release with unique abilities"));
        assert!(!doc.content.contains("- 技能1"));
    }

    #[test]
    fn test_warrior_balance_body() {
        let doc = render_document(
            "2025-09-01-warrior-class-rework",
            &["a.jpg".to_string()],
            &classification(Category::BalanceUpdate),
            None,
            &[],
        );
        assert!(doc.content.contains("warrior class adjustments"));
        assert!(doc.content.contains("**Status:** Active"));
        assert!(doc.content.contains("![Main Announcement](images/a.jpg)"));
    }

    #[test]
    fn test_balance_body_truncates_descriptions() {
        let long_description = "很".repeat(150);
        let doc = render_document(
            "2025-09-01-general-adjustment",
            &[],
            &classification(Category::BalanceUpdate),
            None,
            &[skill(2, "調整", &long_description)],
        );
        let rendered_line = doc
            .content
            .lines()
            .find(|l| l.starts_with("**技能2 Changes:**"))
            .unwrap();
        assert!(rendered_line.ends_with("..."));
        assert!(rendered_line.chars().filter(|&c| c == '很').count() == 100);
    }

    #[test]
    fn test_marker_round_trip() {
        assert!(is_auto_generated("stuff\n*Auto-generated on 2025-01-01 00:00:00*\n"));
        assert!(!is_auto_generated("# Manually written README\n"));
    }
}
