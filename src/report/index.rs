use anyhow::{anyhow, Context, Result};
use chrono::{Local, NaiveDate};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

use crate::log;

/// Header line opening the managed index section.
pub const SECTION_HEADER: &str = "### Recent Announcements";

/// Sentinel that terminates the managed section. The merge replaces
/// everything between header and sentinel wholesale.
pub const SECTION_SENTINEL: &str = "📋";

static SECTION_RE: OnceLock<Regex> = OnceLock::new();
static BOLD_RE: OnceLock<Regex> = OnceLock::new();
static LAST_UPDATED_RE: OnceLock<Regex> = OnceLock::new();
static LOCAL_LINK_RE: OnceLock<Regex> = OnceLock::new();
static ROOT_LINK_RE: OnceLock<Regex> = OnceLock::new();

/// One bullet in an index section. Identity is the folder slug: at most
/// one entry per slug survives a merge, newest write wins.
#[derive(Clone, Debug)]
pub struct IndexEntry {
    pub folder: String,
    pub title: String,
    /// Long-form display date ("August 13, 2025" or "August 2025")
    pub date: String,
    pub category: String,
}

/// Which index document a bullet is formatted for; decides the relative
/// link shape and the slug-extraction pattern.
#[derive(Clone, Copy, Debug)]
pub enum IndexLocation {
    /// announcements/README.md: links are `<folder>/README.md`
    Announcements,
    /// Top-level README.md: links are `announcements/<folder>/README.md`
    Root,
}

impl IndexLocation {
    fn link(&self, folder: &str) -> String {
        match self {
            IndexLocation::Announcements => format!("{}/README.md", folder),
            IndexLocation::Root => format!("announcements/{}/README.md", folder),
        }
    }

    /// Pattern recovering the folder slug from an existing bullet line.
    fn slug_regex(&self) -> &'static Regex {
        match self {
            IndexLocation::Announcements => LOCAL_LINK_RE.get_or_init(|| {
                Regex::new(r"\(([^/)]+)/README\.md\)").expect("valid link pattern")
            }),
            IndexLocation::Root => ROOT_LINK_RE.get_or_init(|| {
                Regex::new(r"\(announcements/([^/)]+)/README\.md\)").expect("valid link pattern")
            }),
        }
    }
}

/// Formats one bullet line for the given index location.
fn format_entry(entry: &IndexEntry, location: IndexLocation) -> String {
    format!(
        "- **{}** - [{}]({}) - {}",
        short_date(&entry.date),
        entry.title,
        location.link(&entry.folder),
        entry.category
    )
}

/// Abbreviates a long-form display date for the compact bullet format.
/// Unrecognized strings pass through verbatim.
fn short_date(date: &str) -> String {
    if let Ok(parsed) = NaiveDate::parse_from_str(date, "%B %d, %Y") {
        return parsed.format("%b %d, %Y").to_string();
    }
    if let Ok(parsed) = parse_month_year(date) {
        return parsed.format("%b %Y").to_string();
    }
    date.to_string()
}

/// chrono cannot parse a month-resolution date without a day, so one is
/// injected before parsing.
fn parse_month_year(date: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(&format!("{} 1", date), "%B %Y %d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{} 1", date), "%b %Y %d"))
}

/// Date parsed from the first bold token of a bullet line; lines whose
/// date fails every accepted format sort to the earliest extreme.
fn parse_line_date(line: &str) -> NaiveDate {
    let bold = BOLD_RE.get_or_init(|| Regex::new(r"\*\*([^*]+)\*\*").expect("valid bold pattern"));
    let Some(captures) = bold.captures(line) else {
        return NaiveDate::MIN;
    };
    let date_str = captures[1].trim();

    for format in ["%b %d, %Y", "%B %d, %Y", "%Y-%m-%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(date_str, format) {
            return date;
        }
    }
    if let Ok(date) = parse_month_year(date_str) {
        return date;
    }
    NaiveDate::MIN
}

/// Merges new entries into an existing section body.
///
/// New entries are prepended, then the first occurrence of each folder
/// slug wins (the prepended entry is the more recent write). Lines
/// without a recognizable link are preserved verbatim and treated as
/// always-unique. The result is stably sorted by parsed date descending
/// and truncated to the cap.
fn merge_section(
    existing_body: &str,
    entries: &[IndexEntry],
    location: IndexLocation,
    cap: usize,
) -> String {
    let slug_re = location.slug_regex();

    let mut all_lines: Vec<String> = entries
        .iter()
        .map(|entry| format_entry(entry, location))
        .collect();
    all_lines.extend(
        existing_body
            .lines()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty()),
    );

    // First occurrence per slug wins; non-linking lines dedup by content
    let mut seen_slugs: Vec<String> = Vec::new();
    let mut unique: Vec<String> = Vec::new();
    for line in all_lines {
        match slug_re.captures(&line) {
            Some(captures) => {
                let slug = captures[1].to_string();
                if !seen_slugs.contains(&slug) {
                    seen_slugs.push(slug);
                    unique.push(line);
                }
            }
            None => {
                if !unique.contains(&line) {
                    unique.push(line);
                }
            }
        }
    }

    // Stable sort keeps the new-entry-first bias on equal dates
    let mut dated: Vec<(NaiveDate, String)> = unique
        .into_iter()
        .map(|line| (parse_line_date(&line), line))
        .collect();
    dated.sort_by(|a, b| b.0.cmp(&a.0));

    dated
        .into_iter()
        .take(cap)
        .map(|(_, line)| line)
        .collect::<Vec<_>>()
        .join("\n")
}

fn section_re() -> &'static Regex {
    SECTION_RE.get_or_init(|| {
        Regex::new(r"(?s)### Recent Announcements\n(.*?)\n📋").expect("valid section pattern")
    })
}

/// Checks that an index document exists and carries the managed section
/// markers, without modifying it. Lets the caller abort a batch before
/// any index is written.
pub fn verify_markers(path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read index document: {}", path.display()))?;
    if section_re().is_match(&content) {
        Ok(())
    } else {
        Err(anyhow!(
            "Index document {} is missing the expected '{}' section markers",
            path.display(),
            SECTION_HEADER
        ))
    }
}

/// Rewrites the managed section of one index document and refreshes its
/// "Last Updated" field.
///
/// Fatal if the document or its section markers are missing: partial
/// index corruption is worse than a failed run, so nothing is written in
/// that case.
pub fn update_index_file(
    path: &Path,
    entries: &[IndexEntry],
    location: IndexLocation,
    cap: usize,
) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read index document: {}", path.display()))?;

    let Some(captures) = section_re().captures(&content) else {
        return Err(anyhow!(
            "Index document {} is missing the expected '{}' section markers; refusing to write",
            path.display(),
            SECTION_HEADER
        ));
    };

    let whole = captures.get(0).expect("match exists");
    let body = captures.get(1).map_or("", |m| m.as_str());
    let merged = merge_section(body, entries, location, cap);

    let mut updated = String::with_capacity(content.len());
    updated.push_str(&content[..whole.start()]);
    updated.push_str(SECTION_HEADER);
    updated.push('\n');
    updated.push_str(&merged);
    updated.push('\n');
    updated.push_str(SECTION_SENTINEL);
    updated.push_str(&content[whole.end()..]);

    let last_updated = LAST_UPDATED_RE
        .get_or_init(|| Regex::new(r"\*\*Last Updated:\*\* [^\n]+").expect("valid field pattern"));
    let today = Local::now().format("%B %d, %Y").to_string();
    let updated = last_updated
        .replace_all(&updated, format!("**Last Updated:** {}", today))
        .into_owned();

    std::fs::write(path, updated)
        .with_context(|| format!("Failed to write index document: {}", path.display()))?;

    log(&format!(
        "Updated {} with {} new entries",
        path.display(),
        entries.len()
    ));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn entry(folder: &str, title: &str, date: &str) -> IndexEntry {
        IndexEntry {
            folder: folder.to_string(),
            title: title.to_string(),
            date: date.to_string(),
            category: "New Character Release".to_string(),
        }
    }

    fn index_doc(body: &str) -> String {
        format!(
            "# Announcements\n**Last Updated:** January 01, 2020\n\n\
             ### Recent Announcements\n{}\n📋 [Full archive](archive.md)\n",
            body
        )
    }

    #[test]
    fn test_format_entry_links() {
        let e = entry("2025-08-13-jiang-wei", "姜維介紹", "August 13, 2025");
        assert_eq!(
            format_entry(&e, IndexLocation::Announcements),
            "- **Aug 13, 2025** - [姜維介紹](2025-08-13-jiang-wei/README.md) - New Character Release"
        );
        assert!(format_entry(&e, IndexLocation::Root)
            .contains("(announcements/2025-08-13-jiang-wei/README.md)"));
    }

    #[test]
    fn test_short_date_month_only() {
        assert_eq!(short_date("August 2025"), "Aug 2025");
        assert_eq!(short_date("not a date"), "not a date");
    }

    #[test]
    fn test_merge_dedups_by_slug_keeping_new() {
        let existing =
            "- **Jan 01, 2025** - [Old Title](2025-01-01-x/README.md) - Event Announcement";
        let new = [entry("2025-01-01-x", "New Title", "January 01, 2025")];
        let merged = merge_section(existing, &new, IndexLocation::Announcements, 10);
        assert_eq!(merged.lines().count(), 1);
        assert!(merged.contains("New Title"));
        assert!(!merged.contains("Old Title"));
    }

    #[test]
    fn test_merge_sorts_descending_and_caps() {
        let existing = "\
- **Mar 01, 2025** - [March](2025-03-01-m/README.md) - Event Announcement
- **Jan 01, 2025** - [January](2025-01-01-j/README.md) - Event Announcement";
        let new = [entry("2025-02-01-f", "February", "February 01, 2025")];
        let merged = merge_section(existing, &new, IndexLocation::Announcements, 2);

        let lines: Vec<&str> = merged.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("March"));
        assert!(lines[1].contains("February"));

        let dates: Vec<NaiveDate> = lines.iter().map(|l| parse_line_date(l)).collect();
        assert!(dates.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_merge_preserves_unrecognized_lines() {
        let existing = "> manually curated note\n- **Feb 01, 2025** - [F](2025-02-01-f/README.md) - Event Announcement";
        let merged = merge_section(existing, &[], IndexLocation::Announcements, 10);
        assert!(merged.contains("manually curated note"));
    }

    #[test]
    fn test_unparsable_dates_sort_last() {
        let existing = "\
- **someday** - [Undated](undated/README.md) - Event Announcement
- **Jan 01, 2024** - [Dated](2024-01-01-d/README.md) - Event Announcement";
        let merged = merge_section(existing, &[], IndexLocation::Announcements, 10);
        let lines: Vec<&str> = merged.lines().collect();
        assert!(lines[0].contains("Dated"));
        assert!(lines[1].contains("Undated"));
    }

    #[test]
    fn test_update_index_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("README.md");
        std::fs::write(&path, index_doc("")).unwrap();

        let entries = [entry("2025-08-13-jiang-wei", "姜維介紹", "August 13, 2025")];
        update_index_file(&path, &entries, IndexLocation::Announcements, 10).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("- **Aug 13, 2025** - [姜維介紹]"));
        assert!(content.contains("📋 [Full archive](archive.md)"));
        assert!(!content.contains("January 01, 2020"));
        assert!(content.contains("**Last Updated:** "));
    }

    #[test]
    fn test_update_index_twice_does_not_duplicate() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("README.md");
        std::fs::write(&path, index_doc("")).unwrap();

        let entries = [entry("2025-08-13-jiang-wei", "姜維介紹", "August 13, 2025")];
        update_index_file(&path, &entries, IndexLocation::Announcements, 10).unwrap();
        update_index_file(&path, &entries, IndexLocation::Announcements, 10).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let count = content.matches("2025-08-13-jiang-wei/README.md").count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_missing_markers_is_fatal_and_writes_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("README.md");
        let original = "# A document without the managed section\n";
        std::fs::write(&path, original).unwrap();

        let entries = [entry("x", "X", "August 13, 2025")];
        let result = update_index_file(&path, &entries, IndexLocation::Announcements, 10);
        assert!(result.is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let dir = tempdir().unwrap();
        let result = update_index_file(
            &dir.path().join("absent.md"),
            &[],
            IndexLocation::Root,
            5,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_root_location_cap() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("README.md");
        std::fs::write(&path, index_doc("")).unwrap();

        let entries: Vec<IndexEntry> = (1..=8)
            .map(|d| {
                entry(
                    &format!("2025-06-{:02}-e{}", d, d),
                    &format!("Entry {}", d),
                    &format!("June {:02}, 2025", d),
                )
            })
            .collect();
        update_index_file(&path, &entries, IndexLocation::Root, 5).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let bullets = content
            .lines()
            .filter(|l| l.starts_with("- **"))
            .count();
        assert_eq!(bullets, 5);
        assert!(content.contains("Entry 8"));
        assert!(!content.contains("Entry 1]"));
    }
}
