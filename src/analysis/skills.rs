use regex::Regex;
use std::sync::OnceLock;

static SKILL_HEADER_RE: OnceLock<Regex> = OnceLock::new();
static SKILL_MARKER_RE: OnceLock<Regex> = OnceLock::new();

/// One extracted skill block. Numbers are not required to be unique or
/// monotonic: OCR can repeat a header, and downstream consumers render
/// duplicates as repeated lines rather than merging them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Skill {
    pub number: u8,
    pub name: String,
    pub description: String,
}

/// Description lines shorter than this are OCR fragments, not content.
const MIN_DESCRIPTION_LINE: usize = 6;

/// Follow-up lines collected after a skill header.
const MAX_FOLLOWUP_LINES: usize = 3;

/// Scans normalized text for "skill N" markers (either script) with an
/// optional inline bracketed name, collecting up to three follow-up lines
/// per marker. Collection stops early at a blank line or the next marker.
pub fn extract_skills(text: &str) -> Vec<Skill> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let header_re = SKILL_HEADER_RE.get_or_init(|| {
        Regex::new(r"(?:技能\s*([1-4])[：:【]?([^】\n]*)|[Ss]kill\s*([1-4])[：:]?([^\n]*))")
            .expect("valid skill header pattern")
    });

    let lines: Vec<&str> = text.lines().collect();
    let mut skills = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        let Some(captures) = header_re.captures(line) else {
            continue;
        };

        let (number, raw_name) = if let Some(m) = captures.get(1) {
            (m.as_str(), captures.get(2).map_or("", |m| m.as_str()))
        } else {
            (
                captures.get(3).map_or("", |m| m.as_str()),
                captures.get(4).map_or("", |m| m.as_str()),
            )
        };
        let Ok(number) = number.parse::<u8>() else {
            continue;
        };
        let name = raw_name.trim_end_matches('】').trim().to_string();

        let mut description_lines: Vec<&str> = Vec::new();
        if !name.is_empty() {
            description_lines.push(&name);
        }

        for next_line in lines.iter().skip(i + 1).take(MAX_FOLLOWUP_LINES) {
            let next_line = next_line.trim();
            if next_line.is_empty() || contains_skill_marker(next_line) {
                break;
            }
            if next_line.chars().count() >= MIN_DESCRIPTION_LINE {
                description_lines.push(next_line);
            }
        }

        if !description_lines.is_empty() {
            skills.push(Skill {
                number,
                name: name.clone(),
                description: description_lines.join(" "),
            });
        }
    }

    skills
}

fn contains_skill_marker(line: &str) -> bool {
    let marker_re = SKILL_MARKER_RE
        .get_or_init(|| Regex::new(r"(?:技能|[Ss]kill)\s*[1-4]").expect("valid marker pattern"));
    marker_re.is_match(line)
}
