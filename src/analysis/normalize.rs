use super::is_cjk;

/// Normalized text keeps at most this many lines; everything past the cap
/// is OCR tail noise.
const MAX_LINES: usize = 20;

/// Lines shorter than this are dropped (2 still admits short CJK names).
const MIN_LINE_LEN: usize = 2;

/// Known glyph-confusion corrections, applied in order as literal string
/// replacements. Longer look-alikes come first so 技能III is not eaten by
/// the 技能I rule.
const CORRECTIONS: &[(&str, &str)] = &[
    ("技能 4", "技能4"),
    ("技能IV", "技能4"),
    ("技能lV", "技能4"),
    ("技能 3", "技能3"),
    ("技能III", "技能3"),
    ("技能lll", "技能3"),
    ("技能 2", "技能2"),
    ("技能II", "技能2"),
    ("技能ll", "技能2"),
    ("技能 1", "技能1"),
    ("技能I", "技能1"),
    ("技能l", "技能1"),
    ("傷寮", "傷害"),
    ("伤寮", "傷害"),
    ("伤害", "傷害"),
    ("攻击", "攻擊"),
    ("攻撃", "攻擊"),
    ("对象", "對象"),
    ("對像", "對象"),
    ("ネ少", "秒"),
    ("道成", "造成"),
    ("发动", "發動"),
    ("發勤", "發動"),
    ("获得", "獲得"),
    ("獲徳", "獲得"),
    ("堌加", "增加"),
    ("减少", "減少"),
    ("％", "%"),
];

/// Cleans raw OCR output. Idempotent: normalize(normalize(x)) == normalize(x).
///
/// Order matters: whitespace collapsing first (the correction table keys
/// assume single spaces), then corrections, then line filtering, then the
/// line cap.
pub fn normalize(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    let collapsed = collapse_whitespace(text);

    let mut corrected = collapsed;
    for (wrong, right) in CORRECTIONS {
        if corrected.contains(wrong) {
            corrected = corrected.replace(wrong, right);
        }
    }

    corrected
        .lines()
        .filter(|line| keep_line(line))
        .take(MAX_LINES)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Collapses runs of spaces/tabs to single spaces and runs of blank lines
/// to single blank lines; trims each line.
fn collapse_whitespace(text: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut last_blank = false;

    for raw_line in text.lines() {
        let line = raw_line.split_whitespace().collect::<Vec<_>>().join(" ");
        if line.is_empty() {
            if !last_blank && !lines.is_empty() {
                lines.push(String::new());
            }
            last_blank = true;
        } else {
            lines.push(line);
            last_blank = false;
        }
    }

    // No trailing blank line
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }

    lines.join("\n")
}

/// Line filter: a line containing any CJK ideograph always passes;
/// otherwise it must meet the minimum length and stay below the
/// symbol-ratio limit.
fn keep_line(line: &str) -> bool {
    if line.chars().any(is_cjk) {
        return true;
    }

    let len = line.chars().count();
    if len < MIN_LINE_LEN {
        return false;
    }

    let symbols = line
        .chars()
        .filter(|&c| !c.is_alphanumeric() && !c.is_whitespace() && c != '_')
        .count();

    // Drop when punctuation/symbols exceed half the line
    symbols * 2 <= len
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(normalize("hello    world"), "hello world");
        assert_eq!(normalize("one\tline\t here"), "one line here");
    }

    #[test]
    fn test_corrects_skill_slot_confusions() {
        assert_eq!(normalize("技能I 造成傷害"), "技能1 造成傷害");
        assert_eq!(normalize("技能II 攻撃增加"), "技能2 攻擊增加");
        assert_eq!(normalize("技能III"), "技能3");
        assert_eq!(normalize("技能 4"), "技能4");
    }

    #[test]
    fn test_corrects_glyph_confusions() {
        assert_eq!(normalize("道成伤害"), "造成傷害");
        assert_eq!(normalize("發勤技能"), "發動技能");
        assert_eq!(normalize("增加30％"), "增加30%");
    }

    #[test]
    fn test_drops_short_lines() {
        assert_eq!(normalize("a\nreal line\nb"), "real line");
    }

    #[test]
    fn test_drops_symbol_noise_lines() {
        // Over half symbols, no CJK
        assert_eq!(normalize("~~~|||~~~\nsome text"), "some text");
        // Symbol-heavy but contains CJK: kept
        assert_eq!(normalize("~~姜維~~|"), "~~姜維~~|");
    }

    #[test]
    fn test_cjk_bypasses_length_filter() {
        assert_eq!(normalize("秒"), "秒");
    }

    #[test]
    fn test_caps_line_count() {
        let text = (0..40)
            .map(|i| format!("line number {}", i))
            .collect::<Vec<_>>()
            .join("\n");
        let result = normalize(&text);
        assert_eq!(result.lines().count(), 20);
        assert!(result.lines().last().unwrap().contains("19"));
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "",
            "   ",
            "技能I 造成傷害\n\n\n技能II【風襲】\n~~~~~\nplain body text",
            "hello    world\n秒",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", input);
        }
    }
}
