use std::collections::HashMap;

/// Syllable transliteration for logographic characters.
///
/// The name extractor compares slug-derived Latin tokens against OCR
/// candidates through this seam; tests inject small deterministic tables.
pub trait Transliterator {
    /// Latin syllable for a single ideograph, if known.
    fn syllable(&self, ch: char) -> Option<&str>;

    /// Concatenated syllables for a candidate word, with no separators.
    /// Returns None when any ideograph is unknown: a partial reading
    /// cannot be compared against the target token.
    fn transliterate(&self, word: &str) -> Option<String> {
        let mut out = String::new();
        for ch in word.chars() {
            out.push_str(self.syllable(ch)?);
        }
        Some(out)
    }
}

/// Readings for ideographs that appear in the game's character names and
/// announcement headers. Not a general transliteration system; unknown
/// characters simply never match.
const READINGS: &[(char, &str)] = &[
    ('姜', "jiang"),
    ('維', "wei"),
    ('呂', "lu"),
    ('布', "bu"),
    ('趙', "zhao"),
    ('雲', "yun"),
    ('關', "guan"),
    ('羽', "yu"),
    ('張', "zhang"),
    ('飛', "fei"),
    ('遼', "liao"),
    ('曹', "cao"),
    ('操', "cao"),
    ('劉', "liu"),
    ('備', "bei"),
    ('孫', "sun"),
    ('權', "quan"),
    ('策', "ce"),
    ('堅', "jian"),
    ('諸', "zhu"),
    ('葛', "ge"),
    ('亮', "liang"),
    ('司', "si"),
    ('馬', "ma"),
    ('懿', "yi"),
    ('周', "zhou"),
    ('瑜', "yu"),
    ('黃', "huang"),
    ('忠', "zhong"),
    ('蓋', "gai"),
    ('魏', "wei"),
    ('延', "yan"),
    ('典', "dian"),
    ('韋', "wei"),
    ('許', "xu"),
    ('褚', "chu"),
    ('夏', "xia"),
    ('侯', "hou"),
    ('惇', "dun"),
    ('淵', "yuan"),
    ('郭', "guo"),
    ('嘉', "jia"),
    ('賈', "jia"),
    ('詡', "xu"),
    ('龐', "pang"),
    ('統', "tong"),
    ('德', "de"),
    ('徐', "xu"),
    ('庶', "shu"),
    ('晃', "huang"),
    ('甘', "gan"),
    ('寧', "ning"),
    ('太', "tai"),
    ('史', "shi"),
    ('慈', "ci"),
    ('陸', "lu"),
    ('遜', "xun"),
    ('凌', "ling"),
    ('董', "dong"),
    ('卓', "zhuo"),
    ('袁', "yuan"),
    ('紹', "shao"),
    ('術', "shu"),
    ('貂', "diao"),
    ('蟬', "chan"),
    ('嚴', "yan"),
    ('顏', "yan"),
    ('良', "liang"),
    ('文', "wen"),
    ('醜', "chou"),
    ('華', "hua"),
    ('佗', "tuo"),
    ('雄', "xiong"),
    ('神', "shen"),
    ('王', "wang"),
    ('陳', "chen"),
    ('宮', "gong"),
    ('高', "gao"),
    ('順', "shun"),
    ('姬', "ji"),
    ('小', "xiao"),
    ('大', "da"),
    ('喬', "qiao"),
    ('魯', "lu"),
    ('肅', "su"),
    ('法', "fa"),
    ('正', "zheng"),
    ('超', "chao"),
    ('岱', "dai"),
    ('龍', "long"),
    ('鳳', "feng"),
    ('月', "yue"),
    ('英', "ying"),
    ('兀', "wu"),
    ('突', "tu"),
    ('骨', "gu"),
    ('孟', "meng"),
    ('獲', "huo"),
    ('祝', "zhu"),
    ('融', "rong"),
    ('姚', "yao"),
    ('伯', "bo"),
    ('約', "yue"),
];

/// Fixed-table transliterator built from [`READINGS`].
pub struct SyllableTable {
    map: HashMap<char, &'static str>,
}

impl SyllableTable {
    pub fn new() -> Self {
        Self {
            map: READINGS.iter().copied().collect(),
        }
    }
}

impl Default for SyllableTable {
    fn default() -> Self {
        Self::new()
    }
}

impl Transliterator for SyllableTable {
    fn syllable(&self, ch: char) -> Option<&str> {
        self.map.get(&ch).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_word() {
        let table = SyllableTable::new();
        assert_eq!(table.transliterate("姜維").as_deref(), Some("jiangwei"));
        assert_eq!(table.transliterate("呂布").as_deref(), Some("lubu"));
        assert_eq!(
            table.transliterate("諸葛亮").as_deref(),
            Some("zhugeliang")
        );
    }

    #[test]
    fn test_unknown_character_yields_none() {
        let table = SyllableTable::new();
        // 齉 is far outside the name vocabulary
        assert_eq!(table.transliterate("姜齉"), None);
    }

    #[test]
    fn test_empty_word_is_empty_reading() {
        let table = SyllableTable::new();
        assert_eq!(table.transliterate("").as_deref(), Some(""));
    }
}
