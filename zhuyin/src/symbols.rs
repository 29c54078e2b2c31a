//! Zhuyin symbol codes.
//!
//! Each symbol maps to a two-character code: initials `1x`, finals `2x`,
//! medials `3x`, tones `4x`. The first tone `ˉ` (`44`) is never stored in
//! the dictionaries.

use phf::phf_map;

pub const FIRST_TONE: char = 'ˉ';
pub const FIRST_TONE_CODE: &str = "44";

static SYMBOL_CODES: phf::Map<char, &'static str> = phf_map! {
    'ㄅ' => "10", 'ㄆ' => "11", 'ㄇ' => "12", 'ㄈ' => "13", 'ㄉ' => "14",
    'ㄊ' => "15", 'ㄋ' => "16", 'ㄌ' => "17", 'ㄍ' => "18", 'ㄎ' => "19",
    'ㄏ' => "1A", 'ㄐ' => "1B", 'ㄑ' => "1C", 'ㄒ' => "1D", 'ㄓ' => "1E",
    'ㄔ' => "1F", 'ㄕ' => "1G", 'ㄖ' => "1H", 'ㄗ' => "1I", 'ㄘ' => "1J",
    'ㄙ' => "1K",
    'ㄚ' => "20", 'ㄛ' => "21", 'ㄜ' => "22", 'ㄝ' => "23", 'ㄞ' => "24",
    'ㄟ' => "25", 'ㄠ' => "26", 'ㄡ' => "27", 'ㄢ' => "28", 'ㄣ' => "29",
    'ㄤ' => "2A", 'ㄥ' => "2B", 'ㄦ' => "2C",
    'ㄧ' => "30", 'ㄨ' => "31", 'ㄩ' => "32",
    '˙' => "40", 'ˊ' => "41", 'ˇ' => "42", 'ˋ' => "43", 'ˉ' => "44",
};

static CODE_SYMBOLS: phf::Map<&'static str, char> = phf_map! {
    "10" => 'ㄅ', "11" => 'ㄆ', "12" => 'ㄇ', "13" => 'ㄈ', "14" => 'ㄉ',
    "15" => 'ㄊ', "16" => 'ㄋ', "17" => 'ㄌ', "18" => 'ㄍ', "19" => 'ㄎ',
    "1A" => 'ㄏ', "1B" => 'ㄐ', "1C" => 'ㄑ', "1D" => 'ㄒ', "1E" => 'ㄓ',
    "1F" => 'ㄔ', "1G" => 'ㄕ', "1H" => 'ㄖ', "1I" => 'ㄗ', "1J" => 'ㄘ',
    "1K" => 'ㄙ',
    "20" => 'ㄚ', "21" => 'ㄛ', "22" => 'ㄜ', "23" => 'ㄝ', "24" => 'ㄞ',
    "25" => 'ㄟ', "26" => 'ㄠ', "27" => 'ㄡ', "28" => 'ㄢ', "29" => 'ㄣ',
    "2A" => 'ㄤ', "2B" => 'ㄥ', "2C" => 'ㄦ',
    "30" => 'ㄧ', "31" => 'ㄨ', "32" => 'ㄩ',
    "40" => '˙', "41" => 'ˊ', "42" => 'ˇ', "43" => 'ˋ', "44" => 'ˉ',
};

pub fn is_zhuyin(c: char) -> bool {
    SYMBOL_CODES.contains_key(&c)
}

pub fn symbol_code(c: char) -> Option<&'static str> {
    SYMBOL_CODES.get(&c).copied()
}

/// Code for every Zhuyin symbol in `text`; other characters are skipped.
pub fn transcode(text: &str) -> String {
    text.chars().filter_map(symbol_code).collect()
}

/// Symbols for `code`, two characters at a time. Unknown pairs and a
/// trailing odd character are skipped.
pub fn decode(code: &str) -> String {
    let chars: Vec<char> = code.chars().collect();
    chars
        .chunks_exact(2)
        .filter_map(|pair| {
            let pair: String = pair.iter().collect();
            CODE_SYMBOLS.get(pair.as_str()).copied()
        })
        .collect()
}

/// True when the last symbol of `code` is a tone other than the first tone.
pub fn ends_with_marked_tone(code: &str) -> bool {
    let chars: Vec<char> = code.chars().collect();
    match chars.as_slice() {
        [.., '4', t] => *t != '4',
        _ => false,
    }
}

/// Remove every first-tone code sitting on a symbol boundary.
pub fn strip_first_tone(code: &str) -> String {
    let chars: Vec<char> = code.chars().collect();
    chars
        .chunks(2)
        .filter(|pair| *pair != ['4', '4'])
        .flatten()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcode_and_decode() {
        assert_eq!(transcode("ㄋㄧˇ"), "163042");
        assert_eq!(transcode("ㄏㄠ,"), "1A26");
        assert_eq!(decode("1A26"), "ㄏㄠ");
        assert_eq!(decode("1A2"), "ㄏ");
        assert_eq!(decode("zz1A"), "ㄏ");
    }

    #[test]
    fn tone_handling() {
        assert!(ends_with_marked_tone("163042"));
        assert!(!ends_with_marked_tone("1220"));
        assert!(!ends_with_marked_tone("122044"));
        assert_eq!(strip_first_tone("122044"), "1220");
        // "1443" is ㄉˋ, the inner "44" is not a first tone.
        assert_eq!(strip_first_tone("1443"), "1443");
        assert_eq!(strip_first_tone("44"), "");
    }

    #[test]
    fn symbol_range() {
        assert!(('ㄅ'..='ㄩ').all(is_zhuyin));
        assert!(is_zhuyin(FIRST_TONE));
        assert!(!is_zhuyin('a'));
    }
}
