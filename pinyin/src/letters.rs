//! Built-in single-letter key maps.
//!
//! Every lowercase letter displays as itself in both cases, so a lone letter
//! always segments even when the dictionary has no entry for it. A few letters
//! also carry common interjection candidates.

use phf::phf_map;

/// Displays and candidates for one letter, `|`-separated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LetterMap {
    pub displays: &'static str,
    pub candidates: &'static str,
}

const fn plain(displays: &'static str) -> LetterMap {
    LetterMap {
        displays,
        candidates: "",
    }
}

static LETTER_MAPS: phf::Map<&'static str, LetterMap> = phf_map! {
    "a" => plain("a|A"),
    "b" => plain("b|B"),
    "c" => plain("c|C"),
    "d" => plain("d|D"),
    "e" => plain("e|E"),
    "f" => plain("f|F"),
    "g" => plain("g|G"),
    "h" => plain("h|H"),
    "i" => LetterMap { displays: "i|I", candidates: "喔|哦|噢" },
    "j" => plain("j|J"),
    "k" => plain("k|K"),
    "l" => plain("l|L"),
    "m" => plain("m|M"),
    "n" => plain("n|N"),
    "o" => plain("o|O"),
    "p" => plain("p|P"),
    "q" => plain("q|Q"),
    "r" => plain("r|R"),
    "s" => plain("s|S"),
    "t" => plain("t|T"),
    "u" => LetterMap { displays: "u|U", candidates: "有|要" },
    "v" => LetterMap { displays: "v|V", candidates: "吧|被" },
    "w" => plain("w|W"),
    "x" => plain("x|X"),
    "y" => plain("y|Y"),
    "z" => plain("z|Z"),
};

/// Built-in map for `key`, if it is a single lowercase letter.
pub fn letter_map(key: &str) -> Option<&'static LetterMap> {
    LETTER_MAPS.get(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_letter_has_a_map() {
        for ch in 'a'..='z' {
            let map = letter_map(&ch.to_string()).unwrap();
            assert_eq!(map.displays, format!("{ch}|{}", ch.to_ascii_uppercase()));
        }
        assert_eq!(letter_map("v").unwrap().candidates, "吧|被");
        assert!(letter_map("A").is_none());
        assert!(letter_map("ni").is_none());
    }
}
