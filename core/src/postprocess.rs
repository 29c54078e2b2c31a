//! Candidate post-processing shared by all scripts.
//!
//! `dedup_and_match_case` drops later candidates whose lower-cased value was
//! already seen and makes each survivor's capitalisation follow its code:
//! an all-uppercase code longer than one character upper-cases the whole
//! value, otherwise every uppercase position in the code upper-cases the
//! value's character at the same position.

use crate::candidate::Word;
use ahash::AHashSet;

/// Dedup `words` in place (first occurrence wins) and fix up case.
pub fn dedup_and_match_case(words: &mut Vec<Word>) {
    let mut seen: AHashSet<String> = AHashSet::with_capacity(words.len());
    words.retain_mut(|word| {
        if !seen.insert(word.value.to_lowercase()) {
            return false;
        }
        word.value = match_case(&word.code, &word.value);
        true
    });
}

/// Capitalise `value` after the pattern of `code`.
pub fn match_case(code: &str, value: &str) -> String {
    if code.chars().count() > 1 && code.to_uppercase() == code {
        return value.to_uppercase();
    }
    let upper_at: Vec<bool> = code.chars().map(char::is_uppercase).collect();
    value
        .chars()
        .enumerate()
        .flat_map(|(i, c)| {
            let upper = upper_at.get(i).copied().unwrap_or(false);
            CaseIter::new(c, upper)
        })
        .collect()
}

enum CaseIter {
    Same(Option<char>),
    Upper(std::char::ToUppercase),
}

impl CaseIter {
    fn new(c: char, upper: bool) -> Self {
        if upper {
            CaseIter::Upper(c.to_uppercase())
        } else {
            CaseIter::Same(Some(c))
        }
    }
}

impl Iterator for CaseIter {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        match self {
            CaseIter::Same(c) => c.take(),
            CaseIter::Upper(it) => it.next(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(words: &[Word]) -> Vec<&str> {
        words.iter().map(|w| w.value.as_str()).collect()
    }

    #[test]
    fn later_duplicates_are_dropped_ignoring_case() {
        let mut words = vec![
            Word::new(1, "he", "hello"),
            Word::new(1, "he", "Hello"),
            Word::new(1, "he", "help"),
            Word::new(1, "h", "HELLO"),
        ];
        dedup_and_match_case(&mut words);
        assert_eq!(values(&words), vec!["hello", "help"]);
    }

    #[test]
    fn uppercase_code_uppercases_value() {
        assert_eq!(match_case("HE", "hello"), "HELLO");
        assert_eq!(match_case("He", "hello"), "Hello");
        assert_eq!(match_case("H", "hello"), "Hello");
        assert_eq!(match_case("hE", "hello"), "hEllo");
        assert_eq!(match_case("NIHAO", "你好"), "你好");
        assert_eq!(match_case("abc", "ab"), "ab");
    }

    #[test]
    fn digits_only_code_counts_as_uppercase() {
        // "14" == "14".to_uppercase(), value case is still untouched for CJK
        assert_eq!(match_case("14", "的"), "的");
    }
}
