//! Pinyin candidate cleanup.
//!
//! Runs before the generic dedup. Latin fallbacks produced by the built-in
//! letter maps are pushed behind the Chinese candidates, and trailing Latin
//! letters left over from an unmatched tail are cut off mixed candidates.

use softkey_core::{syllable_count, Word};

fn is_lower_latin(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_lowercase())
}

fn is_single_upper_latin(s: &str) -> bool {
    let mut chars = s.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_ascii_uppercase())
}

fn strip_lower_tail(s: &str) -> &str {
    s.trim_end_matches(|c: char| c.is_ascii_lowercase()).trim()
}

fn drop_repeated_first(words: &mut Vec<Word>) {
    if words.len() > 1 && words[0].value == words[1].value {
        words.remove(0);
    }
}

/// Reorder and trim `words` in place.
pub fn clean_candidates(words: &mut Vec<Word>) {
    drop_repeated_first(words);

    // Moved words go to the back and are not visited again.
    let mut end = words.len();
    let mut i = 0;
    while i < end {
        let word = &words[i];
        let to_back = is_lower_latin(&word.value)
            || (is_single_upper_latin(&word.value) && !word.code.contains(word.value.as_str()));
        if to_back {
            let word = words.remove(i);
            words.push(word);
            end -= 1;
            continue;
        }
        if words[i].value.ends_with(|c: char| c.is_ascii_lowercase()) {
            let word = &mut words[i];
            word.value = strip_lower_tail(&word.value).to_string();
            word.code = strip_lower_tail(&word.code).to_string();
            word.syllables = syllable_count(&word.code);
            if word.value.is_empty() {
                words.remove(i);
                end -= 1;
                continue;
            }
        }
        i += 1;
    }

    drop_repeated_first(words);
}
