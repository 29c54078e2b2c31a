//! Pinyin composer.
//!
//! Composing text is segmented greedily from the left: the longest prefix
//! with a known display wins, and the rest is segmented the same way. The
//! joined best displays form the first candidate. Every shrinking prefix
//! then contributes its displays and extra candidates.
//!
//! Lookups go to two tables and are cached per key for the session:
//! - `keymaps`: rows keyed by the typed letters; `value` holds the
//!   `|`-separated displays and `aux` the `|`-separated extra candidates
//! - `autocorrect`: rows keyed by a misspelled input; `aux` holds the
//!   corrected display code and `value` the displays

use crate::cleanup::clean_candidates;
use crate::config::PinyinConfig;
use crate::letters::letter_map;
use softkey_core::composer::{domains_with, replace_first};
use softkey_core::dictionary::{query_or_empty, Query, SharedStore};
use softkey_core::{
    dedup_and_match_case, syllable_count, utils, Action, CandidatesResult, Composer, KeyLabels,
    KeyMap, KeyMapCache, Script, Word,
};

pub const KEYMAP_TABLE: &str = "keymaps";
pub const AUTOCORRECT_TABLE: &str = "autocorrect";

/// Simplified Chinese composer.
pub struct PinyinComposer {
    store: Option<SharedStore>,
    keymaps: KeyMapCache,
    labels: KeyLabels,
    domains: Vec<String>,
    builtin_letter_maps: bool,
}

impl std::fmt::Debug for PinyinComposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinyinComposer")
            .field("has_store", &self.store.is_some())
            .field("cached_keys", &self.keymaps.len())
            .finish()
    }
}

impl PinyinComposer {
    /// Composer over `store`. Without a store only the built-in letter maps
    /// resolve.
    pub fn new(store: Option<SharedStore>) -> Self {
        Self::with_config(store, &PinyinConfig::default())
    }

    pub fn with_config(store: Option<SharedStore>, config: &PinyinConfig) -> Self {
        Self {
            store,
            keymaps: KeyMapCache::new(),
            labels: config.labels(),
            domains: config.domains.clone(),
            builtin_letter_maps: config.builtin_letter_maps,
        }
    }

    pub fn keymaps(&self) -> &KeyMapCache {
        &self.keymaps
    }

    /// Displays for `key`, or `key` itself when nothing is known about it.
    pub fn displays(&mut self, key: &str) -> Vec<Word> {
        let displays = self.lookup_displays(key);
        if displays.is_empty() {
            vec![Word::verbatim(key)]
        } else {
            displays
        }
    }

    /// Keys without any lowercase letter are their own display.
    fn lookup_displays(&mut self, key: &str) -> Vec<Word> {
        if !key.is_empty() && !key.chars().any(|c| c.is_ascii_lowercase()) {
            return vec![Word::verbatim(key)];
        }
        self.keymap(key).displays.clone()
    }

    fn keymap(&mut self, key: &str) -> &KeyMap {
        let store = self.store.as_ref();
        let builtin = self.builtin_letter_maps;
        self.keymaps
            .get_or_load(key, || load_keymap(store, key, builtin))
    }

    /// Greedy segmentation. Returns the code of every segment and the joined
    /// best displays.
    fn segment(&mut self, text: &str) -> (Vec<String>, String) {
        let mut codes = Vec::new();
        let mut value = String::new();
        let mut rest = text;
        while !rest.is_empty() {
            let mut found = None;
            for end in prefix_ends(rest) {
                if let Some(best) = self.lookup_displays(&rest[..end]).into_iter().next() {
                    found = Some((end, best));
                    break;
                }
            }
            match found {
                Some((end, best)) => {
                    codes.push(best.code);
                    value.push_str(&best.value);
                    rest = &rest[end..];
                }
                None => {
                    // Only possible without the built-in letter maps.
                    let Some(ch) = rest.chars().next() else { break };
                    codes.push(ch.to_string());
                    value.push(ch);
                    rest = &rest[ch.len_utf8()..];
                }
            }
        }
        (codes, value)
    }
}

/// Byte ends of every non-empty prefix of `s`, longest first.
fn prefix_ends(s: &str) -> impl Iterator<Item = usize> + '_ {
    s.char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
}

fn push_split(target: &mut Vec<Word>, code: &str, joined: &str) {
    if code.is_empty() {
        return;
    }
    let syllables = syllable_count(code);
    target.extend(
        joined
            .split('|')
            .filter(|v| !v.is_empty())
            .map(|v| Word::new(syllables, code, v)),
    );
}

fn load_keymap(store: Option<&SharedStore>, key: &str, builtin: bool) -> KeyMap {
    let mut map = KeyMap::default();
    if key.is_empty() {
        return map;
    }
    for row in query_or_empty(store, &Query::exact(KEYMAP_TABLE, key)) {
        push_split(&mut map.displays, &row.code, &row.value);
        if let Some(candidates) = &row.aux {
            push_split(&mut map.candidates, &row.code, candidates);
        }
    }
    for row in query_or_empty(store, &Query::exact(AUTOCORRECT_TABLE, key)) {
        let code = row.aux.as_deref().unwrap_or(&row.code);
        push_split(&mut map.displays, code, &row.value);
    }
    if builtin {
        if let Some(letter) = letter_map(key) {
            push_split(&mut map.displays, key, letter.displays);
            push_split(&mut map.candidates, key, letter.candidates);
        }
    }
    tracing::debug!(
        "pinyin keymap {key:?}: {} displays, {} candidates",
        map.displays.len(),
        map.candidates.len()
    );
    map
}

impl Composer for PinyinComposer {
    fn script(&self) -> Script {
        Script::Pinyin
    }

    fn labels(&self) -> &KeyLabels {
        &self.labels
    }

    fn enter_key_text(&self, _action: softkey_core::ImeAction) -> String {
        // The enter key always completes the composing text.
        self.labels.enter.clone()
    }

    fn domains(&self) -> Vec<String> {
        domains_with(&self.domains)
    }

    fn candidates(&mut self, composing: &str) -> Option<CandidatesResult> {
        let last = composing.chars().next_back()?;
        let action = if last.is_ascii_lowercase() {
            Action::ShowCandidates
        } else {
            Action::AutoCompose
        };

        let text = utils::strip_whitespace(&utils::normalize(composing));
        if text.is_empty() {
            return None;
        }

        let (codes, value) = self.segment(&text);
        let code = codes.join(" ");
        let mut words = vec![Word::new(syllable_count(&code), code, value)];

        for end in prefix_ends(&text) {
            let key = &text[..end];
            words.extend(self.lookup_displays(key));
            if let Some(map) = self.keymaps.get(key) {
                words.extend(map.candidates.iter().cloned());
            }
        }

        clean_candidates(&mut words);
        dedup_and_match_case(&mut words);

        let composing = match words.first() {
            Some(first) => {
                replace_first(&text, &utils::strip_whitespace(&first.code), &first.code)
            }
            None => text,
        };
        Some(CandidatesResult::new(words, action, composing))
    }

    fn supports_auto_completion(&self) -> bool {
        true
    }

    fn uses_composing_text(&self) -> bool {
        true
    }

    fn end_session(&mut self) {
        self.keymaps.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_resolve_without_a_store() {
        let mut composer = PinyinComposer::new(None);
        let result = composer.candidates("v").unwrap();
        assert_eq!(result.values().collect::<Vec<_>>(), vec!["吧", "被", "v"]);
        assert_eq!(result.action, Action::ShowCandidates);
        assert_eq!(composer.displays("9"), vec![Word::verbatim("9")]);
    }

    #[test]
    fn prefix_ends_are_char_aligned() {
        let ends: Vec<usize> = prefix_ends("a你").collect();
        assert_eq!(ends, vec![4, 1]);
    }

    #[test]
    fn blank_input_has_no_candidates() {
        let mut composer = PinyinComposer::new(None);
        assert!(composer.candidates("").is_none());
        assert!(composer.candidates("  ").is_none());
    }
}
