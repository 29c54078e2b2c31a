//! Zhuyin composer.
//!
//! The whole composing text is one lookup key. Its symbols are transcoded
//! and queried against `words_XX` (exact, then codes extending it unless a
//! tone was typed) and `phrases_XX` (prefix) while the shared row budget
//! lasts. A trailing non-Zhuyin character ends the word: the best display
//! is committed with that character appended.

use crate::config::ZhuyinConfig;
use crate::symbols::{
    decode, ends_with_marked_tone, is_zhuyin, strip_first_tone, transcode, FIRST_TONE,
};
use softkey_core::composer::{domains_with, remove_first, replace_first};
use softkey_core::dictionary::{query_or_empty, shard_table, CodeMatch, Query, SharedStore};
use softkey_core::{
    dedup_and_match_case, syllable_count, utils, Action, CandidatesResult, Composer, ImeAction,
    KeyLabels, KeyMap, KeyMapCache, Script, Word,
};

pub const WORDS_TABLE: &str = "words";
pub const PHRASES_TABLE: &str = "phrases";

/// Traditional Chinese composer over a word store and an optional phrase
/// store.
pub struct ZhuyinComposer {
    words: Option<SharedStore>,
    phrases: Option<SharedStore>,
    keymaps: KeyMapCache,
    labels: KeyLabels,
    domains: Vec<String>,
    word_limit: usize,
}

impl std::fmt::Debug for ZhuyinComposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZhuyinComposer")
            .field("has_words", &self.words.is_some())
            .field("has_phrases", &self.phrases.is_some())
            .field("word_limit", &self.word_limit)
            .finish()
    }
}

impl ZhuyinComposer {
    pub fn new(words: Option<SharedStore>, phrases: Option<SharedStore>) -> Self {
        Self::with_config(words, phrases, &ZhuyinConfig::default())
    }

    pub fn with_config(
        words: Option<SharedStore>,
        phrases: Option<SharedStore>,
        config: &ZhuyinConfig,
    ) -> Self {
        Self {
            words,
            phrases,
            keymaps: KeyMapCache::new(),
            labels: config.labels(),
            domains: config.domains.clone(),
            word_limit: config.word_limit,
        }
    }

    pub fn keymaps(&self) -> &KeyMapCache {
        &self.keymaps
    }

    /// Candidates for one composing key; never empty.
    pub fn displays(&mut self, key: &str) -> Vec<Word> {
        if !key.chars().any(is_zhuyin) {
            return vec![Word::verbatim(key)];
        }
        let code = transcode(key);
        let words = self.words.as_ref();
        let phrases = self.phrases.as_ref();
        let limit = self.word_limit;
        let map = self
            .keymaps
            .get_or_load(&code, || load_keymap(words, phrases, &code, limit));
        let Some(best) = map.displays.first() else {
            return vec![Word::verbatim(key)];
        };
        match key.chars().next_back() {
            Some(last) if !is_zhuyin(last) => {
                let mut code = best.code.clone();
                code.push(last);
                let mut value = best.value.clone();
                value.push(last);
                vec![Word::new(1, code, value)]
            }
            _ => map.displays.clone(),
        }
    }
}

fn push_rows(map: &mut KeyMap, rows: Vec<softkey_core::DictRow>) -> usize {
    let count = rows.len();
    for row in rows {
        if row.code.is_empty() {
            continue;
        }
        let syllables = syllable_count(&row.code);
        map.displays.extend(
            row.value
                .split('|')
                .filter(|v| !v.is_empty())
                .map(|v| Word::new(syllables, row.code.as_str(), v)),
        );
    }
    count
}

fn load_keymap(
    words: Option<&SharedStore>,
    phrases: Option<&SharedStore>,
    code: &str,
    limit: usize,
) -> KeyMap {
    let mut map = KeyMap::default();
    let exact_only = ends_with_marked_tone(code);
    let code = strip_first_tone(code);
    if code.is_empty() {
        return map;
    }

    let words_table = shard_table(WORDS_TABLE, &code);
    let mut remaining = limit;

    let exact = Query::exact(words_table.as_str(), code.as_str())
        .by_frequency()
        .distinct()
        .limit(remaining);
    remaining = remaining.saturating_sub(push_rows(&mut map, query_or_empty(words, &exact)));

    if !exact_only && remaining > 0 {
        let rough = Query::new(
            words_table.as_str(),
            CodeMatch::PrefixExcludingExact(code.clone()),
        )
        .by_frequency()
        .distinct()
        .limit(remaining);
        remaining = remaining.saturating_sub(push_rows(&mut map, query_or_empty(words, &rough)));
    }

    if remaining > 0 && phrases.is_some() {
        let phrase = Query::prefix(shard_table(PHRASES_TABLE, &code), code.as_str())
            .by_frequency()
            .distinct()
            .limit(remaining);
        push_rows(&mut map, query_or_empty(phrases, &phrase));
    }
    tracing::debug!(
        "zhuyin keymap {code:?}: {} displays{}",
        map.displays.len(),
        if exact_only { " (exact)" } else { "" }
    );
    map
}

impl Composer for ZhuyinComposer {
    fn script(&self) -> Script {
        Script::Zhuyin
    }

    fn labels(&self) -> &KeyLabels {
        &self.labels
    }

    fn enter_key_text(&self, _action: ImeAction) -> String {
        self.labels.enter.clone()
    }

    fn domains(&self) -> Vec<String> {
        domains_with(&self.domains)
    }

    fn candidates(&mut self, composing: &str) -> Option<CandidatesResult> {
        if composing.trim().is_empty() {
            return None;
        }
        // Spaces stand for the first tone.
        let text: String = utils::normalize(composing)
            .chars()
            .map(|c| if c.is_whitespace() { FIRST_TONE } else { c })
            .collect();
        let last = text.chars().next_back()?;

        let mut words = self.displays(&text);
        dedup_and_match_case(&mut words);

        if !is_zhuyin(last) {
            return Some(CandidatesResult::new(words, Action::AutoCompose, text));
        }
        let composing = match words.first() {
            Some(first) => {
                replace_first(&text, &utils::strip_whitespace(&first.code), &first.code)
            }
            None => text,
        };
        Some(CandidatesResult::new(words, Action::ShowCandidates, composing))
    }

    fn composing_text(&self, composing: &str, code: &str) -> String {
        // Verbatim words carry the typed text as their code.
        let rest = if !code.is_empty() && composing.contains(code) {
            remove_first(composing, code)
        } else {
            // A trailing character appended at auto-compose stays literal.
            let split = code
                .find(|c: char| !c.is_ascii_alphanumeric())
                .unwrap_or(code.len());
            let mut display = decode(&code[..split]);
            display.push_str(&code[split..]);
            let target = if display.chars().count() < composing.chars().count() {
                display.as_str()
            } else {
                composing
            };
            remove_first(composing, target)
        };
        match rest.strip_prefix(FIRST_TONE) {
            Some(stripped) => stripped.to_string(),
            None => rest,
        }
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
