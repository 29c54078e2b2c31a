//! Latin composer.
//!
//! Completions come from the `autocorrect` table, whose rows are keyed by
//! the word. Keys match stored codes regardless of case. Each completion carries a trailing space so that
//! committing it also ends the word.

use crate::config::LatinConfig;
use softkey_core::composer::domains_with;
use softkey_core::dictionary::{query_or_empty, Query, SharedStore};
use softkey_core::{
    dedup_and_match_case, utils, Action, CandidatesResult, Composer, KeyLabels, KeyMap,
    KeyMapCache, Script, Word,
};

pub const COMPLETION_TABLE: &str = "autocorrect";

pub struct LatinComposer {
    store: Option<SharedStore>,
    keymaps: KeyMapCache,
    labels: KeyLabels,
    domains: Vec<String>,
    completion_limit: usize,
}

impl std::fmt::Debug for LatinComposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LatinComposer")
            .field("has_store", &self.store.is_some())
            .field("completion_limit", &self.completion_limit)
            .finish()
    }
}

impl LatinComposer {
    pub fn new(store: Option<SharedStore>) -> Self {
        Self::with_config(store, &LatinConfig::default())
    }

    pub fn with_config(store: Option<SharedStore>, config: &LatinConfig) -> Self {
        Self {
            store,
            keymaps: KeyMapCache::new(),
            labels: config.labels(),
            domains: config.domains.clone(),
            completion_limit: config.completion_limit,
        }
    }

    pub fn keymaps(&self) -> &KeyMapCache {
        &self.keymaps
    }

    /// Completions for `key`. Keys without letters complete to themselves.
    pub fn completions(&mut self, key: &str) -> Vec<Word> {
        if !key.chars().any(char::is_alphabetic) {
            return vec![Word::verbatim(key)];
        }
        let store = self.store.as_ref();
        let limit = self.completion_limit;
        self.keymaps
            .get_or_load(key, || load_completions(store, key, limit))
            .displays
            .clone()
    }
}

fn load_completions(store: Option<&SharedStore>, key: &str, limit: usize) -> KeyMap {
    let query = Query::prefix_ignore_case(COMPLETION_TABLE, key)
        .by_frequency()
        .limit(limit);
    let displays = query_or_empty(store, &query)
        .into_iter()
        .filter(|row| !row.value.is_empty())
        .map(|row| Word::new(1, key, format!("{} ", row.value)))
        .collect::<Vec<_>>();
    tracing::trace!("{} completions for {key:?}", displays.len());
    KeyMap {
        displays,
        candidates: Vec::new(),
    }
}

impl Composer for LatinComposer {
    fn script(&self) -> Script {
        Script::Latin
    }

    fn labels(&self) -> &KeyLabels {
        &self.labels
    }

    fn domains(&self) -> Vec<String> {
        domains_with(&self.domains)
    }

    fn candidates(&mut self, composing: &str) -> Option<CandidatesResult> {
        let last = composing.chars().next_back()?;
        let action = if last.is_alphabetic() {
            Action::ShowCandidates
        } else {
            Action::AutoCompose
        };

        let text = utils::strip_whitespace(&utils::normalize(composing));
        if text.is_empty() {
            return None;
        }

        let mut words = vec![Word::verbatim(text.as_str())];
        let ends: Vec<usize> = text.char_indices().map(|(i, c)| i + c.len_utf8()).collect();
        for end in ends.into_iter().rev() {
            words.extend(self.completions(&text[..end]));
        }
        dedup_and_match_case(&mut words);

        Some(CandidatesResult::new(words, action, text))
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
