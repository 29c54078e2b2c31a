//! Composer contract shared by the script crates.
//!
//! A composer turns composing text into a `CandidatesResult`. Each script
//! crate (`softkey-latin`, `softkey-pinyin`, `softkey-zhuyin`) provides one
//! implementation. Composers cache dictionary lookups per segmentation key in
//! a `KeyMapCache` that lives as long as the keyboard session.

use crate::candidate::{CandidatesResult, Word};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Domain suffixes offered by every script.
pub const BASE_DOMAINS: [&str; 4] = [".com", ".net", ".org", ".co"];

/// Input scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Script {
    Latin,
    Pinyin,
    Zhuyin,
}

impl Script {
    pub fn locale(self) -> &'static str {
        match self {
            Script::Latin => "en_US",
            Script::Pinyin => "zh_CN",
            Script::Zhuyin => "zh_TW",
        }
    }

    /// Names of the bundled dictionaries for the script's locale.
    pub fn builtin_dictionaries(self) -> &'static [&'static str] {
        match self {
            Script::Latin => &["en_wordlist"],
            Script::Pinyin => &["google_pinyin"],
            Script::Zhuyin => &["zhuyin_words", "zhuyin_phrases"],
        }
    }
}

/// Action the editor's enter key performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImeAction {
    Go,
    Next,
    Search,
    Send,
    #[default]
    None,
}

/// Opaque key label strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyLabels {
    pub title: String,
    pub enter: String,
    pub go: String,
    pub next: String,
    pub search: String,
    pub send: String,
    pub mode_change: String,
}

impl Default for KeyLabels {
    fn default() -> Self {
        Self {
            title: "English".to_string(),
            enter: "enter".to_string(),
            go: "go".to_string(),
            next: "next".to_string(),
            search: "search".to_string(),
            send: "send".to_string(),
            mode_change: "?123".to_string(),
        }
    }
}

impl KeyLabels {
    /// Default labels for `script`.
    pub fn for_script(script: Script) -> Self {
        match script {
            Script::Latin => Self::default(),
            Script::Pinyin => Self {
                title: "简体中文".to_string(),
                enter: "确定".to_string(),
                mode_change: "?123".to_string(),
                ..Self::default()
            },
            Script::Zhuyin => Self {
                title: "注音".to_string(),
                enter: "確定".to_string(),
                mode_change: "?123".to_string(),
                ..Self::default()
            },
        }
    }

    /// Enter key label for `action`.
    pub fn enter_for(&self, action: ImeAction) -> &str {
        match action {
            ImeAction::Go => &self.go,
            ImeAction::Next => &self.next,
            ImeAction::Search => &self.search,
            ImeAction::Send => &self.send,
            ImeAction::None => &self.enter,
        }
    }
}

/// Script-specific candidate generation.
pub trait Composer {
    fn script(&self) -> Script;

    fn locale(&self) -> &'static str {
        self.script().locale()
    }

    fn labels(&self) -> &KeyLabels;

    fn title(&self) -> &str {
        &self.labels().title
    }

    /// The space bar shows the keyboard title.
    fn space_key_text(&self) -> String {
        self.title().to_string()
    }

    fn enter_key_text(&self, action: ImeAction) -> String {
        self.labels().enter_for(action).to_string()
    }

    fn mode_change_key_text(&self) -> String {
        self.labels().mode_change.clone()
    }

    /// Domain suffixes for the domain key, base list first.
    fn domains(&self) -> Vec<String>;

    /// Candidates for `composing`, or `None` for blank input.
    fn candidates(&mut self, composing: &str) -> Option<CandidatesResult>;

    /// Composing text left after the candidate with `code` was committed.
    fn composing_text(&self, composing: &str, code: &str) -> String {
        remove_first(composing, code)
    }

    fn supports_auto_completion(&self) -> bool {
        false
    }

    fn uses_composing_text(&self) -> bool {
        false
    }

    /// Forget cached lookups; called when the keyboard session ends.
    fn end_session(&mut self);
}

/// `BASE_DOMAINS` followed by `extra`.
pub fn domains_with(extra: &[String]) -> Vec<String> {
    BASE_DOMAINS
        .iter()
        .map(|d| d.to_string())
        .chain(extra.iter().cloned())
        .collect()
}

/// Remove the first literal occurrence of `code`; an empty code clears the text.
pub fn remove_first(text: &str, code: &str) -> String {
    if code.is_empty() {
        return String::new();
    }
    text.replacen(code, "", 1)
}

/// Replace the first literal occurrence of `from` with `to`.
pub fn replace_first(text: &str, from: &str, to: &str) -> String {
    if from.is_empty() {
        return text.to_string();
    }
    text.replacen(from, to, 1)
}

/// Displays and extra candidates for one segmentation key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyMap {
    pub displays: Vec<Word>,
    pub candidates: Vec<Word>,
}

impl KeyMap {
    pub fn is_empty(&self) -> bool {
        self.displays.is_empty() && self.candidates.is_empty()
    }
}

/// Per-session lookup cache. A key is loaded at most once per session,
/// including keys whose lookup found nothing.
#[derive(Debug, Clone, Default)]
pub struct KeyMapCache {
    maps: AHashMap<String, KeyMap>,
    loads: usize,
}

impl KeyMapCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&KeyMap> {
        self.maps.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.maps.contains_key(key)
    }

    /// The map for `key`, running `load` on the first request only.
    pub fn get_or_load<F>(&mut self, key: &str, load: F) -> &KeyMap
    where
        F: FnOnce() -> KeyMap,
    {
        if !self.maps.contains_key(key) {
            tracing::debug!("keymap miss for {key:?}");
            self.loads += 1;
            self.maps.insert(key.to_string(), load());
        }
        &self.maps[key]
    }

    /// Number of distinct keys loaded this session.
    pub fn loads(&self) -> usize {
        self.loads
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    pub fn clear(&mut self) {
        self.maps.clear();
        self.loads = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_loads_each_key_once() {
        let mut cache = KeyMapCache::new();
        let mut calls = 0;
        for _ in 0..3 {
            cache.get_or_load("ni", || {
                calls += 1;
                KeyMap::default()
            });
        }
        assert_eq!(calls, 1, "empty results are cached too");
        assert_eq!(cache.loads(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn first_occurrence_helpers() {
        assert_eq!(remove_first("nihaonihao", "nihao"), "nihao");
        assert_eq!(remove_first("abc", ""), "");
        assert_eq!(replace_first("nihaoma", "nihao", "ni hao"), "ni haoma");
        assert_eq!(replace_first("a.b", ".", "\\"), "a\\b");
    }

    #[test]
    fn enter_label_by_action() {
        let labels = KeyLabels::default();
        assert_eq!(labels.enter_for(ImeAction::Search), "search");
        assert_eq!(labels.enter_for(ImeAction::None), "enter");
    }

    #[test]
    fn domains_start_with_base_list() {
        let domains = domains_with(&[".cn".to_string()]);
        assert_eq!(domains, vec![".com", ".net", ".org", ".co", ".cn"]);
    }
}
