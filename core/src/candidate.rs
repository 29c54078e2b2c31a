//! Candidate types shared by every composer.
//!
//! This module provides:
//! - `Word`: one candidate, `(syllables, code, value)`
//! - `Action`: what the host should do with a result
//! - `CandidatesResult`: ranked words plus the rewritten composing text

use serde::{Deserialize, Serialize};

/// A single candidate.
///
/// `code` is the input that produced `value` (romanization, transcoded
/// phonetic code, or the typed text itself); `syllables` counts its units.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Word {
    pub syllables: usize,
    pub code: String,
    pub value: String,
}

impl Word {
    pub fn new<C: Into<String>, V: Into<String>>(syllables: usize, code: C, value: V) -> Self {
        Word {
            syllables,
            code: code.into(),
            value: value.into(),
        }
    }

    /// A one-syllable word whose value is its own code.
    pub fn verbatim<T: Into<String>>(text: T) -> Self {
        let text = text.into();
        Word {
            syllables: 1,
            code: text.clone(),
            value: text,
        }
    }
}

/// What the host should do with a candidate result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Show the list and wait for a selection.
    #[default]
    ShowCandidates,
    /// Commit the first candidate right away; the last typed character ended
    /// the word.
    AutoCompose,
}

/// Output of a composer for one composing text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CandidatesResult {
    pub words: Vec<Word>,
    pub action: Action,
    /// Composing text as the composer sees it (whitespace stripped, segments
    /// spelled out).
    pub composing: String,
}

impl CandidatesResult {
    pub fn new(words: Vec<Word>, action: Action, composing: String) -> Self {
        Self {
            words,
            action,
            composing,
        }
    }

    pub fn first(&self) -> Option<&Word> {
        self.words.first()
    }

    pub fn is_auto_compose(&self) -> bool {
        self.action == Action::AutoCompose
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Candidate values in order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(|w| w.value.as_str())
    }
}

/// Number of space-separated units in a code; 0 for a blank code.
pub fn syllable_count(code: &str) -> usize {
    let code = code.trim();
    if code.is_empty() {
        0
    } else {
        code.matches(' ').count() + 1
    }
}
