//! Session output read by the host.
//!
//! After feeding key events into an `ImeSession`, the host reads these fields
//! to update the composing underline, the candidate strip and the editor.
//! Plain data, no callbacks.

use crate::candidate::{Action, Word};

/// State the host renders or applies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImeContext {
    /// Composing text as shown to the user.
    pub preedit_text: String,

    /// Text to insert into the editor; consume with `take_commit`.
    pub commit_text: String,

    /// Candidates for the current composing text.
    pub candidates: Vec<Word>,

    /// Action attached to the last candidate result.
    pub action: Action,

    /// Backspaces that hit an empty composing buffer and must be applied to
    /// the editor.
    pub pending_deletes: usize,

    /// Control key (mode change, language change, emoji, ...) for the host.
    pub control_code: Option<i32>,

    /// Popup characters of a long-pressed key the host should show.
    pub popup_characters: Option<String>,
}

impl ImeContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear preedit and candidates. Commit text is left for the host.
    pub fn clear(&mut self) {
        self.preedit_text.clear();
        self.candidates.clear();
        self.action = Action::default();
    }

    pub fn take_commit(&mut self) -> String {
        std::mem::take(&mut self.commit_text)
    }

    pub fn take_control(&mut self) -> Option<i32> {
        self.control_code.take()
    }

    pub fn take_popup(&mut self) -> Option<String> {
        self.popup_characters.take()
    }

    pub fn has_visible_state(&self) -> bool {
        !self.preedit_text.is_empty() || !self.candidates.is_empty()
    }

    pub fn has_commit(&self) -> bool {
        !self.commit_text.is_empty()
    }
}
