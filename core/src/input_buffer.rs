//! Composing buffer.
//!
//! Holds the raw, uncommitted text typed on the soft keyboard (e.g. "nihao"
//! or "ㄋㄧˇ"). Keys only ever append or delete at the end.

/// Raw composing text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputBuffer {
    text: String,
}

impl InputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    /// Replace the whole buffer. Used when committing a candidate shrinks the
    /// composing text.
    pub fn set_text<S: Into<String>>(&mut self, text: S) {
        self.text = text.into();
    }

    pub fn insert_char(&mut self, ch: char) {
        self.text.push(ch);
    }

    /// Backspace. Returns true if a character was removed.
    pub fn delete_before(&mut self) -> bool {
        self.text.pop().is_some()
    }
}
