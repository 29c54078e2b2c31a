//! IME session.
//!
//! `ImeSession` sits between the touch dispatcher and a composer: it receives
//! key events as a `KeyboardActionListener`, keeps the composing buffer, asks
//! the composer for candidates after every change and publishes the outcome
//! in an `ImeContext`.
//!
//! - printable codes are appended to the composing buffer
//! - an `AUTO_COMPOSE` result commits its first candidate at once
//! - selecting a candidate commits it and shrinks the buffer through
//!   `Composer::composing_text`
//! - delete, enter and literal text behave as on a plain keyboard when
//!   nothing is being composed

use crate::candidate::CandidatesResult;
use crate::composer::Composer;
use crate::context::ImeContext;
use crate::dispatcher::KeyboardActionListener;
use crate::input_buffer::InputBuffer;
use crate::keyboard::{Key, KEYCODE_DELETE, KEYCODE_DONE, KEYCODE_ENTER, KEYCODE_SHIFT, KEYCODE_SPACE};

/// Composing state for one keyboard session.
#[derive(Debug)]
pub struct ImeSession<C> {
    composer: C,
    buffer: InputBuffer,
    context: ImeContext,
    result: Option<CandidatesResult>,
    shifted: bool,
}

impl<C: Composer> ImeSession<C> {
    pub fn new(composer: C) -> Self {
        Self {
            composer,
            buffer: InputBuffer::new(),
            context: ImeContext::new(),
            result: None,
            shifted: false,
        }
    }

    pub fn composer(&self) -> &C {
        &self.composer
    }

    pub fn composer_mut(&mut self) -> &mut C {
        &mut self.composer
    }

    pub fn buffer(&self) -> &InputBuffer {
        &self.buffer
    }

    pub fn context(&self) -> &ImeContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut ImeContext {
        &mut self.context
    }

    /// Last candidate result, if composing text is pending.
    pub fn result(&self) -> Option<&CandidatesResult> {
        self.result.as_ref()
    }

    /// Typed letters are upper-cased while shifted.
    pub fn set_shifted(&mut self, shifted: bool) {
        self.shifted = shifted;
    }

    pub fn is_shifted(&self) -> bool {
        self.shifted
    }

    /// Append one typed character and refresh candidates.
    pub fn type_char(&mut self, ch: char) {
        if self.shifted && ch.is_lowercase() {
            for upper in ch.to_uppercase() {
                self.buffer.insert_char(upper);
            }
        } else {
            self.buffer.insert_char(ch);
        }
        self.refresh();
    }

    /// Backspace inside the composing buffer, or a pending editor delete when
    /// the buffer is empty.
    pub fn backspace(&mut self) {
        if self.buffer.delete_before() {
            self.refresh();
        } else {
            self.context.pending_deletes += 1;
        }
    }

    /// Commit candidate `index` of the current result. Returns false when
    /// there is no such candidate.
    pub fn select_candidate(&mut self, index: usize) -> bool {
        let Some(result) = self.result.take() else {
            return false;
        };
        let Some(word) = result.words.get(index) else {
            self.result = Some(result);
            return false;
        };
        self.context.commit_text.push_str(&word.value);
        let rest = self.composer.composing_text(&result.composing, &word.code);
        if rest == result.composing {
            self.buffer.clear();
        } else {
            self.buffer.set_text(rest);
        }
        self.refresh();
        true
    }

    /// Commit the raw composing text as typed.
    pub fn commit_composing(&mut self) {
        let text = self.buffer.text().to_string();
        self.context.commit_text.push_str(&text);
        self.buffer.clear();
        self.refresh();
    }

    /// Drop composing state and the composer's per-session cache.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.result = None;
        self.context.clear();
        self.composer.end_session();
    }

    fn refresh(&mut self) {
        // Each auto-compose commit shrinks the buffer, so this terminates.
        loop {
            let Some(result) = self.composer.candidates(self.buffer.text()) else {
                self.result = None;
                self.context.clear();
                return;
            };
            if result.is_auto_compose() && !result.is_empty() {
                self.result = Some(result);
                self.select_first_without_refresh();
                continue;
            }
            self.context.preedit_text = result.composing.clone();
            self.context.candidates = result.words.clone();
            self.context.action = result.action;
            self.result = Some(result);
            return;
        }
    }

    fn select_first_without_refresh(&mut self) {
        let Some(result) = self.result.take() else {
            return;
        };
        if let Some(word) = result.words.first() {
            self.context.commit_text.push_str(&word.value);
            let rest = self.composer.composing_text(&result.composing, &word.code);
            if rest == result.composing || rest.len() >= self.buffer.len() {
                self.buffer.clear();
            } else {
                self.buffer.set_text(rest);
            }
        }
    }
}

impl<C: Composer> KeyboardActionListener for ImeSession<C> {
    fn on_press(&mut self, _primary_code: i32) {}

    fn on_release(&mut self, _primary_code: i32) {}

    fn on_key(&mut self, primary_code: i32, _key_codes: &[i32], _has_popup: bool) {
        match primary_code {
            KEYCODE_DELETE => self.backspace(),
            KEYCODE_DONE | KEYCODE_ENTER => {
                if self.buffer.is_empty() {
                    self.context.commit_text.push('\n');
                } else {
                    self.commit_composing();
                }
            }
            KEYCODE_SPACE if self.buffer.is_empty() => self.context.commit_text.push(' '),
            KEYCODE_SHIFT => {
                self.shifted = !self.shifted;
                self.context.control_code = Some(primary_code);
            }
            code if code < 0 => self.context.control_code = Some(code),
            code => match char::from_u32(code as u32) {
                Some(ch) if !ch.is_control() => self.type_char(ch),
                _ => tracing::debug!("ignoring key code {code}"),
            },
        }
    }

    fn on_text(&mut self, text: &str) {
        if !self.buffer.is_empty() {
            self.commit_composing();
        }
        self.context.commit_text.push_str(text);
    }

    fn on_long_press(&mut self, key: &Key) -> bool {
        if key.has_popup() {
            self.context.popup_characters = key.popup_characters.clone();
            true
        } else {
            false
        }
    }
}
