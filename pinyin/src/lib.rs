//! softkey-pinyin crate root
//!
//! Pinyin composer for the soft keyboard: greedy segmentation of typed
//! letters against the `keymaps`/`autocorrect` tables, built-in single-letter
//! maps and the Pinyin-specific candidate cleanup.
//!
//! Public API exported here:
//! - `PinyinComposer` from `composer`
//! - `PinyinConfig` from `config`
//! - `letter_map` / `LetterMap` from `letters`

pub mod cleanup;
pub mod composer;
pub mod config;
pub mod letters;

pub use composer::{PinyinComposer, AUTOCORRECT_TABLE, KEYMAP_TABLE};
pub use config::PinyinConfig;
pub use letters::{letter_map, LetterMap};

// Shared session types, so callers only need this crate.
pub use softkey_core::{Action, CandidatesResult, Composer, ImeSession, Word};
