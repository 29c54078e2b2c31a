//! # softkey-zhuyin
//!
//! Zhuyin/Bopomofo composer built on softkey-core. Typed symbols are
//! transcoded to two-character codes and looked up in the sharded
//! `words_XX` / `phrases_XX` tables.

pub mod composer;
pub mod config;
pub mod symbols;

pub use composer::{ZhuyinComposer, PHRASES_TABLE, WORDS_TABLE};
pub use config::ZhuyinConfig;
pub use symbols::{decode, is_zhuyin, symbol_code, transcode, FIRST_TONE, FIRST_TONE_CODE};

pub use softkey_core::{Action, CandidatesResult, Composer, ImeSession, Word};
