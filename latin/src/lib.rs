//! softkey-latin crate root
//!
//! Word completion for Latin-script keyboards. The typed word is always
//! offered first; dictionary words extending each prefix of it follow.

pub mod composer;
pub mod config;

pub use composer::{LatinComposer, COMPLETION_TABLE};
pub use config::LatinConfig;

pub use softkey_core::{Action, CandidatesResult, Composer, ImeSession, Word};
