//! softkey-core
//!
//! Keyboard model, hit-testing, touch dispatch and candidate plumbing shared
//! by the script crates (softkey-latin, softkey-pinyin, softkey-zhuyin).
//!
//! Data flows touch -> key codes -> composing text -> candidates:
//!
//! - `Keyboard` / `KeyboardBuilder` - layout model and loading
//! - `HitTester` - primary key and nearby alternates for a point
//! - `TouchDispatcher` - pointer events to key events, with debounce and long-press
//! - `Composer` - script-specific candidate generation
//! - `DictionaryStore` - row queries against word tables (memory or redb)
//! - `ImeSession` - composing buffer driven by dispatched key events
//! - `Config` - timing and label configuration
use anyhow::Context;
use serde::{Deserialize, Serialize};

pub mod keyboard;
pub use keyboard::{EdgeFlags, Key, KeyMetrics, Keyboard, Row};

pub mod layout;
pub use layout::{load_layout_file, load_layout_str, KeySpec, KeyboardBuilder, KeyboardSpec, RowSpec};

pub mod proximity;
pub use proximity::{compute_proximity_threshold, HitTester, KeyHit, MAX_NEARBY_KEYS};

pub mod dispatcher;
pub use dispatcher::{
    DispatcherConfig, KeyboardActionListener, Phase, TouchAction, TouchDispatcher, TouchEvent,
};

pub mod candidate;
pub use candidate::{syllable_count, Action, CandidatesResult, Word};

pub mod postprocess;
pub use postprocess::dedup_and_match_case;

pub mod dictionary;
pub use dictionary::{
    CodeMatch, Dictionary, DictionaryStore, MemoryDictionary, Query, RedbDictionary, Row as DictRow,
    SharedStore,
};

pub mod composer;
pub use composer::{Composer, ImeAction, KeyLabels, KeyMap, KeyMapCache, Script};

pub mod input_buffer;
pub use input_buffer::InputBuffer;

pub mod context;
pub use context::ImeContext;

pub mod session;
pub use session::ImeSession;

/// Language-agnostic configuration.
///
/// Script-specific options live in `LatinConfig`, `PinyinConfig` and
/// `ZhuyinConfig`, which flatten this struct.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Delay before a held key reports a long-press (ms).
    pub long_press_timeout_ms: u64,
    /// Dwell on a newly entered key below which a release snaps back (ms).
    pub debounce_time_ms: u64,
    /// Let keys near (not under) the touch point resolve and report alternates.
    pub proximity_correction: bool,
    /// Rows tagged with another mode are dropped when a layout loads.
    pub keyboard_mode: i32,
    /// Key label override; each script has its own defaults.
    pub labels: Option<KeyLabels>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            long_press_timeout_ms: dispatcher::LONG_PRESS_TIMEOUT,
            debounce_time_ms: dispatcher::DEBOUNCE_TIME,
            proximity_correction: false,
            keyboard_mode: 0,
            labels: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("invalid config {}", path.display()))
    }

    /// Save configuration to a TOML file.
    pub fn save_toml<P: AsRef<std::path::Path>>(&self, path: P) -> anyhow::Result<()> {
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Configured labels, or the defaults of `script`.
    pub fn labels_for(&self, script: Script) -> KeyLabels {
        self.labels
            .clone()
            .unwrap_or_else(|| KeyLabels::for_script(script))
    }

    /// Dispatcher settings derived from this config.
    pub fn dispatcher(&self) -> DispatcherConfig {
        DispatcherConfig::from(self)
    }
}

/// Text helpers.
pub mod utils {
    use unicode_normalization::UnicodeNormalization;

    /// NFC-normalize composing text so composed and decomposed input match
    /// the same dictionary keys.
    pub fn normalize(s: &str) -> String {
        s.nfc().collect()
    }

    /// Remove every whitespace character.
    pub fn strip_whitespace(s: &str) -> String {
        s.chars().filter(|c| !c.is_whitespace()).collect()
    }
}
