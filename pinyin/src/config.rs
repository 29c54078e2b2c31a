use anyhow::Context;
use serde::{Deserialize, Serialize};
use softkey_core::{KeyLabels, Script};

/// Pinyin-specific configuration that extends the base `Config` from core.
///
/// - All generic options from `softkey_core::Config` (flattened via serde)
/// - Whether the 26 built-in single-letter maps are merged into lookups
/// - Extra domain suffixes offered after the base list
///
/// # Example
///
/// ```rust
/// use softkey_pinyin::PinyinConfig;
///
/// let config = PinyinConfig::from_toml_str("builtin_letter_maps = false\n").unwrap();
/// assert!(!config.builtin_letter_maps);
/// assert_eq!(config.domains, vec![".cn".to_string()]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PinyinConfig {
    /// Timing, correction and label options shared by all scripts
    #[serde(flatten)]
    pub base: softkey_core::Config,

    /// Merge the a..z letter maps into every single-letter lookup
    pub builtin_letter_maps: bool,

    /// Domain suffixes appended to the base list
    pub domains: Vec<String>,
}

impl Default for PinyinConfig {
    fn default() -> Self {
        Self {
            base: softkey_core::Config::default(),
            builtin_letter_maps: true,
            domains: vec![".cn".to_string()],
        }
    }
}

impl PinyinConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("invalid config {}", path.display()))
    }

    /// Configured labels, falling back to the simplified Chinese defaults.
    pub fn labels(&self) -> KeyLabels {
        self.base.labels_for(Script::Pinyin)
    }

    /// Get a reference to the base config
    pub fn base(&self) -> &softkey_core::Config {
        &self.base
    }

    pub fn into_base(self) -> softkey_core::Config {
        self.base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattened_base_fields_parse() {
        let cfg = PinyinConfig::from_toml_str(
            "proximity_correction = true\nlong_press_timeout_ms = 300\n",
        )
        .unwrap();
        assert!(cfg.base.proximity_correction);
        assert_eq!(cfg.base.long_press_timeout_ms, 300);
        assert!(cfg.builtin_letter_maps);
        assert_eq!(cfg.labels().title, "简体中文");
    }
}
