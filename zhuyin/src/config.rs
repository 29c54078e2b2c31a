use anyhow::Context;
use serde::{Deserialize, Serialize};
use softkey_core::{KeyLabels, Script};

/// Zhuyin-specific configuration that extends the base `Config` from core.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ZhuyinConfig {
    #[serde(flatten)]
    pub base: softkey_core::Config,

    /// Rows fetched per lookup, shared by the word and phrase queries
    pub word_limit: usize,

    /// Domain suffixes appended to the base list
    pub domains: Vec<String>,
}

impl Default for ZhuyinConfig {
    fn default() -> Self {
        Self {
            base: softkey_core::Config::default(),
            word_limit: 50,
            domains: vec![".tw".to_string()],
        }
    }
}

impl ZhuyinConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("invalid config {}", path.display()))
    }

    /// Configured labels, falling back to the traditional Chinese defaults.
    pub fn labels(&self) -> KeyLabels {
        self.base.labels_for(Script::Zhuyin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_overrides() {
        let cfg = ZhuyinConfig::from_toml_str("word_limit = 10\n").unwrap();
        assert_eq!(cfg.word_limit, 10);
        assert_eq!(cfg.domains, vec![".tw".to_string()]);
        assert_eq!(cfg.base.debounce_time_ms, 70);
        assert_eq!(cfg.labels().title, "注音");
    }
}
