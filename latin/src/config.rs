use anyhow::Context;
use serde::{Deserialize, Serialize};
use softkey_core::{KeyLabels, Script};

/// Latin configuration that extends the base `Config` from core.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LatinConfig {
    #[serde(flatten)]
    pub base: softkey_core::Config,

    /// Completions fetched per prefix
    pub completion_limit: usize,

    /// Domain suffixes appended to the base list
    pub domains: Vec<String>,
}

impl Default for LatinConfig {
    fn default() -> Self {
        Self {
            base: softkey_core::Config::default(),
            completion_limit: 20,
            domains: vec![".uk".to_string(), ".us".to_string()],
        }
    }
}

impl LatinConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn labels(&self) -> KeyLabels {
        self.base.labels_for(Script::Latin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_table_overrides_defaults() {
        let cfg = LatinConfig::from_toml_str(
            "completion_limit = 5\n\n[labels]\ntitle = \"Français\"\n",
        )
        .unwrap();
        assert_eq!(cfg.completion_limit, 5);
        assert_eq!(cfg.labels().title, "Français");
        assert_eq!(cfg.labels().enter, "enter");
    }
}
