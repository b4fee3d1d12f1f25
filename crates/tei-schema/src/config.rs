//! Compiler configuration and structured-file reading

use crate::attributes::DEFAULT_HIDDEN_ATTRS;
use crate::{Error, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use tei_odd::LoaderConfig;
use tracing::trace;

/// Configuration for a schema compilation run
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Spec loader options
    pub loader: LoaderConfig,
    /// Attributes flagged hidden in the attribute dictionary
    pub hidden_attrs: Vec<String>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            loader: LoaderConfig::default(),
            hidden_attrs: DEFAULT_HIDDEN_ATTRS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl CompilerConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the preferred description language
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.loader = self.loader.language(language);
        self
    }

    /// Replace the hidden attribute list
    pub fn hidden_attrs<I, T>(mut self, attrs: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.hidden_attrs = attrs.into_iter().map(Into::into).collect();
        self
    }

    /// Load a configuration from a JSON or YAML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        read_structured(path)
    }
}

/// Read a JSON or YAML file, chosen by extension (`.yaml`/`.yml` is YAML)
pub fn read_structured<T: DeserializeOwned>(path: &Path) -> Result<T> {
    trace!("Loading structured file: {:?}", path);
    let content = std::fs::read_to_string(path)?;

    let invalid = |message: String| Error::InvalidFormat {
        path: path.display().to_string(),
        message,
    };

    if path
        .extension()
        .map(|e| e == "yaml" || e == "yml")
        .unwrap_or(false)
    {
        serde_yaml::from_str(&content).map_err(|e| invalid(format!("YAML parse error: {e}")))
    } else {
        serde_json::from_str(&content).map_err(|e| invalid(format!("JSON parse error: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CompilerConfig::default();
        assert_eq!(config.loader.language, "en");
        assert_eq!(config.hidden_attrs, vec!["xml:id", "n"]);
    }

    #[test]
    fn test_builder() {
        let config = CompilerConfig::new().language("fr").hidden_attrs(["xml:id"]);
        assert_eq!(config.loader.language, "fr");
        assert_eq!(config.hidden_attrs, vec!["xml:id"]);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: CompilerConfig = serde_json::from_str(r#"{"loader": {"language": "de"}}"#).unwrap();
        assert_eq!(config.loader.language, "de");
        assert_eq!(config.hidden_attrs, vec!["xml:id", "n"]);
    }

    #[test]
    fn test_yaml() {
        let config: CompilerConfig = serde_yaml::from_str("hidden_attrs: [xml:id, xml:base]").unwrap();
        assert_eq!(config.hidden_attrs, vec!["xml:id", "xml:base"]);
        assert_eq!(config.loader.language, "en");
    }

    #[test]
    fn test_read_structured_missing_file() {
        let result: Result<CompilerConfig> = read_structured(Path::new("tests/data/nope.json"));
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
