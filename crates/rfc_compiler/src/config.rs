//! Compiler configuration
//!
//! Loaded from TOML, then overridden by `RFC_*` environment variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::errors::{CompileError, Result};

/// Where and how build artifacts are written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Artifact directory
    pub output_dir: PathBuf,
    /// Generated C source file name
    pub source_file: String,
    /// Label mapping file name
    pub label_file: String,
    /// Compile manifest file name
    pub manifest_file: String,
    /// Feature vector length; `None` uses the vocabulary span
    pub max_features: Option<usize>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("rfc_output"),
            source_file: "api_classifier.c".to_string(),
            label_file: "label_mappings.txt".to_string(),
            manifest_file: "api_classifier.manifest.json".to_string(),
            max_features: None,
        }
    }
}

impl CompilerConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| CompileError::Config(format!("Failed to parse config: {e}")))
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        info!("Loading configuration from: {}", path.display());
        let content = std::fs::read_to_string(path)
            .map_err(|e| CompileError::Config(format!("Failed to read config file: {e}")))?;
        Self::from_toml_str(&content)
    }

    /// Apply `RFC_OUTPUT_DIR`, `RFC_SOURCE_FILE`, `RFC_LABEL_FILE`,
    /// `RFC_MANIFEST_FILE` and `RFC_MAX_FEATURES`.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("RFC_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(val);
        }
        if let Some(val) = lookup("RFC_SOURCE_FILE") {
            self.source_file = val;
        }
        if let Some(val) = lookup("RFC_LABEL_FILE") {
            self.label_file = val;
        }
        if let Some(val) = lookup("RFC_MANIFEST_FILE") {
            self.manifest_file = val;
        }
        if let Some(val) = lookup("RFC_MAX_FEATURES") {
            match val.parse() {
                Ok(n) => self.max_features = Some(n),
                Err(_) => warn!("Ignoring RFC_MAX_FEATURES={:?}: not a number", val),
            }
        }
    }

    pub fn source_path(&self) -> PathBuf {
        self.output_dir.join(&self.source_file)
    }

    pub fn label_path(&self) -> PathBuf {
        self.output_dir.join(&self.label_file)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.output_dir.join(&self.manifest_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = CompilerConfig::default();
        assert_eq!(config.source_path(), PathBuf::from("rfc_output/api_classifier.c"));
        assert_eq!(config.label_path(), PathBuf::from("rfc_output/label_mappings.txt"));
        assert_eq!(config.max_features, None);
    }

    #[test]
    fn test_partial_toml() {
        let config = CompilerConfig::from_toml_str(
            "output_dir = \"build/codegen\"\nmax_features = 5000\n",
        )
        .unwrap();
        assert_eq!(config.output_dir, PathBuf::from("build/codegen"));
        assert_eq!(config.max_features, Some(5000));
        assert_eq!(config.source_file, "api_classifier.c");

        assert!(CompilerConfig::from_toml_str("max_features = \"many\"").is_err());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("RFC_OUTPUT_DIR", "/tmp/rfc"),
            ("RFC_MAX_FEATURES", "not-a-number"),
            ("RFC_LABEL_FILE", "labels.txt"),
        ]
        .into_iter()
        .collect();

        let mut config = CompilerConfig {
            max_features: Some(10),
            ..Default::default()
        };
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.output_dir, PathBuf::from("/tmp/rfc"));
        assert_eq!(config.label_path(), PathBuf::from("/tmp/rfc/labels.txt"));
        assert_eq!(config.max_features, Some(10));
    }
}
