//! Runner configuration
//!
//! Loaded from TOML, then overridden by `RFC_*` environment variables.
//! The artifact directory defaults to the compiler's output directory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::errors::{InvokeError, Result};

/// Compiled executable file name for the host platform
pub fn default_executable_name() -> &'static str {
    if cfg!(windows) {
        "api_classifier.exe"
    } else {
        "api_classifier"
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Directory holding the executable and label mappings
    pub artifact_dir: PathBuf,
    /// Explicit executable path; defaults to `artifact_dir/api_classifier`
    pub executable: Option<PathBuf>,
    /// Label mapping file name inside `artifact_dir`
    pub label_file: String,
    /// Per-invocation timeout in milliseconds
    pub timeout_ms: u64,
    /// Concurrent invocations in batch mode (1 = sequential)
    pub workers: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            artifact_dir: PathBuf::from("rfc_output"),
            executable: None,
            label_file: "label_mappings.txt".to_string(),
            timeout_ms: 10_000,
            workers: 1,
        }
    }
}

impl RunnerConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| InvokeError::Config(format!("Failed to parse config: {e}")))
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        info!("Loading configuration from: {}", path.display());
        let content = std::fs::read_to_string(path)
            .map_err(|e| InvokeError::Config(format!("Failed to read config file: {e}")))?;
        Self::from_toml_str(&content)
    }

    /// Apply `RFC_OUTPUT_DIR`, `RFC_EXECUTABLE`, `RFC_LABEL_FILE`,
    /// `RFC_TIMEOUT_MS` and `RFC_WORKERS`.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("RFC_OUTPUT_DIR") {
            self.artifact_dir = PathBuf::from(val);
        }
        if let Some(val) = lookup("RFC_EXECUTABLE") {
            self.executable = Some(PathBuf::from(val));
        }
        if let Some(val) = lookup("RFC_LABEL_FILE") {
            self.label_file = val;
        }
        if let Some(val) = lookup("RFC_TIMEOUT_MS") {
            match val.parse() {
                Ok(ms) => self.timeout_ms = ms,
                Err(_) => warn!("Ignoring RFC_TIMEOUT_MS={:?}: not a number", val),
            }
        }
        if let Some(val) = lookup("RFC_WORKERS") {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => self.workers = n,
                _ => warn!("Ignoring RFC_WORKERS={:?}: expected a positive number", val),
            }
        }
    }

    pub fn executable_path(&self) -> PathBuf {
        self.executable
            .clone()
            .unwrap_or_else(|| self.artifact_dir.join(default_executable_name()))
    }

    pub fn label_path(&self) -> PathBuf {
        self.artifact_dir.join(&self.label_file)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
