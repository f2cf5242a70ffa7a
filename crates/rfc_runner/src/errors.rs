//! Error types for invoking the compiled classifier

use apiclass_rfc_compiler::CompileError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while driving the compiled predictor.
#[derive(Error, Debug)]
pub enum InvokeError {
    /// The executable has not been built yet
    #[error("classifier executable not found at {}; build it from the generated source first", .0.display())]
    ExecutableNotFound(PathBuf),

    /// The process could not be started
    #[error("failed to start classifier {}: {source}", .path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The process exited unsuccessfully
    #[error("classifier failed with code {}: {stderr}", .code.map_or_else(|| "<signal>".to_string(), |c| c.to_string()))]
    ProcessFailure { code: Option<i32>, stderr: String },

    /// No stdout line carried the expected JSON object
    #[error("could not parse classifier output: {0}")]
    OutputParseError(String),

    /// Internal invariant: the predictor always takes eight arguments
    #[error("expected {expected} arguments, got {actual}")]
    ArgumentCount { expected: usize, actual: usize },

    /// The process did not finish in time and was killed
    #[error("classifier timed out after {0:?}")]
    Timeout(Duration),

    /// The label mapping file exists but could not be read
    #[error("failed to read label mappings {}: {source}", .path.display())]
    Labels {
        path: PathBuf,
        #[source]
        source: CompileError,
    },

    /// Dataset could not be read or written
    #[error("dataset error: {0}")]
    Dataset(String),

    /// The batch worker pool could not be built
    #[error("failed to build worker pool: {0}")]
    WorkerPool(String),

    /// Configuration could not be read or parsed
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl InvokeError {
    /// Whether the failure is specific to one request; batches carry on
    /// past these.
    pub fn is_per_request(&self) -> bool {
        matches!(
            self,
            InvokeError::ProcessFailure { .. }
                | InvokeError::OutputParseError(_)
                | InvokeError::Timeout(_)
        )
    }
}

/// Result type for runner operations
pub type Result<T> = std::result::Result<T, InvokeError>;
