//! Error types for the forest compiler

use thiserror::Error;

use crate::canon::CanonicalError;
use crate::target::Target;

/// Errors raised while validating inputs or emitting build artifacts.
///
/// Every variant is fatal at build time; none of them can surface while the
/// generated predictor is running.
#[derive(Error, Debug)]
pub enum CompileError {
    /// More vocabulary terms hash to one slot than a bucket can hold
    #[error("hash bucket {bucket} overflowed (capacity {capacity}) while inserting term {term:?}")]
    HashBucketOverflow {
        bucket: usize,
        capacity: usize,
        term: String,
    },

    /// Two vocabulary terms claim the same feature index
    #[error("feature index {index} is assigned to both {first:?} and {second:?}")]
    DuplicateVocabularyIndex {
        index: usize,
        first: String,
        second: String,
    },

    /// A feature index does not fit in the feature vector
    #[error("feature index {index} is outside the feature vector (MAX_FEATURES = {max_features})")]
    FeatureIndexOutOfRange { index: usize, max_features: usize },

    /// The vocabulary has no terms at all
    #[error("vocabulary is empty")]
    EmptyVocabulary,

    /// A tree arena is structurally broken
    #[error("{target} tree {tree} is invalid: {reason}")]
    InvalidTree {
        target: Target,
        tree: usize,
        reason: String,
    },

    /// An ensemble has no trees to vote
    #[error("{0} ensemble has no trees")]
    EmptyEnsemble(Target),

    /// A leaf predicts a class the vote array cannot hold
    #[error("{target} tree {tree} predicts class {class_id} but the ensemble has {num_classes} classes")]
    ClassOutOfRange {
        target: Target,
        tree: usize,
        class_id: usize,
        num_classes: usize,
    },

    /// A reachable class id has no human-readable label
    #[error("{target} class {class_id} has no label")]
    MissingLabel { target: Target, class_id: usize },

    /// A label cannot be written to the line-oriented mapping file
    #[error("{target} label {class_id} is not writable: {reason}")]
    InvalidLabel {
        target: Target,
        class_id: usize,
        reason: String,
    },

    /// Configuration could not be read or parsed
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Canonical serialization error
    #[error("canonical serialization error: {0}")]
    Canonical(#[from] CanonicalError),
}

/// Result type for compiler operations
pub type Result<T> = std::result::Result<T, CompileError>;
