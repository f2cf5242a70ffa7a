//! Random-forest request classifier compiler
//!
//! Turns a fitted pair of random forests (service and activity), their
//! bag-of-words vocabulary and label encoders into one self-contained C
//! translation unit with no dependencies beyond the C standard library.
//!
//! Modules:
//! - `forest`: tree arenas, ensembles and training-library import
//! - `vocab`: token → feature index table
//! - `hash_table`: static FNV-1a bucket table reproduced in C
//! - `tokenizer`: host-side twin of the generated tokenizer
//! - `codegen`: lowering to an evaluable AST and C rendering
//! - `labels`: `label_mappings.txt` writer and tolerant reader
//! - `predictor`: reference evaluator used as a test oracle
//! - `bundle`, `artifacts`, `config`: input format, artifact writer, settings
//! - `synth`: seeded synthetic models

pub mod artifacts;
pub mod bundle;
pub mod canon;
pub mod codegen;
pub mod config;
pub mod errors;
pub mod forest;
pub mod hash_table;
pub mod labels;
pub mod predictor;
pub mod request;
pub mod synth;
pub mod target;
pub mod tokenizer;
pub mod vocab;

pub use artifacts::{read_manifest, write_artifacts, ArtifactPaths, CompileManifest};
pub use bundle::{ModelBundle, TargetModel, TreeSpec};
pub use codegen::{compile, lower, TranslationUnit};
pub use config::CompilerConfig;
pub use errors::{CompileError, Result};
pub use forest::{Ensemble, Ensembles, Node, Tree};
pub use hash_table::HashTable;
pub use labels::{LabelMap, LabelMaps};
pub use predictor::{PredictedIds, ReferencePredictor};
pub use request::{Request, FIELD_COUNT, FIELD_NAMES};
pub use target::Target;
pub use tokenizer::{extract_features, tokenize, FeatureVector};
pub use vocab::Vocabulary;

/// Crate version string recorded in manifests
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Executable name the generated source is expected to be built as
pub const EXECUTABLE_NAME: &str = "api_classifier";
