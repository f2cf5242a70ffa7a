//! Runner for compiled random-forest request classifiers
//!
//! Drives the executable built from `rfc-compile` output: one short-lived
//! process per request, with labels decoded from the mapping file written
//! next to it.
//!
//! Modules:
//! - `args`: eight-argument command-line contract
//! - `invoker`: process spawn, timeout and output parsing
//! - `labels`: lazily loaded, reloadable label cache
//! - `batch`: ordered batch runs, optionally on a worker pool
//! - `dataset`: CSV and JSON row files
//! - `config`: settings from TOML and `RFC_*` variables

pub mod args;
pub mod batch;
pub mod config;
pub mod dataset;
pub mod errors;
pub mod invoker;
pub mod labels;

pub use args::{build_args, sanitize, ARG_COUNT, MISSING};
pub use batch::{BatchReport, BatchResult, BatchRunner, Classifier};
pub use config::RunnerConfig;
pub use dataset::{read_rows, write_rows, Row};
pub use errors::{InvokeError, Result};
pub use invoker::{parse_output, CompiledClassifier, Prediction};
pub use labels::LabelCache;
