//! Batch inference over a dataset
//!
//! Rows are classified in input order (or on a bounded worker pool with the
//! order restored afterwards). A failure that only concerns one request is
//! recorded on that row; anything else aborts the batch.

use apiclass_rfc_compiler::request::Request;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Instant;
use tracing::{info, warn};

use crate::errors::{InvokeError, Result};
use crate::invoker::{CompiledClassifier, Prediction};

/// Anything that can classify one request
pub trait Classifier: Sync {
    fn predict(&self, request: &Request) -> Result<Prediction>;

    /// Checked once before a batch starts.
    fn ensure_ready(&self) -> Result<()> {
        Ok(())
    }
}

impl Classifier for CompiledClassifier {
    fn predict(&self, request: &Request) -> Result<Prediction> {
        CompiledClassifier::predict(self, request)
    }

    fn ensure_ready(&self) -> Result<()> {
        self.ensure_executable()
    }
}

/// Outcome for one input row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    /// Zero-based position in the input
    pub index: usize,
    pub prediction: Option<Prediction>,
    pub error: Option<String>,
    pub latency_ms: f64,
}

impl BatchResult {
    /// Merge the prediction fields into the original row.
    ///
    /// Adds `service_id`, `activity_id`, `service`, `activity`, `latency_ms`
    /// and `error`, overwriting columns of the same name.
    pub fn merge_into(&self, mut row: Map<String, Value>) -> Map<String, Value> {
        let p = self.prediction.as_ref();
        row.insert(
            "service_id".into(),
            p.map_or(Value::Null, |p| p.service_id.into()),
        );
        row.insert(
            "activity_id".into(),
            p.map_or(Value::Null, |p| p.activity_id.into()),
        );
        row.insert(
            "service".into(),
            p.and_then(|p| p.service.clone()).map_or(Value::Null, Value::String),
        );
        row.insert(
            "activity".into(),
            p.and_then(|p| p.activity.clone()).map_or(Value::Null, Value::String),
        );
        row.insert("latency_ms".into(), round2(self.latency_ms).into());
        row.insert(
            "error".into(),
            self.error.clone().map_or(Value::Null, Value::String),
        );
        row
    }
}

/// Results in input order plus total wall time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub results: Vec<BatchResult>,
    /// Wall time in seconds, rounded to two decimals
    pub elapsed_seconds: f64,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.error.is_none()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Drives a [`Classifier`] over many requests
pub struct BatchRunner<C> {
    classifier: C,
    workers: usize,
}

impl<C: Classifier> BatchRunner<C> {
    pub fn new(classifier: C) -> Self {
        Self {
            classifier,
            workers: 1,
        }
    }

    /// Use up to `workers` concurrent invocations (1 = sequential).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Classify every request.
    pub fn run(&self, requests: &[Request]) -> Result<BatchReport> {
        self.classifier.ensure_ready()?;

        let total = requests.len();
        let start = Instant::now();

        // A fatal outcome stops dispatch: the sequential loop returns at
        // once, and rayon stops handing out rows once an Err is collected
        let results = if self.workers > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.workers)
                .build()
                .map_err(|e| InvokeError::WorkerPool(e.to_string()))?;
            pool.install(|| {
                requests
                    .par_iter()
                    .enumerate()
                    .map(|(i, request)| self.run_one(i, total, request))
                    .collect::<Result<Vec<_>>>()
            })?
        } else {
            let mut results = Vec::with_capacity(total);
            for (i, request) in requests.iter().enumerate() {
                results.push(self.run_one(i, total, request)?);
            }
            results
        };

        let elapsed = start.elapsed().as_secs_f64();
        info!("Processed {} requests in {:.2} seconds", total, elapsed);

        Ok(BatchReport {
            results,
            elapsed_seconds: round2(elapsed),
        })
    }

    /// Classify loosely typed dataset rows and merge the predictions in.
    pub fn run_rows(&self, rows: &[Map<String, Value>]) -> Result<(Vec<Map<String, Value>>, f64)> {
        let requests: Vec<Request> = rows.iter().map(Request::from_row).collect();
        let report = self.run(&requests)?;
        let merged = rows
            .iter()
            .cloned()
            .zip(&report.results)
            .map(|(row, result)| result.merge_into(row))
            .collect();
        Ok((merged, report.elapsed_seconds))
    }

    /// Per-request failures land in the result; anything else is returned
    /// as the error.
    fn run_one(&self, index: usize, total: usize, request: &Request) -> Result<BatchResult> {
        let started = Instant::now();
        let outcome = self.classifier.predict(request);
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

        match outcome {
            Ok(prediction) => {
                info!(
                    "Processing request {}/{} [{:.2} ms] Service: {}, Activity: {}",
                    index + 1,
                    total,
                    latency_ms,
                    prediction.service.as_deref().unwrap_or("Unknown Service"),
                    prediction.activity.as_deref().unwrap_or("Unknown Activity")
                );
                Ok(BatchResult {
                    index,
                    prediction: Some(prediction),
                    error: None,
                    latency_ms,
                })
            }
            Err(err) if !err.is_per_request() => Err(err),
            Err(err) => {
                warn!(
                    "Processing request {}/{} [{:.2} ms] failed: {}",
                    index + 1,
                    total,
                    latency_ms,
                    err
                );
                Ok(BatchResult {
                    index,
                    prediction: None,
                    error: Some(err.to_string()),
                    latency_ms,
                })
            }
        }
    }
}
