//! Per-request invocation of the compiled predictor
//!
//! One request is one short-lived process: eight arguments in, one JSON line
//! out. The process is bounded by a timeout and killed when it expires.

use apiclass_rfc_compiler::predictor::PredictedIds;
use apiclass_rfc_compiler::request::Request;
use apiclass_rfc_compiler::Target;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

use crate::args::{build_args, ARG_COUNT};
use crate::config::RunnerConfig;
use crate::errors::{InvokeError, Result};
use crate::labels::LabelCache;

/// Interval between exit checks while waiting on the child
const POLL_INTERVAL: Duration = Duration::from_millis(2);

/// Decoded prediction for one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    pub service_id: usize,
    pub activity_id: usize,
    /// Service label, when the mapping file knows it
    pub service: Option<String>,
    /// Activity label, when the mapping file knows it
    pub activity: Option<String>,
}

impl Prediction {
    pub fn ids(&self) -> PredictedIds {
        PredictedIds {
            service_id: self.service_id,
            activity_id: self.activity_id,
        }
    }
}

/// Captured result of one finished process
struct ProcessOutput {
    status: ExitStatus,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

/// Handle on the compiled classifier executable
#[derive(Debug, Clone)]
pub struct CompiledClassifier {
    executable: PathBuf,
    labels: Arc<LabelCache>,
    timeout: Duration,
}

impl CompiledClassifier {
    pub fn new(executable: impl Into<PathBuf>, labels: Arc<LabelCache>, timeout: Duration) -> Self {
        Self {
            executable: executable.into(),
            labels,
            timeout,
        }
    }

    /// Executable and label file resolved from `config`.
    pub fn from_config(config: &RunnerConfig) -> Self {
        Self::new(
            config.executable_path(),
            Arc::new(LabelCache::new(config.label_path())),
            config.timeout(),
        )
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn labels(&self) -> &Arc<LabelCache> {
        &self.labels
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fail early when the executable has not been built.
    pub fn ensure_executable(&self) -> Result<()> {
        if self.executable.is_file() {
            Ok(())
        } else {
            Err(InvokeError::ExecutableNotFound(self.executable.clone()))
        }
    }

    /// Classify one request and attach labels.
    pub fn predict(&self, request: &Request) -> Result<Prediction> {
        let ids = self.predict_ids(&build_args(request))?;
        let maps = self.labels.get()?;
        Ok(Prediction {
            service_id: ids.service_id,
            activity_id: ids.activity_id,
            service: maps.label(Target::Service, ids.service_id).map(str::to_string),
            activity: maps.label(Target::Activity, ids.activity_id).map(str::to_string),
        })
    }

    /// Run the executable on already sanitised arguments.
    pub fn predict_ids(&self, args: &[String]) -> Result<PredictedIds> {
        if args.len() != ARG_COUNT {
            return Err(InvokeError::ArgumentCount {
                expected: ARG_COUNT,
                actual: args.len(),
            });
        }
        self.ensure_executable()?;

        debug!("Args payload: {:?}", args);
        let output = self.run(args)?;

        if !output.status.success() {
            return Err(InvokeError::ProcessFailure {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_output(&String::from_utf8_lossy(&output.stdout))
    }

    fn run(&self, args: &[String]) -> Result<ProcessOutput> {
        let mut child = Command::new(&self.executable)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| InvokeError::Spawn {
                path: self.executable.clone(),
                source,
            })?;

        // Drain both pipes on their own threads so a chatty child cannot
        // block on a full pipe while we wait for it
        let (tx, rx) = mpsc::channel();
        if let Some(pipe) = child.stdout.take() {
            spawn_reader(Pipe::Stdout, pipe, tx.clone());
        }
        if let Some(pipe) = child.stderr.take() {
            spawn_reader(Pipe::Stderr, pipe, tx.clone());
        }
        drop(tx);

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                return Err(InvokeError::Timeout(self.timeout));
            }
            thread::sleep(POLL_INTERVAL);
        };

        // A background grandchild may keep the pipes open after the child
        // exits; the same deadline bounds the wait for end of output
        let mut output = ProcessOutput {
            status,
            stdout: Vec::new(),
            stderr: Vec::new(),
        };
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(remaining) {
                Ok((Pipe::Stdout, buf)) => output.stdout = buf,
                Ok((Pipe::Stderr, buf)) => output.stderr = buf,
                Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {
                    debug!("Output pipes still open after child exited; giving up");
                    return Err(InvokeError::Timeout(self.timeout));
                }
            }
        }
        Ok(output)
    }
}

#[derive(Debug, Clone, Copy)]
enum Pipe {
    Stdout,
    Stderr,
}

/// Readers are detached: whoever still holds the pipe keeps them alive.
fn spawn_reader<R: Read + Send + 'static>(pipe: Pipe, mut reader: R, tx: Sender<(Pipe, Vec<u8>)>) {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf);
        let _ = tx.send((pipe, buf));
    });
}

/// Find the first stdout line holding `{"service_id": .., "activity_id": ..}`.
pub fn parse_output(stdout: &str) -> Result<PredictedIds> {
    let mut last = None;
    for line in stdout.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match parse_line(line) {
            Some(ids) => {
                trace!("C output (parsed): {}", line);
                return Ok(ids);
            }
            None => trace!("C output (ignored): {}", line),
        }
        last = Some(line);
    }
    Err(InvokeError::OutputParseError(
        last.unwrap_or("<empty>").to_string(),
    ))
}

/// Only a JSON object counts; serde would also accept `[id, id]`.
fn parse_line(line: &str) -> Option<PredictedIds> {
    match serde_json::from_str::<Value>(line).ok()? {
        value @ Value::Object(_) => serde_json::from_value(value).ok(),
        _ => None,
    }
}
