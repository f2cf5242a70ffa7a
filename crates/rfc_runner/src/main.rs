//! Compiled classifier runner CLI

use anyhow::{Context, Result};
use apiclass_rfc_compiler::Request;
use apiclass_rfc_runner::{
    read_rows, write_rows, BatchRunner, CompiledClassifier, RunnerConfig,
};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "rfc-infer")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run a compiled random-forest request classifier", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Artifact directory (overrides config and RFC_OUTPUT_DIR)
    #[arg(short, long, global = true)]
    artifacts: Option<PathBuf>,

    /// Per-request timeout in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify a single request
    Predict(RequestArgs),
    /// Classify every row of a CSV or JSON dataset
    Batch {
        /// Input rows (.csv or .json)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file (.csv or .json)
        #[arg(short, long)]
        output: PathBuf,

        /// Concurrent invocations
        #[arg(short, long)]
        workers: Option<usize>,
    },
}

#[derive(ClapArgs, Debug)]
struct RequestArgs {
    #[arg(long)]
    host: Option<String>,
    #[arg(long)]
    url: Option<String>,
    #[arg(long)]
    method: Option<String>,
    #[arg(long)]
    origin: Option<String>,
    #[arg(long)]
    request_content_type: Option<String>,
    #[arg(long)]
    response_content_type: Option<String>,
    #[arg(long)]
    referer: Option<String>,
    #[arg(long)]
    accept: Option<String>,
}

impl From<RequestArgs> for Request {
    fn from(args: RequestArgs) -> Self {
        Request::from_fields([
            args.host,
            args.url,
            args.method,
            args.origin,
            args.request_content_type,
            args.response_content_type,
            args.referer,
            args.accept,
        ])
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let mut config = match &args.config {
        Some(path) => RunnerConfig::from_toml_file(path).context("Failed to load config")?,
        None => RunnerConfig::default(),
    };
    config.apply_env_overrides();
    if let Some(dir) = args.artifacts {
        config.artifact_dir = dir;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.timeout_ms = timeout_ms;
    }

    let classifier = CompiledClassifier::from_config(&config);

    match args.command {
        Command::Predict(request) => {
            let request = Request::from(request);
            let prediction = classifier
                .predict(&request)
                .context("Failed to classify request")?;
            println!("{}", serde_json::to_string_pretty(&prediction)?);
        }
        Command::Batch {
            input,
            output,
            workers,
        } => {
            let workers = workers.unwrap_or(config.workers);
            let rows = read_rows(&input)
                .with_context(|| format!("Failed to read dataset {}", input.display()))?;

            info!(
                "Running {} requests against {} ({} worker(s))",
                rows.len(),
                classifier.executable().display(),
                workers
            );
            let runner = BatchRunner::new(classifier).with_workers(workers);
            let (results, elapsed) = runner.run_rows(&rows).context("Batch run failed")?;

            let failed = results
                .iter()
                .filter(|row| !row.get("error").map_or(true, |e| e.is_null()))
                .count();
            write_rows(&output, &results)
                .with_context(|| format!("Failed to write results {}", output.display()))?;

            info!("✓ Batch completed in {:.2} seconds", elapsed);
            info!("  Rows: {} ({} failed)", results.len(), failed);
            info!("  Output: {}", output.display());
        }
    }

    Ok(())
}
