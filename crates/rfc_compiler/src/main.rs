//! Forest → C compiler CLI

use anyhow::{bail, Context, Result};
use apiclass_rfc_compiler::synth::{synthetic_bundle, SynthSpec};
use apiclass_rfc_compiler::{write_artifacts, CompilerConfig, ModelBundle, EXECUTABLE_NAME};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "rfc-compile")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Compile a random-forest request classifier into freestanding C", long_about = None)]
struct Args {
    /// Model bundle JSON (vocabulary, labels and trees)
    #[arg(short, long, required_unless_present = "demo_seed")]
    bundle: Option<PathBuf>,

    /// Output directory (overrides config and RFC_OUTPUT_DIR)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Feature vector length (defaults to the vocabulary span)
    #[arg(long)]
    max_features: Option<usize>,

    /// Compile a seeded synthetic bundle instead of --bundle
    #[arg(long, conflicts_with = "bundle")]
    demo_seed: Option<u64>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
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

    info!("Random-forest C compiler v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match &args.config {
        Some(path) => CompilerConfig::from_toml_file(path).context("Failed to load config")?,
        None => CompilerConfig::default(),
    };
    config.apply_env_overrides();
    if let Some(output) = args.output {
        config.output_dir = output;
    }
    if args.max_features.is_some() {
        config.max_features = args.max_features;
    }

    let bundle = match (&args.bundle, args.demo_seed) {
        (Some(path), _) => ModelBundle::load(path)
            .with_context(|| format!("Failed to load model bundle {}", path.display()))?,
        (None, Some(seed)) => {
            info!("Generating synthetic bundle with seed {}", seed);
            let bundle = synthetic_bundle(seed, &SynthSpec::default())
                .context("Failed to build synthetic bundle")?;
            std::fs::create_dir_all(&config.output_dir)
                .context("Failed to create output directory")?;
            let path = config.output_dir.join("bundle.json");
            bundle.save(&path).context("Failed to write synthetic bundle")?;
            info!("Synthetic bundle saved to {}", path.display());
            bundle
        }
        (None, None) => bail!("either --bundle or --demo-seed is required"),
    };

    let (manifest, paths) =
        write_artifacts(&bundle, &config).context("Failed to compile model bundle")?;

    info!("✓ Compilation completed successfully");
    info!("  Source: {}", paths.source.display());
    info!("  Labels: {}", paths.labels.display());
    info!("  Manifest: {}", paths.manifest.display());
    info!(
        "  {} terms, MAX_FEATURES {}, {}+{} trees",
        manifest.vocabulary_size,
        manifest.max_features,
        manifest.service_trees,
        manifest.activity_trees
    );
    info!(
        "Build with: cc -O2 -o {} {}",
        config.output_dir.join(EXECUTABLE_NAME).display(),
        paths.source.display()
    );

    Ok(())
}
