//! Build artifact writer
//!
//! One compile produces three files in the output directory: the C source,
//! the label mapping file and a manifest tying both to the input bundle.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::info;

use crate::bundle::ModelBundle;
use crate::canon::{blake3_hex, to_canonical_json};
use crate::codegen;
use crate::config::CompilerConfig;
use crate::errors::Result;

/// Compile manifest, stored as canonical JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileManifest {
    pub compiler_version: String,
    pub bundle_blake3: String,
    pub source_blake3: String,
    pub labels_blake3: String,
    pub source_file: String,
    pub label_file: String,
    pub vocabulary_size: usize,
    pub max_features: usize,
    pub service_trees: usize,
    pub activity_trees: usize,
    pub service_classes: usize,
    pub activity_classes: usize,
}

/// Paths written by [`write_artifacts`]
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub source: PathBuf,
    pub labels: PathBuf,
    pub manifest: PathBuf,
}

/// Compile `bundle` and write all artifacts.
pub fn write_artifacts(
    bundle: &ModelBundle,
    config: &CompilerConfig,
) -> Result<(CompileManifest, ArtifactPaths)> {
    let ensembles = bundle.ensembles()?;
    let label_maps = bundle.label_maps();
    let unit = codegen::lower(
        &ensembles,
        &bundle.vocabulary,
        &label_maps,
        config.max_features,
    )?;
    let source = codegen::render(&unit);
    let labels = label_maps.to_text()?;

    let manifest = CompileManifest {
        compiler_version: env!("CARGO_PKG_VERSION").to_string(),
        bundle_blake3: bundle.hash_hex()?,
        source_blake3: blake3_hex(source.as_bytes()),
        labels_blake3: blake3_hex(labels.as_bytes()),
        source_file: config.source_file.clone(),
        label_file: config.label_file.clone(),
        vocabulary_size: bundle.vocabulary.len(),
        max_features: unit.max_features,
        service_trees: ensembles.service.num_trees(),
        activity_trees: ensembles.activity.num_trees(),
        service_classes: ensembles.service.num_classes,
        activity_classes: ensembles.activity.num_classes,
    };

    fs::create_dir_all(&config.output_dir)?;
    let paths = ArtifactPaths {
        source: config.source_path(),
        labels: config.label_path(),
        manifest: config.manifest_path(),
    };

    fs::write(&paths.source, &source)?;
    info!("C code has been written to {}", paths.source.display());
    fs::write(&paths.labels, &labels)?;
    info!("Label mappings saved to {}", paths.labels.display());
    fs::write(&paths.manifest, to_canonical_json(&manifest)?)?;
    info!(
        "Manifest written to {} (source {})",
        paths.manifest.display(),
        &manifest.source_blake3[..16]
    );

    Ok((manifest, paths))
}

/// Read back a manifest written by [`write_artifacts`].
pub fn read_manifest(path: &std::path::Path) -> Result<CompileManifest> {
    Ok(serde_json::from_slice(&fs::read(path)?)?)
}
