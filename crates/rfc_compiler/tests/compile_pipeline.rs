//! Integration tests for the artifact writer
//!
//! Same bundle in, byte-identical artifacts out.

use anyhow::Result;
use apiclass_rfc_compiler::canon::blake3_hex;
use apiclass_rfc_compiler::synth::{synthetic_bundle, SynthSpec};
use apiclass_rfc_compiler::{
    read_manifest, write_artifacts, CompileError, CompilerConfig, LabelMaps, ModelBundle,
};
use std::fs;
use tempfile::TempDir;

fn config_in(dir: &TempDir) -> CompilerConfig {
    CompilerConfig {
        output_dir: dir.path().join("codegen"),
        ..Default::default()
    }
}

#[test]
fn test_artifacts_are_deterministic() -> Result<()> {
    let bundle = synthetic_bundle(11, &SynthSpec::default())?;
    let first_dir = TempDir::new()?;
    let second_dir = TempDir::new()?;

    let (first, first_paths) = write_artifacts(&bundle, &config_in(&first_dir))?;
    let (second, second_paths) = write_artifacts(&bundle, &config_in(&second_dir))?;

    assert_eq!(first, second, "Manifests should be identical");
    assert_eq!(
        fs::read(&first_paths.source)?,
        fs::read(&second_paths.source)?,
        "Generated source should be identical"
    );
    assert_eq!(
        fs::read(&first_paths.manifest)?,
        fs::read(&second_paths.manifest)?,
        "Manifest bytes should be identical"
    );
    Ok(())
}

#[test]
fn test_manifest_describes_artifacts() -> Result<()> {
    let bundle = synthetic_bundle(12, &SynthSpec::default())?;
    let dir = TempDir::new()?;
    let config = config_in(&dir);
    let (manifest, paths) = write_artifacts(&bundle, &config)?;

    assert_eq!(paths.source, config.output_dir.join("api_classifier.c"));
    assert_eq!(manifest.source_blake3, blake3_hex(&fs::read(&paths.source)?));
    assert_eq!(manifest.labels_blake3, blake3_hex(&fs::read(&paths.labels)?));
    assert_eq!(manifest.bundle_blake3, bundle.hash_hex()?);
    assert_eq!(manifest.vocabulary_size, bundle.vocabulary.len());
    assert_eq!(manifest.max_features, bundle.vocabulary.len());
    assert_eq!(manifest.service_trees, 5);
    assert_eq!(manifest.service_classes, bundle.service.labels.len());

    let raw = fs::read_to_string(&paths.manifest)?;
    assert!(raw.starts_with("{\"activity_classes\":"), "keys are sorted: {raw}");
    assert_eq!(read_manifest(&paths.manifest)?, manifest);

    let labels = LabelMaps::load(&paths.labels)?;
    assert_eq!(labels, bundle.label_maps());
    Ok(())
}

#[test]
fn test_bundle_file_round_trip() -> Result<()> {
    let bundle = synthetic_bundle(13, &SynthSpec::default())?;
    let dir = TempDir::new()?;
    let path = dir.path().join("bundle.json");
    bundle.save(&path)?;

    let loaded = ModelBundle::load(&path)?;
    assert_eq!(loaded, bundle);
    assert_eq!(loaded.hash_hex()?, bundle.hash_hex()?);
    Ok(())
}

#[test]
fn test_max_features_override() -> Result<()> {
    let bundle = synthetic_bundle(14, &SynthSpec::default())?;
    let dir = TempDir::new()?;

    let mut config = config_in(&dir);
    config.max_features = Some(5000);
    let (manifest, paths) = write_artifacts(&bundle, &config)?;
    assert_eq!(manifest.max_features, 5000);
    assert!(fs::read_to_string(&paths.source)?.contains("#define MAX_FEATURES 5000\n"));

    config.max_features = Some(3);
    assert!(matches!(
        write_artifacts(&bundle, &config),
        Err(CompileError::FeatureIndexOutOfRange { .. })
    ));
    Ok(())
}

#[test]
fn test_unlabelled_class_fails_before_writing() -> Result<()> {
    let mut bundle = synthetic_bundle(15, &SynthSpec::default())?;
    bundle.activity.labels.truncate(1);
    bundle.activity.num_classes = Some(4);

    let dir = TempDir::new()?;
    let config = config_in(&dir);
    let result = write_artifacts(&bundle, &config);
    assert!(matches!(result, Err(CompileError::MissingLabel { .. })));
    assert!(!config.source_path().exists());
    Ok(())
}
