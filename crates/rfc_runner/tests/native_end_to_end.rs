//! Compile the generated C with the host C compiler and check the real
//! executable against the reference evaluator.
//!
//! Skipped when no `cc` is on the PATH.

use anyhow::{ensure, Result};
use apiclass_rfc_compiler::synth::{synthetic_bundle, SynthSpec};
use apiclass_rfc_compiler::{write_artifacts, CompilerConfig, ReferencePredictor, Request};
use apiclass_rfc_runner::{build_args, BatchRunner, CompiledClassifier, RunnerConfig};
use std::path::Path;
use std::process::Command;

fn have_cc() -> bool {
    Command::new("cc")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn build(source: &Path, executable: &Path) -> Result<()> {
    let output = Command::new("cc")
        .args(["-std=c99", "-O2", "-o"])
        .arg(executable)
        .arg(source)
        .output()?;
    ensure!(
        output.status.success(),
        "cc failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    Ok(())
}

fn requests() -> Vec<Request> {
    let raw = [
        [
            Some("www.dropbox.com"),
            Some("https://www.dropbox.com/cmd/upload_precheck"),
            Some("POST"),
            None,
            None,
            Some("text/plain; charset=utf-8"),
            None,
            None,
        ],
        [
            Some("api.box.com"),
            Some("/2.0/files/content?token=abc"),
            Some("GET"),
            Some("https://app.box.com"),
            Some("application/json"),
            Some("application/octet-stream"),
            Some("https://app.box.com/folder/0"),
            Some("*/*"),
        ],
        [
            Some("login.live.com"),
            Some("/oauth20_token.srf"),
            Some("POST"),
            Some("nan"),
            Some("application/x-www-form-urlencoded"),
            Some("application/json; charset=utf-8"),
            Some(""),
            Some("application/json"),
        ],
        [None; 8],
    ];
    raw.into_iter()
        .map(|fields| Request::from_fields(fields.map(|f| f.map(str::to_string))))
        .collect()
}

#[test]
fn test_native_executable_matches_reference() -> Result<()> {
    if !have_cc() {
        eprintln!("cc not available; skipping native end-to-end test");
        return Ok(());
    }

    let dir = tempfile::tempdir()?;
    let bundle = synthetic_bundle(20_240_501, &SynthSpec::default())?;
    let compile_config = CompilerConfig {
        output_dir: dir.path().to_path_buf(),
        ..Default::default()
    };
    let (_, paths) = write_artifacts(&bundle, &compile_config)?;

    let runner_config = RunnerConfig {
        artifact_dir: dir.path().to_path_buf(),
        ..Default::default()
    };
    build(&paths.source, &runner_config.executable_path())?;

    let classifier = CompiledClassifier::from_config(&runner_config);
    let reference = ReferencePredictor::from_bundle(&bundle, None)?;

    for request in requests() {
        // The executable only ever sees the sanitized arguments
        let args = build_args(&request);
        let fields: [Option<&str>; 8] = std::array::from_fn(|i| Some(args[i].as_str()));
        let expected = reference.predict_fields(&fields);

        let prediction = classifier.predict(&request)?;
        assert_eq!(prediction.ids(), expected, "request {request:?}");
        assert_eq!(
            prediction.service.as_deref(),
            Some(bundle.service.labels[expected.service_id].as_str())
        );
        assert_eq!(
            prediction.activity.as_deref(),
            Some(bundle.activity.labels[expected.activity_id].as_str())
        );
    }

    let report = BatchRunner::new(classifier).with_workers(2).run(&requests())?;
    assert_eq!(report.failed(), 0);
    assert_eq!(report.results.len(), 4);
    Ok(())
}

#[test]
fn test_native_executable_tolerates_missing_arguments() -> Result<()> {
    if !have_cc() {
        eprintln!("cc not available; skipping native end-to-end test");
        return Ok(());
    }

    let dir = tempfile::tempdir()?;
    let bundle = synthetic_bundle(7, &SynthSpec::default())?;
    let compile_config = CompilerConfig {
        output_dir: dir.path().to_path_buf(),
        ..Default::default()
    };
    let (_, paths) = write_artifacts(&bundle, &compile_config)?;
    let executable = dir.path().join("api_classifier_short");
    build(&paths.source, &executable)?;

    let output = Command::new(&executable).arg("www.dropbox.com").output()?;
    ensure!(output.status.success(), "executable failed");
    assert!(String::from_utf8_lossy(&output.stderr).contains("Warning"));

    let ids = apiclass_rfc_runner::parse_output(&String::from_utf8_lossy(&output.stdout))?;
    let reference = ReferencePredictor::from_bundle(&bundle, None)?;
    let mut fields = [Some(""); 8];
    fields[0] = Some("www.dropbox.com");
    assert_eq!(ids, reference.predict_fields(&fields));
    Ok(())
}
