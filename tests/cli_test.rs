//! Integration tests for the results, submit, config and watch commands.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

/// Command with an isolated config file and directory layout.
fn ecovision(dir: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("ecovision");
    cmd.env_remove("RUST_LOG")
        .arg("--config")
        .arg(dir.join("config.toml"))
        .arg("--uploads-dir")
        .arg(dir.join("uploads"))
        .arg("--processed-dir")
        .arg(dir.join("processed"))
        .arg("--results-dir")
        .arg(dir.join("results"));
    cmd
}

fn write_result(dir: &Path, id: &str, label: &str) {
    let results = dir.join("results");
    std::fs::create_dir_all(&results).unwrap();
    let doc = serde_json::json!({
        "image_path": format!("processed/{id}.jpg"),
        "original_path": format!("uploads/{id}.jpg"),
        "latitude": 60.17,
        "longitude": 24.94,
        "timestamp": 1_700_000_000.5,
        "datetime": "2023-11-14T22:13:20.500+00:00",
        "detected_objects": [label],
    });
    std::fs::write(results.join(format!("{id}.json")), doc.to_string()).unwrap();
}

#[test]
fn test_results_list_empty() {
    let dir = TempDir::new().unwrap();
    let output = ecovision(dir.path())
        .args(["results", "list"])
        .assert()
        .success();

    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let json: Value = serde_json::from_str(&stdout).expect("valid JSON output");
    assert_eq!(json, Value::Array(vec![]));
}

#[test]
fn test_results_list_and_get() {
    let dir = TempDir::new().unwrap();
    write_result(dir.path(), "beach_1700000000", "plastic_bottle");
    write_result(dir.path(), "park_1700000100", "can");

    let output = ecovision(dir.path())
        .args(["results", "list"])
        .assert()
        .success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let json: Value = serde_json::from_str(&stdout).expect("valid JSON output");
    assert_eq!(json.as_array().map(Vec::len), Some(2));

    let output = ecovision(dir.path())
        .args(["results", "get", "park"])
        .assert()
        .success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let json: Value = serde_json::from_str(&stdout).expect("valid JSON output");
    assert_eq!(json["detected_objects"][0], "can");
    assert_eq!(json["latitude"], 60.17);
}

#[test]
fn test_results_get_not_found() {
    let dir = TempDir::new().unwrap();
    write_result(dir.path(), "beach_1700000000", "can");

    ecovision(dir.path())
        .args(["results", "get", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("result not found: missing"));
}

#[test]
fn test_submit_queues_into_inbox() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("street photo.jpg");
    std::fs::write(&source, b"jpeg bytes").unwrap();

    ecovision(dir.path())
        .arg("submit")
        .arg(&source)
        .assert()
        .success()
        .stdout(predicate::str::contains("street_photo.jpg"));

    let queued = dir.path().join("uploads").join("street_photo.jpg");
    assert_eq!(std::fs::read(queued).unwrap(), b"jpeg bytes");
}

#[test]
fn test_submit_rejects_missing_and_non_image_files() {
    let dir = TempDir::new().unwrap();

    ecovision(dir.path())
        .arg("submit")
        .arg(dir.path().join("nope.jpg"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("no such file"));

    let notes = dir.path().join("notes.txt");
    std::fs::write(&notes, b"text").unwrap();
    ecovision(dir.path())
        .arg("submit")
        .arg(&notes)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid upload file name"));
}

#[test]
fn test_config_path_and_init() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.toml");

    ecovision(dir.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));

    ecovision(dir.path())
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created configuration file"));
    let contents = std::fs::read_to_string(&config).unwrap();
    assert!(contents.contains("confidence_threshold"));

    ecovision(dir.path())
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn test_config_file_values_are_used() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("config.toml"),
        "[detection]\nconfidence_threshold = 0.75\n",
    )
    .unwrap();

    ecovision(dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0.75"));
}

#[test]
fn test_watch_without_model_fails() {
    let dir = TempDir::new().unwrap();

    ecovision(dir.path())
        .arg("watch")
        .env_remove("ECOVISION_MODEL_PATH")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no model specified"));
}

#[test]
fn test_watch_with_missing_model_fails() {
    let dir = TempDir::new().unwrap();

    ecovision(dir.path())
        .args(["watch", "--model-path"])
        .arg(dir.path().join("missing.onnx"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("model file does not exist"));
}

#[test]
fn test_watch_rejects_invalid_config() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("config.toml"), "[watcher]\nworkers = 0\n").unwrap();

    ecovision(dir.path())
        .arg("watch")
        .assert()
        .failure()
        .stderr(predicate::str::contains("workers must be at least 1"));
}
