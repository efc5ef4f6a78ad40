//! End-to-end tests for the `stitch` binary.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::tempdir;

fn stitch(args: &[&Path]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_stitch"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to run stitch")
}

fn stitch_str(args: &[&str]) -> Output {
    let paths: Vec<&Path> = args.iter().map(Path::new).collect();
    stitch(&paths)
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn write_scene(dir: &Path, name: &str, seed: u64) -> String {
    let path = dir.join(name).to_string_lossy().into_owned();
    let output = stitch_str(&["write-random-scene", &path, "--seed", &seed.to_string()]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(stdout(&output).trim(), format!("Wrote USD scene to: {}", path));
    path
}

#[test]
fn test_generate_compose_validate() {
    let dir = tempdir().unwrap();
    let a = write_scene(dir.path(), "a.usda", 1);
    let b = write_scene(dir.path(), "b.usda", 2);
    let merged = dir.path().join("out/merged.usda").to_string_lossy().into_owned();

    let output = stitch_str(&["compose", &a, &b, &merged]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), format!("Composed {} + {} → {}", a, b, merged));

    let output = stitch_str(&["validate", &a, &b, &merged]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        stdout(&output).trim(),
        "Validation PASSED: composed USD contains all expected data."
    );
}

#[test]
fn test_same_seed_writes_identical_files() {
    let dir = tempdir().unwrap();
    let first = write_scene(dir.path(), "first.usda", 9);
    let second = write_scene(dir.path(), "second.usda", 9);
    assert_eq!(fs::read_to_string(first).unwrap(), fs::read_to_string(second).unwrap());
}

#[test]
fn test_config_file() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("config.json");
    fs::write(&config, r#"{ "seed": 3, "min_cubes": 1, "max_cubes": 1 }"#).unwrap();
    let out = dir.path().join("scene.usda");

    let output = stitch(&[
        Path::new("write-random-scene"),
        &out,
        Path::new("--config"),
        &config,
    ]);
    assert!(output.status.success());
    let text = fs::read_to_string(out).unwrap();
    assert_eq!(text.matches("def Cube ").count(), 1);
}

#[test]
fn test_truncated_merge_fails_validation() {
    let dir = tempdir().unwrap();
    let a = write_scene(dir.path(), "a.usda", 1);
    let b = write_scene(dir.path(), "b.usda", 2);

    // Scene A alone is missing everything B contributed
    let output = stitch_str(&["validate", &a, &b, &a]);
    assert_eq!(output.status.code(), Some(1));
    let text = stdout(&output);
    assert!(text.starts_with("Validation FAILED:"));
    assert!(text.contains("Missing prims:"));
    assert!(text.contains("  - /World/Camera_"));
}

#[test]
fn test_json_report() {
    let dir = tempdir().unwrap();
    let a = write_scene(dir.path(), "a.usda", 4);
    let b = write_scene(dir.path(), "b.usda", 5);

    let output = stitch_str(&["validate", &a, &b, &b, "--json"]);
    assert_eq!(output.status.code(), Some(1));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["passed"], serde_json::json!(false));
    assert!(!json["report"]["missing_prims"].as_array().unwrap().is_empty());
    assert!(json["report"]["variant_issues"].as_array().unwrap().is_empty());
}

#[test]
fn test_errors_exit_with_code_two() {
    let dir = tempdir().unwrap();
    let bad = dir.path().join("bad.usda");
    fs::write(&bad, "#usda 1.0\ndef Xform \"World\" {\n").unwrap();
    let bad = bad.to_string_lossy().into_owned();
    let good = write_scene(dir.path(), "good.usda", 1);
    let out = dir.path().join("out.usda").to_string_lossy().into_owned();

    let output = stitch_str(&["compose", &good, &bad, &out]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("bad.usda"));
    assert!(!Path::new(&out).exists());

    let missing = dir.path().join("missing.usda").to_string_lossy().into_owned();
    let output = stitch_str(&["validate", &good, &missing, &good]);
    assert_eq!(output.status.code(), Some(2));
}
