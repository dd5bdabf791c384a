//! CLI behaviour: output paths, overwrite protection and exit codes

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn fixture(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(path)
}

fn run(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_jsonschema-transform"))
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .unwrap()
}

#[test]
fn test_d2_writes_default_output() {
    let dir = TempDir::new().unwrap();
    let input = fixture("cycle/a.json");

    let output = run(dir.path(), &["d2", input.to_str().unwrap()]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let diagram = fs::read_to_string(dir.path().join("diagram.d2")).unwrap();
    assert!(diagram.starts_with("A: {\n  shape: class\n"));
    assert!(diagram.ends_with("A -- B: associates\nB -- A: associates"));
}

#[test]
fn test_refuses_to_overwrite() {
    let dir = TempDir::new().unwrap();
    let input = fixture("cycle/a.json");
    fs::write(dir.path().join("out.d2"), "keep").unwrap();

    let output = run(dir.path(), &["d2", "-o", "out.d2", input.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("overwrite"));
    assert_eq!(fs::read_to_string(dir.path().join("out.d2")).unwrap(), "keep");

    let output = run(dir.path(), &["d2", "-o", "out.d2", "--overwrite", input.to_str().unwrap()]);
    assert!(output.status.success());
    assert_ne!(fs::read_to_string(dir.path().join("out.d2")).unwrap(), "keep");
}

#[test]
fn test_depth_flag() {
    let dir = TempDir::new().unwrap();
    let input = fixture("chain/root.json");

    let output = run(dir.path(), &["d2", "--depth", "0", input.to_str().unwrap()]);
    assert!(output.status.success());
    assert_eq!(
        fs::read_to_string(dir.path().join("diagram.d2")).unwrap(),
        "Root: {\n  shape: class\n  \"mid\": \"object\"\n}\n\n"
    );
}

#[test]
fn test_json_subcommand() {
    let dir = TempDir::new().unwrap();
    let input = fixture("petstore");

    let output = run(dir.path(), &["json", input.to_str().unwrap()]);
    assert!(output.status.success());

    let content = fs::read_to_string(dir.path().join("diagram.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(value["classes"].as_array().unwrap().len(), 3);
}

#[test]
fn test_output_template_from_flag_and_config() {
    let dir = TempDir::new().unwrap();
    let input = fixture("cycle/a.json");

    let output = run(dir.path(), &["json", "-o", "flag.%s", input.to_str().unwrap()]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(dir.path().join("flag.json").exists());

    fs::write(dir.path().join("custom.toml"), "[output]\npath = \"nested/config.%s\"\n").unwrap();
    let output = run(dir.path(), &["d2", "--config", "custom.toml", input.to_str().unwrap()]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(dir.path().join("nested/config.d2").exists());
}

#[test]
fn test_unknown_output_format() {
    let dir = TempDir::new().unwrap();
    let input = fixture("cycle/a.json");

    let output = run(dir.path(), &["d2", "-o", "diagram.svg", input.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown format"));
}

#[test]
fn test_no_inputs() {
    let dir = TempDir::new().unwrap();
    let output = run(dir.path(), &["d2"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("no input files"));
}
