//! Integration tests for the `mozaic` binary.

use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

fn cargo_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO"));
    cmd.args(["run", "-q", "-p", "mozaic-cli", "--bin", "mozaic", "--"]);
    cmd
}

/// A project whose sources are already JavaScript, so the identity compiler applies.
fn write_project(root: &Path) {
    fs::write(
        root.join("mozaic.json"),
        r#"{"baseUrl": "src/", "compiler": "identity", "host": "filesystem"}"#,
    )
    .unwrap();
    fs::create_dir_all(root.join("src/core")).unwrap();
    fs::write(
        root.join("src/core/constants.coffee"),
        "define({answer: 42});\n",
    )
    .unwrap();
    fs::write(
        root.join("src/main.coffee"),
        "define(['cs!core/constants'], function (c) {\n  return c.answer;\n});\n",
    )
    .unwrap();
}

#[test]
fn test_version_output() {
    let output = cargo_bin()
        .arg("version")
        .output()
        .expect("Failed to run version command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("mozaic "), "unexpected output: {stdout}");
    assert!(stdout.contains("cs! plugin 0.4.3"));
}

#[test]
fn test_probe_embedded_json() {
    let dir = tempdir().unwrap();
    let output = cargo_bin()
        .arg("--cwd")
        .arg(dir.path())
        .args(["--json", "probe", "--host", "embedded"])
        .output()
        .expect("Failed to run probe command");

    assert!(output.status.success());
    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be valid JSON");
    assert_eq!(json["strategy"], "embedded");
    assert_eq!(json["inline_source_maps"], false);
}

#[test]
fn test_compile_prints_directives() {
    let dir = tempdir().unwrap();
    write_project(dir.path());

    let output = cargo_bin()
        .arg("--cwd")
        .arg(dir.path())
        .args(["compile", "core/constants"])
        .output()
        .expect("Failed to run compile command");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("define({answer: 42});"));
    assert!(stdout.contains("\n//@ sourceURL=src/core/constants.js"));
    assert!(stdout.contains("\n//@ sourceMappingURL=data:application/json;base64,"));
}

#[test]
fn test_compile_missing_module_json_error() {
    let dir = tempdir().unwrap();
    write_project(dir.path());

    let output = cargo_bin()
        .arg("--cwd")
        .arg(dir.path())
        .args(["--json", "compile", "nope"])
        .output()
        .expect("Failed to run compile command");

    assert!(!output.status.success());
    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be valid JSON");
    assert_eq!(json["ok"], false);
    assert_eq!(json["error"]["code"], "FETCH_IO_ERROR");
    assert_eq!(json["error"]["module"], "nope");
}

#[test]
fn test_bundle_all_writes_named_defines() {
    let dir = tempdir().unwrap();
    write_project(dir.path());

    let output = cargo_bin()
        .arg("--cwd")
        .arg(dir.path())
        .args(["--json", "bundle", "--all", "-o", "dist/app.js"])
        .output()
        .expect("Failed to run bundle command");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be valid JSON");
    assert_eq!(json["ok"], true);
    assert_eq!(
        json["modules"],
        serde_json::json!(["cs!core/constants", "cs!main"])
    );

    let bundle = fs::read_to_string(dir.path().join("dist/app.js")).unwrap();
    assert!(bundle.contains("define('cs!core/constants', {answer: 42});"));
    assert!(bundle.contains("define('cs!main', ['cs!core/constants'], function (c) {"));
}

#[test]
fn test_bundle_with_failure_writes_nothing() {
    let dir = tempdir().unwrap();
    write_project(dir.path());

    let output = cargo_bin()
        .arg("--cwd")
        .arg(dir.path())
        .args(["--json", "bundle", "main", "missing", "-o", "app.js"])
        .output()
        .expect("Failed to run bundle command");

    assert!(!output.status.success());
    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be valid JSON");
    assert_eq!(json["ok"], false);
    assert_eq!(json["errors"][0]["module"], "missing");
    assert!(!dir.path().join("app.js").exists());
}
