use predicates::prelude::*;
use std::process::Command;
use tempfile::TempDir;

fn cmd() -> assert_cmd::Command {
    assert_cmd::Command::from(Command::new(env!("CARGO_BIN_EXE_docweave")))
}

fn fixture_path(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

// -- stdin mode --

#[test]
fn stdin_mode_produces_text() {
    let input = std::fs::read_to_string(fixture_path("mesh.json")).unwrap();
    let expected = std::fs::read_to_string(fixture_path("mesh.expected.txt")).unwrap();

    let assert = cmd().write_stdin(input).assert().success();
    let output = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert_eq!(output, expected);
}

#[test]
fn stdin_mode_json_format() {
    let input = std::fs::read_to_string(fixture_path("mesh.json")).unwrap();

    let assert = cmd()
        .args(["-f", "json"])
        .write_stdin(input)
        .assert()
        .success();
    let output = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&output).unwrap();

    let child = &value["classes"][1];
    assert_eq!(child["name"], "mesh.ChildClass");
    // The child constructor lost its catch-all and gained the inherited
    // keyword-only parameters.
    let params = child["methods"][0]["signature"].as_array().unwrap();
    let names: Vec<&str> = params.iter().map(|p| p["name"].as_str().unwrap()).collect();
    assert_eq!(
        names,
        ["self", "arg1", "a_new_arg", "arg2", "arg3", "even_more", "but_not_too_much"]
    );
    assert_eq!(params[3]["kind"], "keyword_only");
}

#[test]
fn stdin_mode_rejects_unordered_bases() {
    let input = r#"{"classes": [{"name": "m.B", "bases": ["m.A"]}]}"#;
    cmd()
        .write_stdin(input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("registration failed"));
}

#[test]
fn stdin_mode_reports_broken_references() {
    let input = r#"{"classes": [{"name": "m.A", "doc": "Doc\n\nParameters\n----------\n%(ghost.Target.arg)\n"}]}"#;
    cmd()
        .write_stdin(input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("ghost.Target"));
}

// -- file mode --

#[test]
fn file_mode_creates_output() {
    let dir = TempDir::new().unwrap();

    cmd()
        .args(["-o", dir.path().to_str().unwrap()])
        .arg(fixture_path("mesh.json"))
        .assert()
        .success();

    let output = std::fs::read_to_string(dir.path().join("mesh.txt")).unwrap();
    let expected = std::fs::read_to_string(fixture_path("mesh.expected.txt")).unwrap();
    assert_eq!(output, expected);
}

#[test]
fn file_mode_requires_output() {
    cmd()
        .arg(fixture_path("mesh.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("--output is required"));
}

#[test]
fn file_mode_json_extension() {
    let dir = TempDir::new().unwrap();

    cmd()
        .args(["-o", dir.path().to_str().unwrap(), "-f", "json"])
        .arg(fixture_path("mesh.json"))
        .assert()
        .success();

    assert!(dir.path().join("mesh.json").exists());
}

// -- flags --

#[test]
fn no_signature_flag_keeps_original_parameters() {
    let input = std::fs::read_to_string(fixture_path("mesh.json")).unwrap();

    let assert = cmd()
        .args(["--no-signature", "-f", "json"])
        .write_stdin(input)
        .assert()
        .success();
    let output = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&output).unwrap();

    // Docstrings are rewritten, signatures are not.
    let child = &value["classes"][1];
    assert!(child["doc"].as_str().unwrap().contains("arg2 : int"));
    let params = child["methods"][0]["signature"].as_array().unwrap();
    let names: Vec<&str> = params.iter().map(|p| p["name"].as_str().unwrap()).collect();
    assert_eq!(names, ["self", "arg1", "a_new_arg", "kwargs"]);
}

#[test]
fn strict_flag_surfaces_formatting_mistakes() {
    let input = r#"{"classes": [{"name": "m.A", "doc": "Doc\n\nParameters\n---\nx : int\n"}]}"#;

    cmd().write_stdin(input).assert().success();
    cmd()
        .arg("--strict")
        .write_stdin(input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Parameters"));
}

#[test]
fn unknown_format_is_rejected() {
    let input = std::fs::read_to_string(fixture_path("mesh.json")).unwrap();
    cmd()
        .args(["-f", "yaml"])
        .write_stdin(input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown format"));
}
