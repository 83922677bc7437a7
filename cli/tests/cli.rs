use assert_cmd::Command;
use predicates::prelude::*;

fn rehydrate_cmd() -> Command {
    Command::cargo_bin("rehydrate").unwrap()
}

#[test]
fn tree_document_prints_json() {
    rehydrate_cmd()
        .arg("--indent")
        .arg("0")
        .write_stdin(r#"{"a":[1,2],"b":"x"}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"{"a":[1,2],"b":"x"}"#));
}

#[test]
fn shared_document_needs_stats_mode() {
    let input = r#"[{"x":1},{"$ref":"$[0]"}]"#;

    rehydrate_cmd()
        .write_stdin(input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("shared or cyclic"));

    rehydrate_cmd()
        .arg("--stats")
        .write_stdin(input)
        .assert()
        .success()
        .stdout(predicate::str::contains("shared: 1"))
        .stdout(predicate::str::contains("cyclic: no"));
}

#[test]
fn cyclic_document_stats() {
    rehydrate_cmd()
        .arg("--stats")
        .write_stdin(r#"{"a":{"$ref":"$"}}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains("cyclic: yes"));
}

#[test]
fn check_mode_reports_bad_reference() {
    rehydrate_cmd()
        .arg("--check")
        .write_stdin(r#"[{"$ref":"$[5]"}]"#)
        .assert()
        .failure()
        .stderr(predicate::str::contains("$[5]"));

    rehydrate_cmd()
        .arg("--check")
        .write_stdin(r#"{"a":{"$ref":"$"}}"#)
        .assert()
        .success();
}

#[test]
fn strict_markers_flag_changes_marker_shape() {
    // With an extra member the object is data under --strict-markers, so the
    // document stays a tree and exports cleanly.
    let input = r#"[{"x":1},{"$ref":"$[0]","note":"kept"}]"#;

    rehydrate_cmd().write_stdin(input).assert().failure();

    rehydrate_cmd()
        .arg("--strict-markers")
        .arg("--indent")
        .arg("0")
        .write_stdin(input)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""note":"kept""#));
}

#[test]
fn writes_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.json");

    rehydrate_cmd()
        .arg("--indent")
        .arg("0")
        .arg("--output")
        .arg(out.to_str().unwrap())
        .write_stdin(r#"{"k":true}"#)
        .assert()
        .success();

    let written = std::fs::read_to_string(&out).unwrap();
    assert_eq!(written.trim(), r#"{"k":true}"#);
}

#[test]
fn max_depth_flag_limits_nesting() {
    rehydrate_cmd()
        .arg("--check")
        .arg("--max-depth")
        .arg("2")
        .write_stdin(r#"{"a":{"b":1}}"#)
        .assert()
        .failure()
        .stderr(predicate::str::contains("depth limit"));

    // library default applies when the flag is omitted
    rehydrate_cmd()
        .arg("--check")
        .write_stdin(r#"{"a":{"b":1}}"#)
        .assert()
        .success();
}

#[test]
fn invalid_json_fails() {
    rehydrate_cmd()
        .write_stdin("{")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid json"));
}
