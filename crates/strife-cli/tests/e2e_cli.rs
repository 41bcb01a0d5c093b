//! End-to-end tests for the `strife` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn strife() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("strife"));
    cmd.env("STRIFE_LOG", "error").env_remove("FORMAT");
    cmd
}

/// Two rival houses joined through a broker, plus one dangling relation.
fn world() -> Value {
    json!({
        "entities": [
            {"id": "aldric", "name": "Aldric", "type": "character", "domain": "north"},
            {"id": "bryn", "name": "Bryn", "type": "character", "domain": "north"},
            {"id": "cael", "name": "Cael", "type": "character", "domain": "north"},
            {"id": "dara", "name": "Dara", "type": "faction", "domain": "south"},
            {"id": "eamon", "name": "Eamon", "type": "faction", "domain": "south"},
            {"id": "fen", "name": "Fen", "type": "faction", "domain": "south"}
        ],
        "relations": [
            {"source_id": "aldric", "target_id": "bryn", "relation_type": "rivalry", "strength": 0.9},
            {"source_id": "bryn", "target_id": "cael", "strength": 0.6},
            {"source_id": "cael", "target_id": "aldric", "strength": 0.7},
            {"source_id": "cael", "target_id": "dara", "strength": 0.3},
            {"source_id": "dara", "target_id": "eamon", "strength": 0.8},
            {"source_id": "eamon", "target_id": "fen", "strength": 0.5},
            {"source_id": "fen", "target_id": "dara", "strength": 0.4},
            {"source_id": "fen", "target_id": "ghost", "strength": 0.2}
        ]
    })
}

fn write_world(dir: &Path) -> PathBuf {
    let path = dir.join("world.json");
    std::fs::write(&path, serde_json::to_vec_pretty(&world()).expect("serialize")).expect("write world");
    path
}

fn write_config(dir: &Path) -> PathBuf {
    let path = dir.join("strife.toml");
    std::fs::write(
        &path,
        "[propagation]\ntrials = 16\nmax_steps = 10\n\n[robustness]\nrandom_trials = 4\n",
    )
    .expect("write config");
    path
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

#[test]
fn analyze_json_has_every_section() {
    let dir = TempDir::new().expect("tempdir");
    let input = write_world(dir.path());
    let config = write_config(dir.path());

    let output = strife()
        .args(["analyze", "--json", "--config"])
        .arg(&config)
        .arg(&input)
        .output()
        .expect("run");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let report = stdout_json(&output);
    for key in ["graph", "topology", "intensity", "communities", "centrality", "propagation", "robustness", "issues", "failures"] {
        assert!(report.get(key).is_some(), "missing {key}");
    }
    assert_eq!(report["graph"]["node_count"], 6);
    assert_eq!(report["graph"]["edge_count"], 7);
    assert_eq!(report["topology"]["component_count"], 1);
    assert_eq!(report["propagation"]["trials"], 16);
    assert_eq!(report["failures"].as_array().map(Vec::len), Some(0));
    let issues = report["issues"].as_array().expect("issues array");
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0]["kind"], "dangling_reference");
    let cuts = report["robustness"]["articulation_points"].as_array().expect("cuts");
    assert_eq!(cuts, &vec![json!("cael"), json!("dara")]);
}

#[test]
fn analyze_is_deterministic() {
    let dir = TempDir::new().expect("tempdir");
    let input = write_world(dir.path());
    let config = write_config(dir.path());

    let run = || {
        strife()
            .args(["analyze", "--format", "json", "--config"])
            .arg(&config)
            .arg(&input)
            .output()
            .expect("run")
            .stdout
    };
    assert_eq!(run(), run());
}

#[test]
fn analyze_text_and_pretty_modes() {
    let dir = TempDir::new().expect("tempdir");
    let input = write_world(dir.path());
    let config = write_config(dir.path());

    strife()
        .args(["analyze", "--format", "text", "--config"])
        .arg(&config)
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("graph.nodes=6"))
        .stdout(predicate::str::contains("issues=1"));

    strife()
        .args(["analyze", "--format", "pretty", "--config"])
        .arg(&config)
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Communities"))
        .stdout(predicate::str::contains("Robustness"));
}

#[test]
fn format_env_selects_json_when_piped() {
    let dir = TempDir::new().expect("tempdir");
    let input = write_world(dir.path());

    let output = strife().env("FORMAT", "json").arg("validate").arg(&input).output().expect("run");
    assert!(output.status.success());
    let summary = stdout_json(&output);
    assert_eq!(summary["nodes"], 6);
}

#[test]
fn analyze_missing_input_fails_with_code() {
    let dir = TempDir::new().expect("tempdir");
    let output = strife()
        .args(["analyze", "--json"])
        .arg(dir.path().join("absent.json"))
        .output()
        .expect("run");
    assert!(!output.status.success());
    let err: Value = serde_json::from_slice(&output.stderr).expect("stderr is JSON");
    assert_eq!(err["error"]["error_code"], "E1001");
}

#[test]
fn analyze_bad_config_fails() {
    let dir = TempDir::new().expect("tempdir");
    let input = write_world(dir.path());
    let config = dir.path().join("bad.toml");
    std::fs::write(&config, "[community\nresolution = ").expect("write");

    strife()
        .args(["analyze", "--format", "text", "--config"])
        .arg(&config)
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("E1005"));
}

#[test]
fn spread_from_seeds() {
    let dir = TempDir::new().expect("tempdir");
    let input = write_world(dir.path());

    let output = strife()
        .args(["spread", "--json", "--seed", "bryn", "--seed", "aldric", "--trials", "12"])
        .arg(&input)
        .output()
        .expect("run");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let outcome = stdout_json(&output);
    assert_eq!(outcome["seeds"], json!(["aldric", "bryn"]));
    assert_eq!(outcome["trials"], 12);
    let fraction = outcome["expected_affected_fraction"].as_f64().expect("fraction");
    assert!((2.0 / 6.0 - 1e-9..=1.0).contains(&fraction));
    let curve = outcome["curve"].as_array().expect("curve");
    assert!((curve[0].as_f64().expect("f64") - 2.0 / 6.0).abs() < 1e-9);
}

#[test]
fn spread_from_domain() {
    let dir = TempDir::new().expect("tempdir");
    let input = write_world(dir.path());

    let output = strife()
        .args(["spread", "--json", "--domain", "south", "--trials", "8"])
        .arg(&input)
        .output()
        .expect("run");
    assert!(output.status.success());
    let outcome = stdout_json(&output);
    assert_eq!(outcome["domain"], "south");
    assert_eq!(outcome["seeds"], json!(["dara", "eamon", "fen"]));
}

#[test]
fn spread_unknown_seed_fails() {
    let dir = TempDir::new().expect("tempdir");
    let input = write_world(dir.path());

    strife()
        .args(["spread", "--format", "text", "--seed", "nobody"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2001"))
        .stderr(predicate::str::contains("nobody"));
}

#[test]
fn json_failure_writes_one_document_to_stderr() {
    let dir = TempDir::new().expect("tempdir");
    let input = write_world(dir.path());

    let output = strife()
        .args(["spread", "--json", "--seed", "nobody"])
        .arg(&input)
        .output()
        .expect("run");
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).expect("utf8");
    assert!(!stderr.contains("Error:"), "stray report: {stderr}");
    let err: Value = serde_json::from_str(&stderr).expect("stderr is one JSON document");
    assert_eq!(err["error"]["error_code"], "E2001");
}

#[test]
fn json_config_failure_writes_one_document_to_stderr() {
    let dir = TempDir::new().expect("tempdir");
    let input = write_world(dir.path());
    let config = dir.path().join("bad.toml");
    std::fs::write(&config, "[community\nresolution = ").expect("write");

    let output = strife()
        .args(["analyze", "--json", "--config"])
        .arg(&config)
        .arg(&input)
        .output()
        .expect("run");
    assert!(!output.status.success());
    let err: Value = serde_json::from_slice(&output.stderr).expect("stderr is one JSON document");
    assert_eq!(err["error"]["error_code"], "E1005");
}

#[test]
fn spread_unknown_domain_fails() {
    let dir = TempDir::new().expect("tempdir");
    let input = write_world(dir.path());

    strife()
        .args(["spread", "--format", "text", "--domain", "west"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2002"));
}

#[test]
fn spread_requires_an_origin() {
    let dir = TempDir::new().expect("tempdir");
    let input = write_world(dir.path());

    strife().arg("spread").arg(&input).assert().failure();
}

#[test]
fn validate_reports_issues_but_succeeds() {
    let dir = TempDir::new().expect("tempdir");
    let input = write_world(dir.path());

    strife()
        .args(["validate", "--format", "text"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("edges=7"))
        .stdout(predicate::str::contains("issue=build/dangling_reference"));
}

#[test]
fn validate_yaml_input() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("world.yaml");
    std::fs::write(
        &path,
        "entities:\n  - {id: a, name: A, type: character}\n  - {id: b, name: B, type: location}\nrelations:\n  - {source_id: a, target_id: b, strength: 1.5}\n",
    )
    .expect("write");

    let output = strife().args(["validate", "--json"]).arg(&path).output().expect("run");
    assert!(output.status.success());
    let summary = stdout_json(&output);
    assert_eq!(summary["edges"], 1);
    assert_eq!(summary["issues"][0]["kind"], "out_of_range");
}

#[test]
fn validate_unsupported_format_fails() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("world.csv");
    std::fs::write(&path, "id,name\n").expect("write");

    strife()
        .args(["validate", "--format", "text"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("E1004"));
}
