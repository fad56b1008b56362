// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ciconf contributors

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

fn demo() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos/business-unit.yaml")
}

fn ciconf() -> Command {
    let mut cmd = Command::cargo_bin("ciconf").unwrap();
    cmd.env("NO_COLOR", "1").env_remove("CICONF_CONFIG");
    cmd
}

const CYCLIC: &str = r#"
projects:
  - id: _Root
    name: Root
    build_configs:
      - id: A
        name: A
        steps:
          - runner: { type: script, content: echo a }
        triggers:
          - { type: finish_build, upstream: B }
      - id: B
        name: B
        steps:
          - runner: { type: script, content: echo b }
        triggers:
          - { type: finish_build, upstream: A }
"#;

#[test]
fn test_validate_demo() {
    ciconf()
        .arg("validate")
        .arg("--config")
        .arg(demo())
        .assert()
        .success()
        .stdout(predicate::str::contains("Declarations are valid"));
}

#[test]
fn test_validate_json() {
    ciconf()
        .args(["validate", "--format", "json", "-c"])
        .arg(demo())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"diagnostics\""));
}

#[test]
fn test_validate_reports_cycle() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cyclic.yaml");
    std::fs::write(&path, CYCLIC).unwrap();

    ciconf()
        .arg("validate")
        .arg("-c")
        .arg(&path)
        .assert()
        .failure()
        .stdout(predicate::str::contains("A → B → A"))
        .stderr(predicate::str::contains("Validation failed"));
}

#[test]
fn test_missing_declarations() {
    let dir = TempDir::new().unwrap();

    ciconf()
        .arg("validate")
        .arg("-c")
        .arg(dir.path().join("nope.yaml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Declarations not found"));
}

#[test]
fn test_default_config_with_directory_flag() {
    let dir = TempDir::new().unwrap();
    std::fs::copy(demo(), dir.path().join(".ciconf.yaml")).unwrap();

    ciconf()
        .arg("-C")
        .arg(dir.path())
        .arg("validate")
        .assert()
        .success();
}

#[test]
fn test_resolve_single_configuration() {
    ciconf()
        .args(["resolve", "MavenBuild", "-c"])
        .arg(demo())
        .assert()
        .success()
        .stdout(predicate::str::contains("clean install"))
        .stdout(predicate::str::contains("https://github.com/example-org/tb-java.git"))
        .stdout(predicate::str::contains("%maven.goals%").not());
}

#[test]
fn test_resolve_unknown_configuration() {
    ciconf()
        .args(["resolve", "Nope", "-c"])
        .arg(demo())
        .assert()
        .failure();
}

#[test]
fn test_resolve_all_json() {
    ciconf()
        .args(["resolve", "--all", "--format", "json", "-c"])
        .arg(demo())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"order\""))
        .stdout(predicate::str::contains("\"Deploy\""));
}

#[test]
fn test_graph_mermaid() {
    ciconf()
        .args(["graph", "--format", "mermaid", "-c"])
        .arg(demo())
        .assert()
        .success()
        .stdout(predicate::str::starts_with("graph TD"))
        .stdout(predicate::str::contains("MavenBuild -->|artifacts| DockerBuild"))
        .stdout(predicate::str::contains("DockerBuild -.->|finish| Deploy"));
}

#[test]
fn test_params_single_key() {
    ciconf()
        .args(["params", "BusinessUnit", "business.docker.registry", "-c"])
        .arg(demo())
        .assert()
        .success()
        .stdout("registry.example.com/tb\n");
}

#[test]
fn test_params_raw_key() {
    ciconf()
        .args(["params", "BusinessUnit", "business.docker.registry", "--raw", "-c"])
        .arg(demo())
        .assert()
        .success()
        .stdout("%docker.registry.url%/%business.unit%\n");
}

#[test]
fn test_params_closest_scope_wins() {
    ciconf()
        .args(["params", "MavenBuild", "maven.goals", "-c"])
        .arg(demo())
        .assert()
        .success()
        .stdout("clean install\n");
}

#[test]
fn test_tree() {
    ciconf()
        .args(["tree", "-c"])
        .arg(demo())
        .assert()
        .success()
        .stdout(predicate::str::contains("BusinessUnitRelease"))
        .stdout(predicate::str::contains("ConfigBackup"));
}

#[test]
fn test_cleanup_override() {
    ciconf()
        .args(["cleanup", "Deploy", "-c"])
        .arg(demo())
        .assert()
        .success()
        .stdout(predicate::str::contains("keep 90 days"))
        .stdout(predicate::str::contains("keep 50 builds"));
}
